//! Live-feed types returned by the subscription operations.
//!
//! A feed is a pull-based wrapper over a replayed backlog plus a broadcast
//! receiver: the subscriber drains history first, then live items, in one
//! non-decreasing order. Dropping the feed unsubscribes synchronously; no
//! further items are buffered for it.
//!
//! A subscriber that falls more than the channel capacity behind skips
//! ahead to the oldest retained item instead of blocking senders; ordering
//! is preserved, completeness for laggards is not.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::chat::{Conversation, Message};

/// Per-feed broadcast buffer size. A laggard beyond this skips ahead.
pub const FEED_CAPACITY: usize = 256;

// ─── MessageFeed ─────────────────────────────────────────────────────────────

/// Ordered feed of one conversation's messages: full history, then live.
///
/// A message committed while the subscription was being set up can appear
/// in both the replayed history and the live channel; the feed drops the
/// second copy by id.
pub struct MessageFeed {
  backlog:  VecDeque<Message>,
  replayed: HashSet<Uuid>,
  live:     broadcast::Receiver<Message>,
}

impl MessageFeed {
  pub fn new(history: Vec<Message>, live: broadcast::Receiver<Message>) -> Self {
    let replayed = history.iter().map(|m| m.message_id).collect();
    Self {
      backlog: history.into(),
      replayed,
      live,
    }
  }

  /// The next message, or `None` once the feed is closed (the store was
  /// dropped).
  pub async fn next(&mut self) -> Option<Message> {
    if let Some(m) = self.backlog.pop_front() {
      return Some(m);
    }
    loop {
      match self.live.recv().await {
        Ok(m) if self.replayed.contains(&m.message_id) => continue,
        Ok(m) => return Some(m),
        Err(broadcast::error::RecvError::Lagged(_)) => continue,
        Err(broadcast::error::RecvError::Closed) => return None,
      }
    }
  }
}

// ─── ConversationFeed ────────────────────────────────────────────────────────

/// Feed of conversation-summary updates for one user: current snapshot,
/// then every subsequent update. Unlike messages, the same conversation is
/// delivered again whenever its summary changes, so deduplication keys on
/// (id, last_timestamp): only the exact states already replayed are
/// suppressed.
pub struct ConversationFeed {
  backlog:  VecDeque<Conversation>,
  replayed: HashSet<(String, DateTime<Utc>)>,
  live:     broadcast::Receiver<Conversation>,
}

impl ConversationFeed {
  pub fn new(
    snapshot: Vec<Conversation>,
    live: broadcast::Receiver<Conversation>,
  ) -> Self {
    let replayed = snapshot
      .iter()
      .map(|c| (c.conversation_id.as_str().to_owned(), c.last_timestamp))
      .collect();
    Self {
      backlog: snapshot.into(),
      replayed,
      live,
    }
  }

  /// The next summary update, or `None` once the feed is closed.
  pub async fn next(&mut self) -> Option<Conversation> {
    if let Some(c) = self.backlog.pop_front() {
      return Some(c);
    }
    loop {
      match self.live.recv().await {
        Ok(c)
          if self.replayed.contains(&(
            c.conversation_id.as_str().to_owned(),
            c.last_timestamp,
          )) =>
        {
          continue;
        }
        Ok(c) => return Some(c),
        Err(broadcast::error::RecvError::Lagged(_)) => continue,
        Err(broadcast::error::RecvError::Closed) => return None,
      }
    }
  }
}
