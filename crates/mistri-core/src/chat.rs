//! One-to-one messaging between matched parties.
//!
//! A conversation's identifier is a pure function of its two participants,
//! so finding the thread between two known users needs no lookup table.
//! Messages are append-only; the conversation row is a denormalized summary
//! of the most recent one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, profile::Profile};

// ─── ConversationId ──────────────────────────────────────────────────────────

/// Canonical identifier for the thread between two users.
///
/// Built by sorting the two hyphenated UUID strings and joining them with
/// `_`, so `between(a, b) == between(b, a)` for every pair. The participants
/// are recoverable from the id itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
  /// Derive the id for a pair of users. The pair must be distinct; a
  /// conversation has exactly two participants.
  pub fn between(a: Uuid, b: Uuid) -> Result<Self> {
    if a == b {
      return Err(Error::Validation(
        "a conversation requires two distinct participants".into(),
      ));
    }
    let (lo, hi) = if a.to_string() <= b.to_string() { (a, b) } else { (b, a) };
    Ok(Self(format!("{lo}_{hi}")))
  }

  /// Parse an id previously produced by [`ConversationId::between`].
  pub fn parse(s: &str) -> Result<Self> {
    let (lo, hi) = s
      .split_once('_')
      .ok_or_else(|| Error::Malformed(s.to_string()))?;
    let lo: Uuid = lo.parse()?;
    let hi: Uuid = hi.parse()?;
    Self::between(lo, hi)
  }

  /// The two participants, in canonical order.
  pub fn participants(&self) -> [Uuid; 2] {
    // The constructor guarantees the shape; a malformed id cannot exist.
    let (lo, hi) = self.0.split_once('_').expect("canonical id");
    [
      lo.parse().expect("canonical id"),
      hi.parse().expect("canonical id"),
    ]
  }

  /// The participant that is not `user`, or `None` if `user` is not part of
  /// this conversation.
  pub fn peer_of(&self, user: Uuid) -> Option<Uuid> {
    let [a, b] = self.participants();
    if user == a {
      Some(b)
    } else if user == b {
      Some(a)
    } else {
      None
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl std::fmt::Display for ConversationId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Conversation ────────────────────────────────────────────────────────────

/// The persistent summary record for a thread. Created lazily on the first
/// message and updated on every send; it never holds message history itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
  pub conversation_id: ConversationId,
  /// Both participants, in the id's canonical order.
  pub participants:    [Uuid; 2],
  pub last_message:    String,
  pub last_timestamp:  DateTime<Utc>,
}

/// A conversation annotated with the other participant's profile, fetched at
/// read time rather than denormalized: a renamed peer shows up renamed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationView {
  pub conversation: Conversation,
  pub peer_id:      Uuid,
  /// `None` when the profile store has no record for the peer.
  pub peer:         Option<Profile>,
}

// ─── Message ─────────────────────────────────────────────────────────────────

/// One message in a thread. Append-only; never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
  pub message_id:      Uuid,
  pub conversation_id: ConversationId,
  pub sender_id:       Uuid,
  pub text:            String,
  pub created_at:      DateTime<Utc>,
}

/// Input to the send operation. `message_id` and `created_at` are assigned
/// by the store.
#[derive(Debug, Clone)]
pub struct NewMessage {
  pub conversation_id: ConversationId,
  pub sender_id:       Uuid,
  pub text:            String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn between_is_commutative() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    assert_eq!(
      ConversationId::between(a, b).unwrap(),
      ConversationId::between(b, a).unwrap()
    );
  }

  #[test]
  fn between_rejects_self_conversation() {
    let a = Uuid::new_v4();
    assert!(matches!(
      ConversationId::between(a, a),
      Err(Error::Validation(_))
    ));
  }

  #[test]
  fn participants_round_trip() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let id = ConversationId::between(a, b).unwrap();

    let ps = id.participants();
    assert!(ps.contains(&a) && ps.contains(&b));
    assert_eq!(id.peer_of(a), Some(b));
    assert_eq!(id.peer_of(b), Some(a));
    assert_eq!(id.peer_of(Uuid::new_v4()), None);
  }

  #[test]
  fn parse_accepts_only_canonical_ids() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let id = ConversationId::between(a, b).unwrap();

    let parsed = ConversationId::parse(id.as_str()).unwrap();
    assert_eq!(parsed, id);

    assert!(ConversationId::parse("not-an-id").is_err());
    assert!(ConversationId::parse("a_b").is_err());
  }
}
