//! In-process fan-out for the live subscription feeds.
//!
//! One broadcast channel per subscribed conversation and per subscribed
//! user, created lazily and pruned once the last receiver goes away.
//! Subscribing and publishing take the same lock, so a subscriber can never
//! be attached to a channel a concurrent publish has already pruned.
//!
//! Publication happens on the connection worker thread, after commit;
//! subscribers therefore observe summaries and messages in commit order.

use std::{
  collections::HashMap,
  sync::Mutex,
};

use mistri_core::{
  chat::{Conversation, ConversationId, Message},
  feed::FEED_CAPACITY,
};
use tokio::sync::broadcast;
use uuid::Uuid;

pub(crate) struct LiveFeeds {
  messages:      Mutex<HashMap<String, broadcast::Sender<Message>>>,
  conversations: Mutex<HashMap<Uuid, broadcast::Sender<Conversation>>>,
}

impl LiveFeeds {
  pub fn new() -> Self {
    Self {
      messages:      Mutex::new(HashMap::new()),
      conversations: Mutex::new(HashMap::new()),
    }
  }

  /// Attach a receiver to the conversation's channel, creating it on first
  /// use.
  pub fn subscribe_messages(
    &self,
    conversation_id: &ConversationId,
  ) -> broadcast::Receiver<Message> {
    let mut map = self.messages.lock().expect("live feed lock");
    map
      .entry(conversation_id.as_str().to_owned())
      .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
      .subscribe()
  }

  /// Attach a receiver to the user's conversation-summary channel.
  pub fn subscribe_conversations(
    &self,
    user_id: Uuid,
  ) -> broadcast::Receiver<Conversation> {
    let mut map = self.conversations.lock().expect("live feed lock");
    map
      .entry(user_id)
      .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
      .subscribe()
  }

  /// Publish a committed message to the conversation's subscribers, if any.
  pub fn publish_message(&self, message: &Message) {
    let mut map = self.messages.lock().expect("live feed lock");
    let key = message.conversation_id.as_str();
    if let Some(tx) = map.get(key) {
      // Err means every receiver is gone; prune the channel.
      if tx.send(message.clone()).is_err() {
        map.remove(key);
      }
    }
  }

  /// Publish an updated conversation summary to both participants'
  /// subscribers.
  pub fn publish_conversation(&self, conversation: &Conversation) {
    let mut map = self.conversations.lock().expect("live feed lock");
    for user in conversation.participants {
      if let Some(tx) = map.get(&user) {
        if tx.send(conversation.clone()).is_err() {
          map.remove(&user);
        }
      }
    }
  }
}
