//! The service layer: [`MatchingEngine`] for postings and submissions,
//! [`Messenger`] for chat.
//!
//! Both are thin orchestration over the store traits: input validation,
//! the best-effort profile snapshot, and read-time profile annotation live
//! here, while every invariant-bearing write is delegated to the backend's
//! atomic operations. Actor identifiers are explicit parameters throughout;
//! there is no ambient "current user".

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  Error, Result,
  chat::{Conversation, ConversationId, ConversationView, Message, NewMessage},
  feed::{ConversationFeed, MessageFeed},
  posting::{NewPosting, Posting},
  profile::ProfileStore,
  store::{MarketStore, MessageStore, PostingQuery},
  submission::{ActorSubmission, Decision, NewSubmission, Submission},
};

// ─── MatchingEngine ──────────────────────────────────────────────────────────

/// Orchestrates the posting lifecycle and the submission engine over a
/// [`MarketStore`] backend and a read-only [`ProfileStore`].
pub struct MatchingEngine<S, P> {
  store:    Arc<S>,
  profiles: Arc<P>,
}

impl<S, P> MatchingEngine<S, P>
where
  S: MarketStore,
  P: ProfileStore,
{
  pub fn new(store: Arc<S>, profiles: Arc<P>) -> Self {
    Self { store, profiles }
  }

  // ── Posting lifecycle ─────────────────────────────────────────────────

  /// Validate and persist a new posting.
  pub async fn create_posting(&self, input: NewPosting) -> Result<Posting> {
    input.validate()?;
    let posting = self.store.add_posting(input).await?;
    tracing::info!(
      posting_id = %posting.posting_id,
      kind = ?posting.kind(),
      "posting created"
    );
    Ok(posting)
  }

  pub async fn get_posting(&self, posting_id: Uuid) -> Result<Posting> {
    self
      .store
      .get_posting(posting_id)
      .await?
      .ok_or(Error::PostingNotFound(posting_id))
  }

  /// Open postings, newest first, filtered per `query`.
  pub async fn open_postings(&self, query: &PostingQuery) -> Result<Vec<Posting>> {
    self.store.list_open_postings(query).await
  }

  /// Close a posting. Owner-only; a no-op when already closed.
  pub async fn close_posting(
    &self,
    posting_id: Uuid,
    actor_id: Uuid,
  ) -> Result<Posting> {
    let posting = self.store.close_posting(posting_id, actor_id).await?;
    tracing::info!(posting_id = %posting_id, "posting closed");
    Ok(posting)
  }

  // ── Submission engine ─────────────────────────────────────────────────

  /// Submit an Application or Bid against an open posting.
  ///
  /// The actor's name and photo are snapshotted from the profile store
  /// first; a failed fetch is logged and the submission proceeds without
  /// the snapshot. Availability wins over freshness here.
  pub async fn submit(&self, mut input: NewSubmission) -> Result<Submission> {
    match self.profiles.profile(input.actor_id).await {
      Ok(Some(profile)) => {
        input.actor_name = Some(profile.name);
        input.actor_photo = profile.photo_url;
      }
      Ok(None) => {}
      Err(e) => {
        tracing::debug!(
          actor_id = %input.actor_id,
          error = %e,
          "profile fetch failed; submitting without snapshot"
        );
      }
    }
    self.store.submit(input).await
  }

  /// All submissions against a posting. Owner-only, first come first
  /// listed.
  pub async fn submissions_for_posting(
    &self,
    posting_id: Uuid,
    requester: Uuid,
  ) -> Result<Vec<Submission>> {
    self
      .store
      .list_submissions_for_posting(posting_id, requester)
      .await
  }

  /// Every submission the actor has made, with posting display fields
  /// joined at read time.
  pub async fn submissions_for_actor(
    &self,
    actor_id: Uuid,
  ) -> Result<Vec<ActorSubmission>> {
    self.store.list_submissions_for_actor(actor_id).await
  }

  /// Accept or reject a pending submission. Owner-only; competing
  /// submissions are left untouched.
  pub async fn decide(
    &self,
    submission_id: Uuid,
    decision: Decision,
    actor_id: Uuid,
  ) -> Result<Submission> {
    let submission = self.store.decide(submission_id, decision, actor_id).await?;
    tracing::info!(
      submission_id = %submission_id,
      status = %submission.status,
      "submission decided"
    );
    Ok(submission)
  }
}

// ─── Messenger ───────────────────────────────────────────────────────────────

/// Orchestrates one-to-one messaging over a [`MessageStore`] backend.
pub struct Messenger<S, P> {
  store:    Arc<S>,
  profiles: Arc<P>,
}

impl<S, P> Messenger<S, P>
where
  S: MessageStore,
  P: ProfileStore,
{
  pub fn new(store: Arc<S>, profiles: Arc<P>) -> Self {
    Self { store, profiles }
  }

  /// Append a message to a thread, creating the conversation on first use.
  ///
  /// Fails with `Validation` on empty text and `Permission` when the
  /// sender is not one of the two participants.
  pub async fn send(
    &self,
    conversation_id: &ConversationId,
    sender_id: Uuid,
    text: &str,
  ) -> Result<Message> {
    let text = text.trim();
    if text.is_empty() {
      return Err(Error::Validation("message text must not be empty".into()));
    }
    if conversation_id.peer_of(sender_id).is_none() {
      return Err(Error::denied("sender is not part of this conversation"));
    }
    self
      .store
      .send_message(NewMessage {
        conversation_id: conversation_id.clone(),
        sender_id,
        text: text.to_owned(),
      })
      .await
  }

  /// The summary record for a conversation, `None` before the first
  /// message.
  pub async fn conversation(
    &self,
    conversation_id: &ConversationId,
  ) -> Result<Option<Conversation>> {
    self.store.get_conversation(conversation_id).await
  }

  /// Full history, oldest first.
  pub async fn history(
    &self,
    conversation_id: &ConversationId,
  ) -> Result<Vec<Message>> {
    self.store.list_messages(conversation_id).await
  }

  /// Live feed: full history replay, then every subsequent message.
  pub async fn subscribe(
    &self,
    conversation_id: &ConversationId,
  ) -> Result<MessageFeed> {
    self.store.subscribe_messages(conversation_id).await
  }

  /// The user's conversations, most recent first, each annotated with the
  /// peer's profile fetched at read time. A missing profile yields `None`
  /// for that entry; the list still succeeds.
  pub async fn conversations_for(
    &self,
    user_id: Uuid,
  ) -> Result<Vec<ConversationView>> {
    let conversations = self.store.conversations_for_user(user_id).await?;

    let mut views = Vec::with_capacity(conversations.len());
    for conversation in conversations {
      let peer_id = conversation
        .conversation_id
        .peer_of(user_id)
        .ok_or_else(|| Error::denied("not a participant"))?;
      let peer = self.profiles.profile(peer_id).await.unwrap_or_else(|e| {
        tracing::debug!(peer_id = %peer_id, error = %e, "peer profile fetch failed");
        None
      });
      views.push(ConversationView {
        conversation,
        peer_id,
        peer,
      });
    }
    Ok(views)
  }

  /// Live feed of conversation-summary updates for the user.
  pub async fn subscribe_conversations(
    &self,
    user_id: Uuid,
  ) -> Result<ConversationFeed> {
    self.store.subscribe_conversations(user_id).await
  }
}
