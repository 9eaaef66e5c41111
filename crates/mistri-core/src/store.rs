//! The `MarketStore` and `MessageStore` traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g.
//! `mistri-store-sqlite`). The service layer (`engine`) and any transport
//! surface depend on these abstractions, not on a concrete backend.
//!
//! Invariant-bearing writes (submit, decide, close, send) live here rather
//! than in the service layer: each must execute as one atomic unit against
//! the backing store, and only the backend can guarantee that.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Result,
  chat::{Conversation, ConversationId, Message, NewMessage},
  feed::{ConversationFeed, MessageFeed},
  posting::{NewPosting, Posting, PostingKind},
  submission::{ActorSubmission, Decision, NewSubmission, Submission},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`MarketStore::list_open_postings`].
///
/// `limit`/`offset` paginate the `created_at`-descending ordering; every
/// page is a fresh query, so the sequence is restartable.
#[derive(Debug, Clone, Default)]
pub struct PostingQuery {
  /// Substring filter over title, category, and location, applied
  /// store-side with `LIKE` (the backend has no full-text search).
  pub text:   Option<String>,
  /// Restrict to one posting kind.
  pub kind:   Option<PostingKind>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

// ─── MarketStore ─────────────────────────────────────────────────────────────

/// Abstraction over the posting and submission stores.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait MarketStore: Send + Sync {
  // ── Postings ──────────────────────────────────────────────────────────

  /// Persist a new posting with `Open` status, a zero submission count,
  /// and a store-assigned id and timestamp. Input validation is the
  /// caller's job.
  fn add_posting(
    &self,
    input: NewPosting,
  ) -> impl Future<Output = Result<Posting>> + Send + '_;

  /// Retrieve a posting by id. Returns `None` if not found.
  fn get_posting(
    &self,
    posting_id: Uuid,
  ) -> impl Future<Output = Result<Option<Posting>>> + Send + '_;

  /// Open postings, `created_at` descending, filtered per `query`.
  fn list_open_postings<'a>(
    &'a self,
    query: &'a PostingQuery,
  ) -> impl Future<Output = Result<Vec<Posting>>> + Send + 'a;

  /// Transition `Open → Closed`. Only the owner may close; closing an
  /// already-closed posting is a no-op, not an error. Returns the posting
  /// as of after the call.
  fn close_posting(
    &self,
    posting_id: Uuid,
    actor_id: Uuid,
  ) -> impl Future<Output = Result<Posting>> + Send + '_;

  // ── Submissions ───────────────────────────────────────────────────────

  /// Insert a submission and increment the posting's count, atomically.
  ///
  /// In one transaction: the posting must exist (`PostingNotFound`), be
  /// open (`ClosedPosting`), match the payload kind (`Validation`), and
  /// carry no prior submission from this actor (`DuplicateSubmission`).
  /// Two concurrent submits for the same (posting, actor) yield exactly
  /// one success.
  fn submit(
    &self,
    input: NewSubmission,
  ) -> impl Future<Output = Result<Submission>> + Send + '_;

  /// Retrieve a submission by id. Returns `None` if not found.
  fn get_submission(
    &self,
    submission_id: Uuid,
  ) -> impl Future<Output = Result<Option<Submission>>> + Send + '_;

  /// All submissions against a posting, `created_at` ascending. Only the
  /// posting's owner may list them (`Permission`).
  fn list_submissions_for_posting(
    &self,
    posting_id: Uuid,
    requester: Uuid,
  ) -> impl Future<Output = Result<Vec<Submission>>> + Send + '_;

  /// Every submission made by `actor_id`, joined at read time with the
  /// posting's display fields; an unreachable posting degrades to `None`
  /// join fields rather than failing the list.
  fn list_submissions_for_actor(
    &self,
    actor_id: Uuid,
  ) -> impl Future<Output = Result<Vec<ActorSubmission>>> + Send + '_;

  /// Apply the owner's decision to a pending submission. Fails with
  /// `Permission` for non-owners and `InvalidState` once the submission is
  /// terminal. Competing submissions are untouched.
  fn decide(
    &self,
    submission_id: Uuid,
    decision: Decision,
    actor_id: Uuid,
  ) -> impl Future<Output = Result<Submission>> + Send + '_;
}

// ─── MessageStore ────────────────────────────────────────────────────────────

/// Abstraction over the messaging backend.
///
/// Messages are append-only. The conversation summary row is created lazily
/// on first send and updated on every subsequent one, in the same atomic
/// unit as the message insert.
pub trait MessageStore: Send + Sync {
  /// Append a message, upsert the conversation summary, and publish to live
  /// feeds. Text validation and participant checks are the caller's job.
  fn send_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<Message>> + Send + '_;

  /// The summary record for a conversation, `None` before the first
  /// message.
  fn get_conversation<'a>(
    &'a self,
    conversation_id: &'a ConversationId,
  ) -> impl Future<Output = Result<Option<Conversation>>> + Send + 'a;

  /// Full message history, oldest first.
  fn list_messages<'a>(
    &'a self,
    conversation_id: &'a ConversationId,
  ) -> impl Future<Output = Result<Vec<Message>>> + Send + 'a;

  /// Every conversation `user_id` participates in, most recent first.
  fn conversations_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Conversation>>> + Send + '_;

  /// Live feed for one conversation: full history replay in order, then
  /// every subsequent message. Drop the feed to unsubscribe.
  fn subscribe_messages<'a>(
    &'a self,
    conversation_id: &'a ConversationId,
  ) -> impl Future<Output = Result<MessageFeed>> + Send + 'a;

  /// Live feed of summary updates for every conversation `user_id`
  /// participates in, seeded with the current snapshot.
  fn subscribe_conversations(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<ConversationFeed>> + Send + '_;
}
