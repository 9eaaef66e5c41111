//! Error taxonomy for the marketplace engine.
//!
//! Every operation fails with exactly one of these kinds, and the kind is
//! stable: callers (the UI layer) branch on the variant, never on message
//! text. Backends map driver failures to [`Error::Unavailable`] at the
//! boundary, which is the one retryable kind.

use thiserror::Error;
use uuid::Uuid;

use crate::submission::SubmissionStatus;

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed or missing input; recoverable by the caller correcting it.
  #[error("invalid input: {0}")]
  Validation(String),

  #[error("posting not found: {0}")]
  PostingNotFound(Uuid),

  #[error("submission not found: {0}")]
  SubmissionNotFound(Uuid),

  /// The actor lacks authority for the operation. Deliberately carries no
  /// detail about the resource beyond a generic deny.
  #[error("permission denied: {0}")]
  Permission(String),

  /// The posting is closed; no new submission may attach.
  #[error("posting {0} is closed")]
  ClosedPosting(Uuid),

  /// The submission already reached a terminal status and cannot be
  /// re-decided.
  #[error("submission {submission_id} is already {status}")]
  InvalidState {
    submission_id: Uuid,
    status:        SubmissionStatus,
  },

  /// The actor already has a live submission against this posting.
  #[error("actor {actor_id} already submitted against posting {posting_id}")]
  DuplicateSubmission { posting_id: Uuid, actor_id: Uuid },

  /// Backing store unreachable or a transaction aborted. Retryable; the
  /// duplicate-submission check makes retried submits safe.
  #[error("backing store unavailable: {0}")]
  Unavailable(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// An identifier or stored value read back from the store failed to
  /// parse.
  #[error("malformed stored value: {0}")]
  Malformed(String),
}

impl Error {
  /// Wrap a backend/driver failure as the retryable [`Error::Unavailable`].
  pub fn unavailable(source: impl std::fmt::Display) -> Self {
    Self::Unavailable(source.to_string())
  }

  /// Shorthand for a [`Error::Permission`] deny.
  pub fn denied(what: impl Into<String>) -> Self {
    Self::Permission(what.into())
  }
}

impl From<uuid::Error> for Error {
  fn from(e: uuid::Error) -> Self { Self::Malformed(e.to_string()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
