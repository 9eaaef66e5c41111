//! Submissions — an Application against a Job or a Bid against a Contract.
//!
//! A submission is written once and then only ever makes the single
//! `Pending → Accepted | Rejected` transition. The submitting actor never
//! mutates it after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::posting::{PostingKind, PostingSummary};

// ─── Details ─────────────────────────────────────────────────────────────────

/// The kind-specific payload. An Application carries nothing beyond the
/// actor's identity; a Bid carries the offered amount and an optional
/// proposal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmissionDetails {
  Application,
  Bid {
    amount:   String,
    proposal: Option<String>,
  },
}

impl SubmissionDetails {
  /// The posting kind this payload may attach to.
  pub fn posting_kind(&self) -> PostingKind {
    match self {
      Self::Application => PostingKind::Job,
      Self::Bid { .. } => PostingKind::Contract,
    }
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
  Pending,
  Accepted,
  Rejected,
}

impl SubmissionStatus {
  /// Accepted and Rejected are terminal; a terminal submission cannot be
  /// re-decided.
  pub fn is_terminal(&self) -> bool { !matches!(self, Self::Pending) }
}

impl std::fmt::Display for SubmissionStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      Self::Pending => "pending",
      Self::Accepted => "accepted",
      Self::Rejected => "rejected",
    };
    f.write_str(s)
  }
}

/// The owner's verdict on a pending submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
  Accept,
  Reject,
}

impl Decision {
  pub fn resulting_status(&self) -> SubmissionStatus {
    match self {
      Self::Accept => SubmissionStatus::Accepted,
      Self::Reject => SubmissionStatus::Rejected,
    }
  }
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// A persisted Application or Bid.
///
/// `actor_name` and `actor_photo` are a denormalized snapshot of the actor's
/// profile taken at submission time, display-only and never re-synced.
/// Treat them as historical record, not live data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
  pub submission_id: Uuid,
  pub posting_id:    Uuid,
  pub actor_id:      Uuid,
  pub actor_name:    Option<String>,
  pub actor_photo:   Option<String>,
  pub details:       SubmissionDetails,
  pub status:        SubmissionStatus,
  pub created_at:    DateTime<Utc>,
}

// ─── NewSubmission ───────────────────────────────────────────────────────────

/// Input to the submit operation. The profile snapshot fields are filled in
/// by the engine (best-effort) before the store is called; `submission_id`,
/// `status`, and `created_at` are store-assigned.
#[derive(Debug, Clone)]
pub struct NewSubmission {
  pub posting_id:  Uuid,
  pub actor_id:    Uuid,
  pub details:     SubmissionDetails,
  pub actor_name:  Option<String>,
  pub actor_photo: Option<String>,
}

impl NewSubmission {
  pub fn new(posting_id: Uuid, actor_id: Uuid, details: SubmissionDetails) -> Self {
    Self {
      posting_id,
      actor_id,
      details,
      actor_name: None,
      actor_photo: None,
    }
  }
}

// ─── Read-time join ──────────────────────────────────────────────────────────

/// A submission joined with its posting's display fields at read time.
///
/// `posting` is `None` when the posting is unreachable; the list as a whole
/// still succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorSubmission {
  pub submission: Submission,
  pub posting:    Option<PostingSummary>,
}
