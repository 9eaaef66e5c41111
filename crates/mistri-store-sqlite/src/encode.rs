//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Structured fields
//! (Compensation, SubmissionDetails) are stored as compact JSON. UUIDs are
//! stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use mistri_core::{
  Error, Result,
  chat::{Conversation, ConversationId, Message},
  posting::{Compensation, Posting, PostingKind, PostingStatus, PostingSummary},
  submission::{
    ActorSubmission, Submission, SubmissionDetails, SubmissionStatus,
  },
};
use uuid::Uuid;

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Malformed(e.to_string()))
}

// ─── PostingKind ─────────────────────────────────────────────────────────────

pub fn encode_posting_kind(k: PostingKind) -> &'static str {
  match k {
    PostingKind::Job => "job",
    PostingKind::Contract => "contract",
  }
}

pub fn decode_posting_kind(s: &str) -> Result<PostingKind> {
  match s {
    "job" => Ok(PostingKind::Job),
    "contract" => Ok(PostingKind::Contract),
    other => Err(Error::Malformed(format!("unknown posting kind: {other:?}"))),
  }
}

// ─── PostingStatus ───────────────────────────────────────────────────────────

pub fn encode_posting_status(s: PostingStatus) -> &'static str {
  match s {
    PostingStatus::Open => "open",
    PostingStatus::Closed => "closed",
  }
}

pub fn decode_posting_status(s: &str) -> Result<PostingStatus> {
  match s {
    "open" => Ok(PostingStatus::Open),
    "closed" => Ok(PostingStatus::Closed),
    other => {
      Err(Error::Malformed(format!("unknown posting status: {other:?}")))
    }
  }
}

// ─── SubmissionStatus ────────────────────────────────────────────────────────

pub fn encode_submission_status(s: SubmissionStatus) -> &'static str {
  match s {
    SubmissionStatus::Pending => "pending",
    SubmissionStatus::Accepted => "accepted",
    SubmissionStatus::Rejected => "rejected",
  }
}

pub fn decode_submission_status(s: &str) -> Result<SubmissionStatus> {
  match s {
    "pending" => Ok(SubmissionStatus::Pending),
    "accepted" => Ok(SubmissionStatus::Accepted),
    "rejected" => Ok(SubmissionStatus::Rejected),
    other => Err(Error::Malformed(format!(
      "unknown submission status: {other:?}"
    ))),
  }
}

// ─── JSON payloads ───────────────────────────────────────────────────────────

pub fn encode_compensation(c: &Compensation) -> Result<String> {
  Ok(serde_json::to_string(c)?)
}

pub fn decode_compensation(s: &str) -> Result<Compensation> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_details(d: &SubmissionDetails) -> Result<String> {
  Ok(serde_json::to_string(d)?)
}

pub fn decode_details(s: &str) -> Result<SubmissionDetails> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `postings` row.
pub struct RawPosting {
  pub posting_id:       String,
  pub owner_id:         String,
  pub title:            String,
  pub category:         String,
  pub location:         String,
  pub description:      String,
  pub compensation:     String,
  pub status:           String,
  pub submission_count: i64,
  pub created_at:       String,
}

impl RawPosting {
  pub fn into_posting(self) -> Result<Posting> {
    Ok(Posting {
      posting_id:       decode_uuid(&self.posting_id)?,
      owner_id:         decode_uuid(&self.owner_id)?,
      title:            self.title,
      category:         self.category,
      location:         self.location,
      description:      self.description,
      compensation:     decode_compensation(&self.compensation)?,
      status:           decode_posting_status(&self.status)?,
      submission_count: u32::try_from(self.submission_count)
        .map_err(|_| Error::Malformed("negative submission count".into()))?,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `submissions` row.
pub struct RawSubmission {
  pub submission_id: String,
  pub posting_id:    String,
  pub actor_id:      String,
  pub actor_name:    Option<String>,
  pub actor_photo:   Option<String>,
  pub details:       String,
  pub status:        String,
  pub created_at:    String,
}

impl RawSubmission {
  pub fn into_submission(self) -> Result<Submission> {
    Ok(Submission {
      submission_id: decode_uuid(&self.submission_id)?,
      posting_id:    decode_uuid(&self.posting_id)?,
      actor_id:      decode_uuid(&self.actor_id)?,
      actor_name:    self.actor_name,
      actor_photo:   self.actor_photo,
      details:       decode_details(&self.details)?,
      status:        decode_submission_status(&self.status)?,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// A `submissions` row left-joined with its posting's display columns.
/// The posting columns are all-or-nothing: NULLs mean the posting row was
/// unreachable.
pub struct RawActorSubmission {
  pub submission:      RawSubmission,
  pub posting_title:   Option<String>,
  pub posting_location: Option<String>,
  pub posting_status:  Option<String>,
}

impl RawActorSubmission {
  pub fn into_actor_submission(self) -> Result<ActorSubmission> {
    let posting = match (self.posting_title, self.posting_status) {
      (Some(title), Some(status)) => Some(PostingSummary {
        title,
        location: self.posting_location.unwrap_or_default(),
        status: decode_posting_status(&status)?,
      }),
      _ => None,
    };
    Ok(ActorSubmission {
      submission: self.submission.into_submission()?,
      posting,
    })
  }
}

/// Raw strings read directly from a `conversations` row.
pub struct RawConversation {
  pub conversation_id: String,
  pub participant_a:   String,
  pub participant_b:   String,
  pub last_message:    String,
  pub last_timestamp:  String,
}

impl RawConversation {
  pub fn into_conversation(self) -> Result<Conversation> {
    Ok(Conversation {
      conversation_id: ConversationId::parse(&self.conversation_id)?,
      participants:    [
        decode_uuid(&self.participant_a)?,
        decode_uuid(&self.participant_b)?,
      ],
      last_message:    self.last_message,
      last_timestamp:  decode_dt(&self.last_timestamp)?,
    })
  }
}

/// Raw strings read directly from a `messages` row.
pub struct RawMessage {
  pub message_id:      String,
  pub conversation_id: String,
  pub sender_id:       String,
  pub text:            String,
  pub created_at:      String,
}

impl RawMessage {
  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      message_id:      decode_uuid(&self.message_id)?,
      conversation_id: ConversationId::parse(&self.conversation_id)?,
      sender_id:       decode_uuid(&self.sender_id)?,
      text:            self.text,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}
