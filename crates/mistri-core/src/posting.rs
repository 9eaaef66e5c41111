//! Postings — the homeowner's side of the marketplace.
//!
//! A posting is either a Job (day labour, paid a daily wage) or a Contract
//! (a scoped piece of work with a budget). Both share one record shape; the
//! kind is derived from the compensation terms so the two can never
//! disagree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Kind & compensation ─────────────────────────────────────────────────────

/// The two concrete posting kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostingKind {
  Job,
  Contract,
}

/// How a contract budget is to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetType {
  Fixed,
  Negotiable,
}

/// Compensation terms. Amounts are opaque text: the engine never does
/// arithmetic on them, it only requires them to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Compensation {
  /// A Job pays a daily wage (e.g. `"800"`).
  DailyWage { wage: String },
  /// A Contract carries a budget and how to read it.
  Budget {
    amount:      String,
    budget_type: BudgetType,
  },
}

impl Compensation {
  pub fn kind(&self) -> PostingKind {
    match self {
      Self::DailyWage { .. } => PostingKind::Job,
      Self::Budget { .. } => PostingKind::Contract,
    }
  }

  fn amount(&self) -> &str {
    match self {
      Self::DailyWage { wage } => wage,
      Self::Budget { amount, .. } => amount,
    }
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle status. The only transition is `Open → Closed`; there is no
/// reopen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostingStatus {
  Open,
  Closed,
}

impl PostingStatus {
  pub fn is_open(&self) -> bool { matches!(self, Self::Open) }
}

// ─── Posting ─────────────────────────────────────────────────────────────────

/// A Job or Contract posting. The id, timestamp, status, and counter are
/// store-assigned; callers never set them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Posting {
  pub posting_id:       Uuid,
  pub owner_id:         Uuid,
  pub title:            String,
  pub category:         String,
  pub location:         String,
  pub description:      String,
  pub compensation:     Compensation,
  pub status:           PostingStatus,
  /// Authoritative count of submissions against this posting. Maintained
  /// inside the submit transaction, never recomputed by scanning.
  pub submission_count: u32,
  pub created_at:       DateTime<Utc>,
}

impl Posting {
  pub fn kind(&self) -> PostingKind { self.compensation.kind() }
}

/// The display fields of a posting joined onto a submission at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingSummary {
  pub title:    String,
  pub location: String,
  pub status:   PostingStatus,
}

// ─── NewPosting ──────────────────────────────────────────────────────────────

/// Input to posting creation. `posting_id` and `created_at` are assigned by
/// the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPosting {
  pub owner_id:     Uuid,
  pub title:        String,
  #[serde(default)]
  pub category:     String,
  #[serde(default)]
  pub location:     String,
  pub description:  String,
  pub compensation: Compensation,
}

impl NewPosting {
  /// Required-field check: title, description, and the compensation amount
  /// must be non-empty after trimming. Category and location are optional
  /// display text.
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::Validation("title must not be empty".into()));
    }
    if self.description.trim().is_empty() {
      return Err(Error::Validation("description must not be empty".into()));
    }
    if self.compensation.amount().trim().is_empty() {
      return Err(Error::Validation(
        "compensation amount must not be empty".into(),
      ));
    }
    Ok(())
  }
}
