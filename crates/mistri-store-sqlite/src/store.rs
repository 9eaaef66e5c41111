//! [`SqliteStore`] — the SQLite implementation of [`MarketStore`] and
//! [`MessageStore`].

use std::{path::Path, sync::Arc};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use mistri_core::{
  Error, Result,
  chat::{Conversation, ConversationId, Message, NewMessage},
  feed::{ConversationFeed, MessageFeed},
  posting::{NewPosting, Posting, PostingStatus},
  store::{MarketStore, MessageStore, PostingQuery},
  submission::{
    ActorSubmission, Decision, NewSubmission, Submission, SubmissionStatus,
  },
};

use crate::{
  encode::{
    RawActorSubmission, RawConversation, RawMessage, RawPosting, RawSubmission,
    decode_submission_status, encode_compensation, encode_details, encode_dt,
    encode_posting_kind, encode_posting_status, encode_submission_status,
    encode_uuid,
  },
  live::LiveFeeds,
  schema::SCHEMA,
};

// ─── Closure outcomes ────────────────────────────────────────────────────────
//
// tokio_rusqlite closures can only carry driver errors out; domain outcomes
// are returned as plain values and mapped to the error taxonomy afterwards.

enum SubmitOutcome {
  Missing,
  Closed,
  KindMismatch,
  Duplicate,
  Created,
}

enum DecideOutcome {
  Missing,
  PostingMissing(String),
  Forbidden,
  NotPending(String),
  Updated(RawSubmission),
}

enum CloseOutcome {
  Missing,
  Forbidden,
  Done(RawPosting),
}

enum OwnedRowsOutcome {
  Missing,
  Forbidden,
  Rows(Vec<RawSubmission>),
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A marketplace store backed by a single SQLite file.
///
/// Clones are cheap handles onto the same reference-counted connection and
/// the same set of live feeds.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
  live: Arc<LiveFeeds>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(Error::unavailable)?;
    let store = Self { conn, live: Arc::new(LiveFeeds::new()) };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a fresh in-memory store, used by the test suite.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(Error::unavailable)?;
    let store = Self { conn, live: Arc::new(LiveFeeds::new()) };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(Error::unavailable)
  }
}

fn submission_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSubmission> {
  Ok(RawSubmission {
    submission_id: row.get(0)?,
    posting_id:    row.get(1)?,
    actor_id:      row.get(2)?,
    actor_name:    row.get(3)?,
    actor_photo:   row.get(4)?,
    details:       row.get(5)?,
    status:        row.get(6)?,
    created_at:    row.get(7)?,
  })
}

fn posting_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPosting> {
  Ok(RawPosting {
    posting_id:       row.get(0)?,
    owner_id:         row.get(1)?,
    title:            row.get(2)?,
    category:         row.get(3)?,
    location:         row.get(4)?,
    description:      row.get(5)?,
    compensation:     row.get(6)?,
    status:           row.get(7)?,
    submission_count: row.get(8)?,
    created_at:       row.get(9)?,
  })
}

const POSTING_COLUMNS: &str = "posting_id, owner_id, title, category, location, \
   description, compensation, status, submission_count, created_at";

const SUBMISSION_COLUMNS: &str = "submission_id, posting_id, actor_id, \
   actor_name, actor_photo, details, status, created_at";

// ─── MarketStore impl ────────────────────────────────────────────────────────

impl MarketStore for SqliteStore {
  // ── Postings ──────────────────────────────────────────────────────────────

  async fn add_posting(&self, input: NewPosting) -> Result<Posting> {
    let posting = Posting {
      posting_id:       Uuid::new_v4(),
      owner_id:         input.owner_id,
      title:            input.title,
      category:         input.category,
      location:         input.location,
      description:      input.description,
      compensation:     input.compensation,
      status:           PostingStatus::Open,
      submission_count: 0,
      created_at:       Utc::now(),
    };

    let id_str           = encode_uuid(posting.posting_id);
    let owner_str        = encode_uuid(posting.owner_id);
    let title            = posting.title.clone();
    let category         = posting.category.clone();
    let location         = posting.location.clone();
    let description      = posting.description.clone();
    let kind_str         = encode_posting_kind(posting.kind()).to_owned();
    let compensation_str = encode_compensation(&posting.compensation)?;
    let status_str       = encode_posting_status(posting.status).to_owned();
    let at_str           = encode_dt(posting.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO postings (
             posting_id, owner_id, title, category, location, description,
             kind, compensation, status, submission_count, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10)",
          rusqlite::params![
            id_str,
            owner_str,
            title,
            category,
            location,
            description,
            kind_str,
            compensation_str,
            status_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::unavailable)?;

    Ok(posting)
  }

  async fn get_posting(&self, posting_id: Uuid) -> Result<Option<Posting>> {
    let id_str = encode_uuid(posting_id);

    let raw: Option<RawPosting> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {POSTING_COLUMNS} FROM postings WHERE posting_id = ?1"
              ),
              rusqlite::params![id_str],
              posting_from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::unavailable)?;

    raw.map(RawPosting::into_posting).transpose()
  }

  async fn list_open_postings(&self, query: &PostingQuery) -> Result<Vec<Posting>> {
    let text_pattern = query.text.as_deref().map(|t| format!("%{t}%"));
    let kind_str     = query.kind.map(encode_posting_kind).map(str::to_owned);
    let limit_val    = query.limit.unwrap_or(100) as i64;
    let offset_val   = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawPosting> = self
      .conn
      .call(move |conn| {
        let mut conds = vec!["status = 'open'".to_owned()];
        if text_pattern.is_some() {
          conds.push(
            "(title LIKE ?1 OR category LIKE ?1 OR location LIKE ?1)".to_owned(),
          );
        }
        if kind_str.is_some() {
          conds.push("kind = ?2".to_owned());
        }

        let sql = format!(
          "SELECT {POSTING_COLUMNS}
           FROM postings
           WHERE {}
           ORDER BY created_at DESC
           LIMIT ?3 OFFSET ?4",
          conds.join(" AND ")
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              text_pattern.as_deref(),
              kind_str.as_deref(),
              limit_val,
              offset_val,
            ],
            posting_from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await
      .map_err(Error::unavailable)?;

    raws.into_iter().map(RawPosting::into_posting).collect()
  }

  async fn close_posting(&self, posting_id: Uuid, actor_id: Uuid) -> Result<Posting> {
    let id_str    = encode_uuid(posting_id);
    let actor_str = encode_uuid(actor_id);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let raw: Option<RawPosting> = tx
          .query_row(
            &format!(
              "SELECT {POSTING_COLUMNS} FROM postings WHERE posting_id = ?1"
            ),
            rusqlite::params![id_str],
            posting_from_row,
          )
          .optional()?;

        let Some(mut raw) = raw else {
          return Ok(CloseOutcome::Missing);
        };
        if raw.owner_id != actor_str {
          return Ok(CloseOutcome::Forbidden);
        }

        // Already closed: deliberate no-op so retries are safe.
        if raw.status != "closed" {
          tx.execute(
            "UPDATE postings SET status = 'closed' WHERE posting_id = ?1",
            rusqlite::params![id_str],
          )?;
          raw.status = "closed".to_owned();
        }

        tx.commit()?;
        Ok(CloseOutcome::Done(raw))
      })
      .await
      .map_err(Error::unavailable)?;

    match outcome {
      CloseOutcome::Missing => Err(Error::PostingNotFound(posting_id)),
      CloseOutcome::Forbidden => {
        Err(Error::denied("only the posting owner may close it"))
      }
      CloseOutcome::Done(raw) => raw.into_posting(),
    }
  }

  // ── Submissions ───────────────────────────────────────────────────────────

  async fn submit(&self, input: NewSubmission) -> Result<Submission> {
    let submission = Submission {
      submission_id: Uuid::new_v4(),
      posting_id:    input.posting_id,
      actor_id:      input.actor_id,
      actor_name:    input.actor_name,
      actor_photo:   input.actor_photo,
      details:       input.details,
      status:        SubmissionStatus::Pending,
      created_at:    Utc::now(),
    };

    let id_str       = encode_uuid(submission.submission_id);
    let posting_str  = encode_uuid(submission.posting_id);
    let actor_str    = encode_uuid(submission.actor_id);
    let actor_name   = submission.actor_name.clone();
    let actor_photo  = submission.actor_photo.clone();
    let details_str  = encode_details(&submission.details)?;
    let status_str   = encode_submission_status(submission.status).to_owned();
    let at_str       = encode_dt(submission.created_at);
    let details_kind = encode_posting_kind(submission.details.posting_kind()).to_owned();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let posting: Option<(String, String)> = tx
          .query_row(
            "SELECT status, kind FROM postings WHERE posting_id = ?1",
            rusqlite::params![posting_str],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?;

        let Some((status, kind)) = posting else {
          return Ok(SubmitOutcome::Missing);
        };
        if status != "open" {
          return Ok(SubmitOutcome::Closed);
        }
        if kind != details_kind {
          return Ok(SubmitOutcome::KindMismatch);
        }

        let duplicate: bool = tx
          .query_row(
            "SELECT 1 FROM submissions WHERE posting_id = ?1 AND actor_id = ?2",
            rusqlite::params![posting_str, actor_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if duplicate {
          return Ok(SubmitOutcome::Duplicate);
        }

        tx.execute(
          "INSERT INTO submissions (
             submission_id, posting_id, actor_id, actor_name, actor_photo,
             details, status, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            posting_str,
            actor_str,
            actor_name,
            actor_photo,
            details_str,
            status_str,
            at_str,
          ],
        )?;
        tx.execute(
          "UPDATE postings SET submission_count = submission_count + 1
           WHERE posting_id = ?1",
          rusqlite::params![posting_str],
        )?;

        tx.commit()?;
        Ok(SubmitOutcome::Created)
      })
      .await
      .map_err(Error::unavailable)?;

    match outcome {
      SubmitOutcome::Missing => Err(Error::PostingNotFound(submission.posting_id)),
      SubmitOutcome::Closed => Err(Error::ClosedPosting(submission.posting_id)),
      SubmitOutcome::KindMismatch => Err(Error::Validation(
        "submission payload does not match the posting kind".into(),
      )),
      SubmitOutcome::Duplicate => Err(Error::DuplicateSubmission {
        posting_id: submission.posting_id,
        actor_id:   submission.actor_id,
      }),
      SubmitOutcome::Created => Ok(submission),
    }
  }

  async fn get_submission(&self, submission_id: Uuid) -> Result<Option<Submission>> {
    let id_str = encode_uuid(submission_id);

    let raw: Option<RawSubmission> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SUBMISSION_COLUMNS} FROM submissions
                 WHERE submission_id = ?1"
              ),
              rusqlite::params![id_str],
              submission_from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::unavailable)?;

    raw.map(RawSubmission::into_submission).transpose()
  }

  async fn list_submissions_for_posting(
    &self,
    posting_id: Uuid,
    requester: Uuid,
  ) -> Result<Vec<Submission>> {
    let posting_str   = encode_uuid(posting_id);
    let requester_str = encode_uuid(requester);

    let outcome = self
      .conn
      .call(move |conn| {
        let owner: Option<String> = conn
          .query_row(
            "SELECT owner_id FROM postings WHERE posting_id = ?1",
            rusqlite::params![posting_str],
            |row| row.get(0),
          )
          .optional()?;

        let Some(owner) = owner else {
          return Ok(OwnedRowsOutcome::Missing);
        };
        if owner != requester_str {
          return Ok(OwnedRowsOutcome::Forbidden);
        }

        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBMISSION_COLUMNS} FROM submissions
           WHERE posting_id = ?1
           ORDER BY created_at ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![posting_str], submission_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(OwnedRowsOutcome::Rows(rows))
      })
      .await
      .map_err(Error::unavailable)?;

    match outcome {
      OwnedRowsOutcome::Missing => Err(Error::PostingNotFound(posting_id)),
      OwnedRowsOutcome::Forbidden => {
        Err(Error::denied("only the posting owner may list submissions"))
      }
      OwnedRowsOutcome::Rows(raws) => raws
        .into_iter()
        .map(RawSubmission::into_submission)
        .collect(),
    }
  }

  async fn list_submissions_for_actor(
    &self,
    actor_id: Uuid,
  ) -> Result<Vec<ActorSubmission>> {
    let actor_str = encode_uuid(actor_id);

    let raws: Vec<RawActorSubmission> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             s.submission_id, s.posting_id, s.actor_id, s.actor_name,
             s.actor_photo, s.details, s.status, s.created_at,
             p.title, p.location, p.status
           FROM submissions s
           LEFT JOIN postings p ON p.posting_id = s.posting_id
           WHERE s.actor_id = ?1
           ORDER BY s.created_at ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![actor_str], |row| {
            Ok(RawActorSubmission {
              submission:       submission_from_row(row)?,
              posting_title:    row.get(8)?,
              posting_location: row.get(9)?,
              posting_status:   row.get(10)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await
      .map_err(Error::unavailable)?;

    raws
      .into_iter()
      .map(RawActorSubmission::into_actor_submission)
      .collect()
  }

  async fn decide(
    &self,
    submission_id: Uuid,
    decision: Decision,
    actor_id: Uuid,
  ) -> Result<Submission> {
    let id_str     = encode_uuid(submission_id);
    let actor_str  = encode_uuid(actor_id);
    let status_str = encode_submission_status(decision.resulting_status()).to_owned();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let row: Option<(RawSubmission, Option<String>)> = tx
          .query_row(
            "SELECT
               s.submission_id, s.posting_id, s.actor_id, s.actor_name,
               s.actor_photo, s.details, s.status, s.created_at,
               p.owner_id
             FROM submissions s
             LEFT JOIN postings p ON p.posting_id = s.posting_id
             WHERE s.submission_id = ?1",
            rusqlite::params![id_str],
            |row| Ok((submission_from_row(row)?, row.get(8)?)),
          )
          .optional()?;

        let Some((mut raw, owner)) = row else {
          return Ok(DecideOutcome::Missing);
        };
        let Some(owner) = owner else {
          return Ok(DecideOutcome::PostingMissing(raw.posting_id));
        };
        if owner != actor_str {
          return Ok(DecideOutcome::Forbidden);
        }
        if raw.status != "pending" {
          return Ok(DecideOutcome::NotPending(raw.status));
        }

        // Guarded single transition; the status predicate is the CAS.
        let updated = tx.execute(
          "UPDATE submissions SET status = ?1
           WHERE submission_id = ?2 AND status = 'pending'",
          rusqlite::params![status_str, id_str],
        )?;
        if updated == 0 {
          return Ok(DecideOutcome::NotPending(raw.status));
        }
        raw.status = status_str;

        tx.commit()?;
        Ok(DecideOutcome::Updated(raw))
      })
      .await
      .map_err(Error::unavailable)?;

    match outcome {
      DecideOutcome::Missing => Err(Error::SubmissionNotFound(submission_id)),
      DecideOutcome::PostingMissing(posting) => {
        Err(Error::Malformed(format!("submission references missing posting {posting}")))
      }
      DecideOutcome::Forbidden => {
        Err(Error::denied("only the posting owner may decide a submission"))
      }
      DecideOutcome::NotPending(status) => Err(Error::InvalidState {
        submission_id,
        status: decode_submission_status(&status)?,
      }),
      DecideOutcome::Updated(raw) => raw.into_submission(),
    }
  }
}

// ─── MessageStore impl ───────────────────────────────────────────────────────

impl MessageStore for SqliteStore {
  async fn send_message(&self, input: NewMessage) -> Result<Message> {
    let [a, b] = input.conversation_id.participants();

    let message_id       = Uuid::new_v4();
    let id_str           = encode_uuid(message_id);
    let conversation_str = input.conversation_id.as_str().to_owned();
    let a_str            = encode_uuid(a);
    let b_str            = encode_uuid(b);
    let sender_str       = encode_uuid(input.sender_id);
    let conversation_id  = input.conversation_id;
    let sender_id        = input.sender_id;
    let text             = input.text;
    let live             = Arc::clone(&self.live);

    self
      .conn
      .call(move |conn| {
        // The timestamp is assigned here, on the connection worker, so
        // commit order and created_at order agree.
        let created_at = Utc::now();
        let at_str = encode_dt(created_at);

        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO conversations (
             conversation_id, participant_a, participant_b,
             last_message, last_timestamp
           ) VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (conversation_id) DO UPDATE SET
             last_message   = excluded.last_message,
             last_timestamp = excluded.last_timestamp",
          rusqlite::params![conversation_str, a_str, b_str, text, at_str],
        )?;
        tx.execute(
          "INSERT INTO messages (
             message_id, conversation_id, sender_id, text, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, conversation_str, sender_str, text, at_str],
        )?;
        tx.commit()?;

        let message = Message {
          message_id,
          conversation_id: conversation_id.clone(),
          sender_id,
          text,
          created_at,
        };
        let conversation = Conversation {
          conversation_id,
          participants: [a, b],
          last_message: message.text.clone(),
          last_timestamp: created_at,
        };

        // Publish after commit, still on the worker, so subscribers see
        // commit order.
        live.publish_message(&message);
        live.publish_conversation(&conversation);

        Ok(message)
      })
      .await
      .map_err(Error::unavailable)
  }

  async fn get_conversation(
    &self,
    conversation_id: &ConversationId,
  ) -> Result<Option<Conversation>> {
    let id_str = conversation_id.as_str().to_owned();

    let raw: Option<RawConversation> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT conversation_id, participant_a, participant_b,
                      last_message, last_timestamp
               FROM conversations WHERE conversation_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawConversation {
                  conversation_id: row.get(0)?,
                  participant_a:   row.get(1)?,
                  participant_b:   row.get(2)?,
                  last_message:    row.get(3)?,
                  last_timestamp:  row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::unavailable)?;

    raw.map(RawConversation::into_conversation).transpose()
  }

  async fn list_messages(
    &self,
    conversation_id: &ConversationId,
  ) -> Result<Vec<Message>> {
    let id_str = conversation_id.as_str().to_owned();

    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT message_id, conversation_id, sender_id, text, created_at
           FROM messages
           WHERE conversation_id = ?1
           ORDER BY seq ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawMessage {
              message_id:      row.get(0)?,
              conversation_id: row.get(1)?,
              sender_id:       row.get(2)?,
              text:            row.get(3)?,
              created_at:      row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await
      .map_err(Error::unavailable)?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }

  async fn conversations_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawConversation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT conversation_id, participant_a, participant_b,
                  last_message, last_timestamp
           FROM conversations
           WHERE participant_a = ?1 OR participant_b = ?1
           ORDER BY last_timestamp DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| {
            Ok(RawConversation {
              conversation_id: row.get(0)?,
              participant_a:   row.get(1)?,
              participant_b:   row.get(2)?,
              last_message:    row.get(3)?,
              last_timestamp:  row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await
      .map_err(Error::unavailable)?;

    raws
      .into_iter()
      .map(RawConversation::into_conversation)
      .collect()
  }

  async fn subscribe_messages(
    &self,
    conversation_id: &ConversationId,
  ) -> Result<MessageFeed> {
    // Attach the receiver before reading history: anything committed after
    // this point arrives on the channel, anything before is in the replay,
    // and the feed drops the overlap by id.
    let rx = self.live.subscribe_messages(conversation_id);
    let history = self.list_messages(conversation_id).await?;
    Ok(MessageFeed::new(history, rx))
  }

  async fn subscribe_conversations(&self, user_id: Uuid) -> Result<ConversationFeed> {
    let rx = self.live.subscribe_conversations(user_id);
    let snapshot = self.conversations_for_user(user_id).await?;
    Ok(ConversationFeed::new(snapshot, rx))
  }
}
