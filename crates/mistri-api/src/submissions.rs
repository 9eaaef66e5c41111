//! Handlers for submission endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/postings/:id/submissions` | Body: [`SubmitBody`]; returns 201 |
//! | `GET`  | `/postings/:id/submissions` | `?requester=` required; owner-only |
//! | `GET`  | `/actors/:id/submissions` | With posting fields joined at read time |
//! | `POST` | `/submissions/:id/decide` | Body: [`DecideBody`]; owner-only |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use mistri_core::{
  profile::ProfileStore,
  store::{MarketStore, MessageStore},
  submission::{
    ActorSubmission, Decision, NewSubmission, Submission, SubmissionDetails,
  },
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── Submit ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /postings/:id/submissions`.
#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  pub actor_id: Uuid,
  pub details:  SubmissionDetails,
}

/// `POST /postings/:id/submissions`
pub async fn submit<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(posting_id): Path<Uuid>,
  Json(body): Json<SubmitBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketStore + MessageStore,
  P: ProfileStore,
{
  let submission = state
    .engine
    .submit(NewSubmission::new(posting_id, body.actor_id, body.details))
    .await?;
  Ok((StatusCode::CREATED, Json(submission)))
}

// ─── List for posting ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// The actor asking; must be the posting's owner.
  pub requester: Uuid,
}

/// `GET /postings/:id/submissions?requester=<id>`
pub async fn list_for_posting<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(posting_id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Submission>>, ApiError>
where
  S: MarketStore + MessageStore,
  P: ProfileStore,
{
  Ok(Json(
    state
      .engine
      .submissions_for_posting(posting_id, params.requester)
      .await?,
  ))
}

// ─── List for actor ──────────────────────────────────────────────────────────

/// `GET /actors/:id/submissions`
pub async fn list_for_actor<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(actor_id): Path<Uuid>,
) -> Result<Json<Vec<ActorSubmission>>, ApiError>
where
  S: MarketStore + MessageStore,
  P: ProfileStore,
{
  Ok(Json(state.engine.submissions_for_actor(actor_id).await?))
}

// ─── Decide ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /submissions/:id/decide`.
#[derive(Debug, Deserialize)]
pub struct DecideBody {
  pub actor_id: Uuid,
  pub decision: Decision,
}

/// `POST /submissions/:id/decide`
pub async fn decide<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(submission_id): Path<Uuid>,
  Json(body): Json<DecideBody>,
) -> Result<Json<Submission>, ApiError>
where
  S: MarketStore + MessageStore,
  P: ProfileStore,
{
  Ok(Json(
    state
      .engine
      .decide(submission_id, body.decision, body.actor_id)
      .await?,
  ))
}
