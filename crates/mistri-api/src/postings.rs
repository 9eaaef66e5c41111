//! Handlers for `/postings` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/postings` | Optional `?text=`, `?kind=job\|contract`, `?limit=`, `?offset=` |
//! | `POST` | `/postings` | Body: [`NewPosting`]; returns 201 |
//! | `GET`  | `/postings/:id` | 404 if not found |
//! | `POST` | `/postings/:id/close` | Body: `{"actor_id":"..."}`; owner-only |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use mistri_core::{
  posting::{NewPosting, Posting, PostingKind},
  profile::ProfileStore,
  store::{MarketStore, MessageStore, PostingQuery},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub text:   Option<String>,
  pub kind:   Option<PostingKind>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /postings[?text=...][&kind=...][&limit=...][&offset=...]`
pub async fn list<S, P>(
  State(state): State<ApiState<S, P>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Posting>>, ApiError>
where
  S: MarketStore + MessageStore,
  P: ProfileStore,
{
  let query = PostingQuery {
    text:   params.text,
    kind:   params.kind,
    limit:  params.limit,
    offset: params.offset,
  };
  Ok(Json(state.engine.open_postings(&query).await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /postings` — body: [`NewPosting`]
pub async fn create<S, P>(
  State(state): State<ApiState<S, P>>,
  Json(body): Json<NewPosting>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketStore + MessageStore,
  P: ProfileStore,
{
  let posting = state.engine.create_posting(body).await?;
  Ok((StatusCode::CREATED, Json(posting)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /postings/:id`
pub async fn get_one<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Posting>, ApiError>
where
  S: MarketStore + MessageStore,
  P: ProfileStore,
{
  Ok(Json(state.engine.get_posting(id).await?))
}

// ─── Close ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CloseBody {
  pub actor_id: Uuid,
}

/// `POST /postings/:id/close` — body: `{"actor_id":"..."}`
pub async fn close<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(id): Path<Uuid>,
  Json(body): Json<CloseBody>,
) -> Result<Json<Posting>, ApiError>
where
  S: MarketStore + MessageStore,
  P: ProfileStore,
{
  Ok(Json(state.engine.close_posting(id, body.actor_id).await?))
}
