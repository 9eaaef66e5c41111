//! Handlers for messaging endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/conversations/:a/:b` | Derive the canonical id + current summary |
//! | `POST` | `/conversations/:id/messages` | Body: [`SendBody`]; returns 201 |
//! | `GET`  | `/conversations/:id/messages` | Full history, oldest first |
//! | `GET`  | `/users/:id/conversations` | Peer profile annotated at read time |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use mistri_core::{
  chat::{Conversation, ConversationId, ConversationView, Message},
  profile::ProfileStore,
  store::{MarketStore, MessageStore},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
  pub conversation_id: ConversationId,
  /// `None` until the first message is sent.
  pub conversation:    Option<Conversation>,
}

/// `GET /conversations/:a/:b` — the id is the same whichever order the two
/// users appear in the path.
pub async fn summary<S, P>(
  State(state): State<ApiState<S, P>>,
  Path((a, b)): Path<(Uuid, Uuid)>,
) -> Result<Json<SummaryResponse>, ApiError>
where
  S: MarketStore + MessageStore,
  P: ProfileStore,
{
  let conversation_id = ConversationId::between(a, b)?;
  let conversation = state.messenger.conversation(&conversation_id).await?;
  Ok(Json(SummaryResponse { conversation_id, conversation }))
}

// ─── Send ────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /conversations/:id/messages`.
#[derive(Debug, Deserialize)]
pub struct SendBody {
  pub sender_id: Uuid,
  pub text:      String,
}

/// `POST /conversations/:id/messages`
pub async fn send<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(id): Path<String>,
  Json(body): Json<SendBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketStore + MessageStore,
  P: ProfileStore,
{
  let conversation_id = ConversationId::parse(&id)?;
  let message = state
    .messenger
    .send(&conversation_id, body.sender_id, &body.text)
    .await?;
  Ok((StatusCode::CREATED, Json(message)))
}

// ─── History ─────────────────────────────────────────────────────────────────

/// `GET /conversations/:id/messages`
pub async fn history<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError>
where
  S: MarketStore + MessageStore,
  P: ProfileStore,
{
  let conversation_id = ConversationId::parse(&id)?;
  Ok(Json(state.messenger.history(&conversation_id).await?))
}

// ─── Conversations for user ──────────────────────────────────────────────────

/// `GET /users/:id/conversations`
pub async fn conversations_for_user<S, P>(
  State(state): State<ApiState<S, P>>,
  Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<ConversationView>>, ApiError>
where
  S: MarketStore + MessageStore,
  P: ProfileStore,
{
  Ok(Json(state.messenger.conversations_for(user_id).await?))
}
