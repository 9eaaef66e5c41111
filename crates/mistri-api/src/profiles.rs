//! Dev-server stand-in for the external profile platform.
//!
//! The engine only ever reads profiles; in production they come from the
//! identity provider. The dev server keeps them in a [`MemoryProfiles`] and
//! lets test clients register records here.

use std::sync::Arc;

use axum::{
  Json,
  Router,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
  routing::post,
};
use mistri_core::profile::{MemoryProfiles, Profile};

/// Router for `POST /profiles`.
pub fn profiles_router(profiles: Arc<MemoryProfiles>) -> Router<()> {
  Router::new()
    .route("/", post(upsert))
    .with_state(profiles)
}

/// `POST /profiles` — body: [`Profile`]; idempotent upsert.
async fn upsert(
  State(profiles): State<Arc<MemoryProfiles>>,
  Json(body): Json<Profile>,
) -> impl IntoResponse {
  profiles.upsert(body.clone());
  (StatusCode::CREATED, Json(body))
}
