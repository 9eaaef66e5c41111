//! JSON REST API for the mistri marketplace engine.
//!
//! Exposes an axum [`Router`] backed by any [`MarketStore`] +
//! [`MessageStore`] backend. Auth, TLS, and transport concerns are the
//! caller's responsibility; the engine itself stays invokable in-process.
//!
//! The live subscription feeds are an in-process interface and are not
//! exposed over HTTP; clients poll the list endpoints instead.

pub mod chat;
pub mod error;
pub mod postings;
pub mod profiles;
pub mod submissions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use mistri_core::{
  engine::{MatchingEngine, Messenger},
  profile::ProfileStore,
  store::{MarketStore, MessageStore},
};

pub use error::ApiError;

/// Shared handler state: the two service layers over one backend.
pub struct ApiState<S, P> {
  pub engine:    Arc<MatchingEngine<S, P>>,
  pub messenger: Arc<Messenger<S, P>>,
}

impl<S, P> Clone for ApiState<S, P> {
  fn clone(&self) -> Self {
    Self {
      engine:    Arc::clone(&self.engine),
      messenger: Arc::clone(&self.messenger),
    }
  }
}

/// Build a fully-materialised API router over `engine` and `messenger`.
///
/// The returned `Router<()>` can be nested into any parent router
/// regardless of its own state type.
pub fn api_router<S, P>(
  engine: Arc<MatchingEngine<S, P>>,
  messenger: Arc<Messenger<S, P>>,
) -> Router<()>
where
  S: MarketStore + MessageStore + Send + Sync + 'static,
  P: ProfileStore + Send + Sync + 'static,
{
  let state = ApiState { engine, messenger };
  Router::new()
    // Postings
    .route(
      "/postings",
      get(postings::list::<S, P>).post(postings::create::<S, P>),
    )
    .route("/postings/{id}", get(postings::get_one::<S, P>))
    .route("/postings/{id}/close", post(postings::close::<S, P>))
    // Submissions
    .route(
      "/postings/{id}/submissions",
      get(submissions::list_for_posting::<S, P>)
        .post(submissions::submit::<S, P>),
    )
    .route(
      "/actors/{id}/submissions",
      get(submissions::list_for_actor::<S, P>),
    )
    .route(
      "/submissions/{id}/decide",
      post(submissions::decide::<S, P>),
    )
    // Messaging
    .route("/conversations/{a}/{b}", get(chat::summary::<S, P>))
    .route(
      "/conversations/{id}/messages",
      get(chat::history::<S, P>).post(chat::send::<S, P>),
    )
    .route(
      "/users/{id}/conversations",
      get(chat::conversations_for_user::<S, P>),
    )
    .with_state(state)
}
