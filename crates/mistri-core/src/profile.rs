//! Profiles — read-only view of the external identity platform.
//!
//! The engine never writes profiles; it reads them in two places: the
//! best-effort snapshot taken at submission time, and the per-conversation
//! annotation on the chat list.

use std::{
  collections::HashMap,
  future::Future,
  sync::{Arc, RwLock},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

// ─── Role ────────────────────────────────────────────────────────────────────

/// The marketplace role a user registered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Homeowner,
  Worker,
  Contractor,
  Shop,
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// A per-user profile record, keyed by the stable user identifier the
/// identity provider yields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
  pub user_id:   Uuid,
  pub name:      String,
  pub photo_url: Option<String>,
  pub role:      Role,
}

// ─── ProfileStore ────────────────────────────────────────────────────────────

/// Read-only access to profile records.
pub trait ProfileStore: Send + Sync {
  /// Fetch the profile for `user_id`. Returns `None` when no record exists.
  fn profile(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>>> + Send + '_;
}

// ─── MemoryProfiles ──────────────────────────────────────────────────────────

/// An in-process profile store, for tests and for the dev server where the
/// real identity platform is absent.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfiles {
  inner: Arc<RwLock<HashMap<Uuid, Profile>>>,
}

impl MemoryProfiles {
  pub fn new() -> Self { Self::default() }

  pub fn upsert(&self, profile: Profile) {
    self
      .inner
      .write()
      .expect("profile map lock")
      .insert(profile.user_id, profile);
  }
}

impl ProfileStore for MemoryProfiles {
  async fn profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
    Ok(
      self
        .inner
        .read()
        .expect("profile map lock")
        .get(&user_id)
        .cloned(),
    )
  }
}
