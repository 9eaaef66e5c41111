//! Core types and trait definitions for the mistri marketplace engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// The store traits use native `async fn`/RPITIT with explicit `Send`
// bounds; silence the advisory lint that warns about auto-trait leakage.
#![allow(async_fn_in_trait)]

pub mod chat;
pub mod engine;
pub mod error;
pub mod feed;
pub mod posting;
pub mod profile;
pub mod store;
pub mod submission;

pub use error::{Error, Result};
