//! SQLite backend for the mistri marketplace engine.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! worker thread without blocking the async runtime. Because every call is
//! serialized onto that thread, the submit transaction's
//! check-then-insert-then-increment executes as one atomic unit, and live
//! feeds are published in commit order.

mod encode;
mod live;
mod schema;
mod store;

pub use store::SqliteStore;

#[cfg(test)]
mod tests;
