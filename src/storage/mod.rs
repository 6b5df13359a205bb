//! Durable store for already-seen measures.
//!
//! The store is the single source of truth for "has this measure already
//! been announced" — shared by every cycle and across process restarts.
//! Rows are created once, never updated, never deleted.

pub mod sqlite;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Measure;

// Re-export for convenience
pub use sqlite::SqliteStore;

/// Outcome of an insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The measure was recorded for the first time
    Inserted,
    /// A row with this URL already exists
    AlreadyExists,
}

/// Trait for measure store backends.
#[async_trait]
pub trait MeasureStore: Send + Sync {
    /// Check whether a measure with this URL is already recorded.
    async fn exists(&self, url: &str) -> Result<bool>;

    /// Record a measure unless its URL is already present.
    ///
    /// Atomic with respect to the URL uniqueness constraint: of any number
    /// of concurrent calls with the same URL, exactly one observes
    /// [`InsertOutcome::Inserted`]; the rest observe
    /// [`InsertOutcome::AlreadyExists`].
    async fn insert_if_absent(&self, measure: &Measure) -> Result<InsertOutcome>;

    /// Number of recorded measures.
    async fn count(&self) -> Result<u64>;
}
