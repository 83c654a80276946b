//! Persistence of beatmap sets, modeled as a trait boundary mirroring the
//! teacher's `trait Queries` (SPEC_FULL §6).

pub use row::BeatmapSetRow;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{BeatmapSet, GameMode};

pub mod mock;
pub mod postgres;
mod row;

/// Possible errors reading or writing the `beatmapsets` table.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Either the qualified or ranked row set could not be read; fatal to
    /// the cycle.
    #[error("failed to read a database snapshot")]
    MissingDatabaseSnapshot,

    /// The connection pool or a query itself failed.
    #[error("database request failed")]
    QueryError(#[from] tokio_postgres::Error),

    /// Borrowing a pooled connection failed.
    #[error("database pool error")]
    PoolError(#[from] bb8::RunError<tokio_postgres::Error>),

    /// A row's `beatmaps` JSON column failed to parse.
    #[error("failed to parse a stored beatmapset row")]
    ParseError(#[from] serde_json::Error),
}

/// The persistence operations the cycle orchestrator depends on.
///
/// `postgres::PostgresStore` is the real implementation;
/// `mock::MockStore` is an in-memory fixture used in tests.
#[async_trait]
pub trait RankDateStore: Send + Sync {
    /// Check for pending migrations and execute them.
    async fn migrate(&self) -> Result<(), StoreError>;

    /// All currently qualified sets in one mode (`queue_date IS NOT NULL`),
    /// ordered ascending by `queue_date`.
    async fn qualified(&self, mode: GameMode) -> Result<Vec<BeatmapSet>, StoreError>;

    /// Recently ranked sets in one mode (`queue_date IS NULL`, `rank_date`
    /// within the last `DAY + HOUR`), ordered ascending by `rank_date`, used
    /// as scheduling context.
    async fn recently_ranked(&self, mode: GameMode) -> Result<Vec<BeatmapSet>, StoreError>;

    /// Persist the given sets' scheduling attributes. All-or-nothing: either
    /// every set is written, or none are (SPEC_FULL §7).
    async fn apply(&self, sets: &[BeatmapSet]) -> Result<(), StoreError>;
}
