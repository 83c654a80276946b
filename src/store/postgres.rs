//! `bb8`/`tokio-postgres`-backed implementation of [`super::RankDateStore`].

use std::convert::TryFrom;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use include_dir::{include_dir, Dir};
use tokio_postgres::Row;

use crate::constants::{DAY, HOUR};
use crate::model::{BeatmapSet, GameMode};

use super::{BeatmapSetRow, RankDateStore, StoreError};

/// A connection pool that maintains a set of open connections to the
/// database, handing them out for repeated use.
type Pool = bb8::Pool<bb8_postgres::PostgresConnectionManager<tokio_postgres::NoTls>>;

/// Talks to a real Postgres database holding the `rankdate.beatmapsets` table.
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    /// Connect to `conn` (a libpq-style connection string), retrying until
    /// `timeout` elapses.
    pub async fn connect(conn: &str, timeout: Duration) -> Option<PostgresStore> {
        let config = tokio_postgres::config::Config::from_str(conn)
            .expect("failed to parse postgres connection string");

        let manager = bb8_postgres::PostgresConnectionManager::new(config, tokio_postgres::NoTls);
        let pool = bb8::Pool::builder()
            .build(manager)
            .await
            .expect("failed to build database pool");

        match tokio::time::timeout(timeout, pool.get()).await {
            Ok(conn) => {
                conn.expect("failed to connect to database");
                Some(PostgresStore { pool })
            }
            Err(_) => None,
        }
    }
}

fn row_to_set(row: Row) -> Result<BeatmapSet, StoreError> {
    let raw = BeatmapSetRow {
        id: row.get("id"),
        queue_date: row.get("queue_date"),
        rank_date: row.get("rank_date"),
        rank_date_early: row.get("rank_date_early"),
        artist: row.get("artist"),
        title: row.get("title"),
        mapper: row.get("mapper"),
        mapper_id: row.get("mapper_id"),
        mode: row.get("mode"),
        probability: row.get("probability"),
        unresolved: row.get("unresolved"),
        beatmaps: row.get("beatmaps"),
    };
    Ok(BeatmapSet::try_from(raw)?)
}

#[async_trait]
impl RankDateStore for PostgresStore {
    /// Check for pending database migrations and execute them.
    async fn migrate(&self) -> Result<(), StoreError> {
        static MIGRATION_DIR: Dir = include_dir!("src/res/migrations/");

        let stmts = |nb: usize| {
            MIGRATION_DIR
                .get_file(format!("{}.sql", nb))
                .and_then(|f| f.contents_utf8())
                .unwrap_or_else(|| panic!("failed to find statements for migration {}", nb))
        };

        let mut conn = self.pool.get().await?;
        let transaction = conn.transaction().await?;

        // Migration 0 only creates the metadata table if it doesn't exist.
        transaction.batch_execute(stmts(0)).await?;

        let at_migration: i32 = {
            let stmt = "SELECT at_migration FROM rankdate.meta";
            let row = transaction.query_one(stmt, &[]).await?;
            row.get(0)
        };
        log::debug!("database at migration {}", at_migration);

        let most_recent_migration = MIGRATION_DIR.files().len() - 1;
        for i in (at_migration as usize + 1)..=most_recent_migration {
            log::info!("run database migration {}...", i);
            transaction.batch_execute(stmts(i)).await?;
        }

        transaction.commit().await?;
        Ok(())
    }

    async fn qualified(&self, mode: GameMode) -> Result<Vec<BeatmapSet>, StoreError> {
        let conn = self.pool.get().await?;
        let stmt = r#"
            SELECT *
            FROM rankdate.beatmapsets
            WHERE mode = $1 AND queue_date IS NOT NULL
            ORDER BY queue_date ASC
        "#;
        let rows = conn.query(stmt, &[&mode]).await?;
        rows.into_iter().map(row_to_set).collect()
    }

    async fn recently_ranked(&self, mode: GameMode) -> Result<Vec<BeatmapSet>, StoreError> {
        let conn = self.pool.get().await?;
        let cutoff = (Utc::now().timestamp()) - DAY - HOUR;
        let stmt = r#"
            SELECT *
            FROM rankdate.beatmapsets
            WHERE mode = $1 AND queue_date IS NULL AND rank_date > $2
            ORDER BY rank_date ASC
        "#;
        let rows = conn.query(stmt, &[&mode, &cutoff]).await?;
        rows.into_iter().map(row_to_set).collect()
    }

    async fn apply(&self, sets: &[BeatmapSet]) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        let txn = conn.transaction().await?;

        for set in sets {
            let row = BeatmapSetRow::from(set);
            let stmt = r#"
                INSERT INTO rankdate.beatmapsets
                    (id, queue_date, rank_date, rank_date_early,
                     artist, title, mapper, mapper_id, mode, probability, unresolved, beatmaps)
                VALUES
                    ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ON CONFLICT (id)
                DO UPDATE SET
                    queue_date = $2,
                    rank_date = $3,
                    rank_date_early = $4,
                    probability = $10,
                    unresolved = $11,
                    beatmaps = $12
            "#;
            txn.execute(
                stmt,
                &[
                    &row.id,
                    &row.queue_date,
                    &row.rank_date,
                    &row.rank_date_early,
                    &row.artist,
                    &row.title,
                    &row.mapper,
                    &row.mapper_id,
                    &row.mode,
                    &row.probability,
                    &row.unresolved,
                    &row.beatmaps,
                ],
            )
            .await?;
        }

        txn.commit().await?;
        Ok(())
    }
}
