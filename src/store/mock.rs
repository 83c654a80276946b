//! In-memory fixture implementation of [`super::RankDateStore`], used in
//! unit tests instead of the real `store::postgres` backend.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::model::{BeatmapSet, GameMode};

use super::{RankDateStore, StoreError};

/// A scripted store: callers populate `qualified`/`recently_ranked` up
/// front, then exercise code against it exactly as they would against
/// `postgres::PostgresStore`. `applied` records every call to `apply`, so
/// tests can assert on the write-set a cycle produced.
#[derive(Default)]
pub struct MockStore {
    pub qualified: HashMap<GameMode, Vec<BeatmapSet>>,
    pub recently_ranked: HashMap<GameMode, Vec<BeatmapSet>>,
    pub applied: Mutex<Vec<BeatmapSet>>,
}

#[async_trait]
impl RankDateStore for MockStore {
    async fn migrate(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn qualified(&self, mode: GameMode) -> Result<Vec<BeatmapSet>, StoreError> {
        Ok(self.qualified.get(&mode).cloned().unwrap_or_default())
    }

    async fn recently_ranked(&self, mode: GameMode) -> Result<Vec<BeatmapSet>, StoreError> {
        Ok(self.recently_ranked.get(&mode).cloned().unwrap_or_default())
    }

    async fn apply(&self, sets: &[BeatmapSet]) -> Result<(), StoreError> {
        self.applied.lock().unwrap().extend_from_slice(sets);
        Ok(())
    }
}
