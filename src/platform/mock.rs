//! In-memory fixture implementation of [`super::PlatformApi`], used in unit
//! tests instead of the real `reqwest`-backed client.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::events::MapEvent;
use crate::model::BeatmapSet;

use super::{PlatformApi, PlatformError};

/// A scripted platform: callers populate `beatmapsets`/`events`/
/// `discussions` up front, then exercise code against it exactly as they
/// would against `http::HttpPlatformApi`.
#[derive(Default)]
pub struct MockPlatformApi {
    pub beatmapsets: HashMap<i64, BeatmapSet>,
    pub events: HashMap<i64, Vec<MapEvent>>,
    pub global_events: Vec<MapEvent>,
    pub discussions: Vec<i64>,
}

#[async_trait]
impl PlatformApi for MockPlatformApi {
    async fn beatmapset(&self, id: i64) -> Result<BeatmapSet, PlatformError> {
        self.beatmapsets
            .get(&id)
            .cloned()
            .ok_or_else(|| PlatformError::ApiFailure(format!("no fixture beatmapset {}", id)))
    }

    async fn beatmapset_events(&self, beatmapset_id: i64) -> Result<Vec<MapEvent>, PlatformError> {
        Ok(self.events.get(&beatmapset_id).cloned().unwrap_or_default())
    }

    async fn walk_global_events(&self, last_event_id: Option<i64>) -> Result<(Vec<MapEvent>, Option<i64>), PlatformError> {
        let events: Vec<MapEvent> = match last_event_id {
            None => self.global_events.clone(),
            Some(cursor) => self
                .global_events
                .iter()
                .filter(|e| e.id != cursor)
                .cloned()
                .collect(),
        };
        let new_cursor = self.global_events.first().map(|e| e.id).or(last_event_id);
        Ok((events, new_cursor))
    }

    async fn unresolved_discussions(&self) -> Result<Vec<i64>, PlatformError> {
        Ok(self.discussions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MapEventType;
    use chrono::Utc;

    #[tokio::test]
    async fn returns_fixture_data() {
        let mut mock = MockPlatformApi::default();
        mock.discussions = vec![1, 2, 3];
        mock.global_events.push(MapEvent {
            id: 1,
            beatmap_set_id: 1,
            event_type: MapEventType::Qualify,
            created_at: Utc::now(),
            beatmap_ids: vec![],
            nominators: vec![],
            user_id: None,
        });

        assert_eq!(mock.unresolved_discussions().await.unwrap(), vec![1, 2, 3]);
        let (events, cursor) = mock.walk_global_events(None).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(cursor, Some(1));
    }

    #[tokio::test]
    async fn missing_beatmapset_is_api_failure() {
        let mock = MockPlatformApi::default();
        let err = mock.beatmapset(999).await.unwrap_err();
        assert!(matches!(err, PlatformError::ApiFailure(_)));
    }
}
