//! The external rhythm-game platform's REST API, modeled as a trait
//! boundary (SPEC_FULL §6).

pub use dto::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::events::MapEvent;
use crate::model::BeatmapSet;

mod dto;
pub mod http;
pub mod mock;

/// Possible errors talking to the platform's API.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Token fetch came back non-2xx, or the response had no `access_token`.
    #[error("failed to authenticate with the platform")]
    AuthFailure,

    /// Any other API call came back non-2xx or with an empty body.
    #[error("platform API request failed: {0}")]
    ApiFailure(String),

    /// The HTTP transport itself failed.
    #[error("platform API request failed")]
    RequestError(#[from] reqwest::Error),

    /// Likely a bug on our end, or the upstream response shape changed.
    #[error("failed to parse platform API response")]
    ParseError(#[from] serde_json::Error),
}

/// The platform operations the cycle orchestrator depends on.
///
/// One real implementation (`http::HttpPlatformApi`) talks to the actual
/// REST API; `mock::MockPlatformApi` is an in-memory fixture used in tests,
/// mirroring the teacher's `trait Server`/`trait Queries` split.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Fetch a single beatmap set by id.
    async fn beatmapset(&self, id: i64) -> Result<BeatmapSet, PlatformError>;

    /// Fetch the full moderation event history scoped to one beatmap set.
    async fn beatmapset_events(&self, beatmapset_id: i64) -> Result<Vec<MapEvent>, PlatformError>;

    /// Walk the paged global event stream from the most recent cursor back
    /// to (and not including) `last_event_id`, returning events in
    /// chronological order together with the new cursor (the first page's
    /// first event id). Duplicates seen across pages are skipped.
    ///
    /// Rate-limited: pauses after every `WALK_PAGES_PER_PAUSE` successful
    /// page fetches, and gives up with `PlatformError::ApiFailure` after
    /// `MAX_WALK_PAGES` pages (SPEC_FULL §9, Open Question 3).
    async fn walk_global_events(&self, last_event_id: Option<i64>) -> Result<(Vec<MapEvent>, Option<i64>), PlatformError>;

    /// List the ids of qualified sets with outstanding unresolved
    /// discussions (suggestions or problems).
    async fn unresolved_discussions(&self) -> Result<Vec<i64>, PlatformError>;
}
