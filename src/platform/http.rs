//! `reqwest`-backed implementation of [`super::PlatformApi`].

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use lazy_static::lazy_static;
use tokio::sync::RwLock;

use crate::config::{Config, USER_AGENT};
use crate::constants::{MAX_WALK_PAGES, WALK_PAGES_PER_PAUSE, WALK_PAUSE_SECS};
use crate::events::MapEvent;
use crate::model::BeatmapSet;

use super::{
    BeatmapsetResponse, DiscussionsResponse, EventsResponse, OAuthToken, PlatformApi, PlatformError,
    TokenResponse,
};

lazy_static! {
    /// The client used for all HTTP requests to the platform.
    static ref HTTP_CLIENT: reqwest::Client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .expect("failed to build http client");
}

const EVENT_TYPES_QUERY: &str = "types[]=qualify&types[]=disqualify&types[]=rank&types[]=nominate&types[]=nomination_reset";

/// Talks to the real platform REST API, caching the OAuth token behind a
/// `tokio::sync::RwLock` (SPEC_FULL §5).
pub struct HttpPlatformApi {
    base_url: String,
    client_id: u32,
    client_secret: String,
    token: RwLock<Option<OAuthToken>>,
}

impl HttpPlatformApi {
    pub fn new(config: &Config) -> Self {
        HttpPlatformApi {
            base_url: config.api_base_url.clone(),
            client_id: config.client_id,
            client_secret: config.client_secret.clone(),
            token: RwLock::new(None),
        }
    }

    /// Returns a still-valid token, fetching and caching a new one if
    /// necessary.
    async fn token(&self) -> Result<String, PlatformError> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired(Utc::now()) {
                    return Ok(token.value.clone());
                }
            }
        }

        let fetched = self.fetch_token().await?;
        let value = fetched.value.clone();
        *self.token.write().await = Some(fetched);
        Ok(value)
    }

    async fn fetch_token(&self) -> Result<OAuthToken, PlatformError> {
        log::debug!("fetching a new oauth token");

        let response = HTTP_CLIENT
            .post("https://osu.ppy.sh/oauth/token")
            .form(&[
                ("client_id", self.client_id.to_string()),
                ("client_secret", self.client_secret.clone()),
                ("grant_type", "client_credentials".to_string()),
                ("scope", "public".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PlatformError::AuthFailure);
        }

        let body: TokenResponse = response.json().await?;
        let expires_at_epoch_ms = Utc::now().timestamp_millis() + body.expires_in * 1000;

        Ok(OAuthToken {
            value: body.access_token,
            expires_at_epoch_ms,
        })
    }
}

#[async_trait]
impl PlatformApi for HttpPlatformApi {
    async fn beatmapset(&self, id: i64) -> Result<BeatmapSet, PlatformError> {
        let token = self.token().await?;
        let url = format!("{}/beatmapsets/{}", self.base_url, id);

        log::debug!("fetch beatmapset {}", id);
        let response = HTTP_CLIENT.get(&url).bearer_auth(token).send().await?;
        if !response.status().is_success() {
            return Err(PlatformError::ApiFailure(format!("beatmapsets/{} failed", id)));
        }

        let dto: BeatmapsetResponse = response.json().await?;
        Ok(dto.into())
    }

    async fn beatmapset_events(&self, beatmapset_id: i64) -> Result<Vec<MapEvent>, PlatformError> {
        let token = self.token().await?;
        let url = format!(
            "{}/beatmapsets/events?{}&beatmapset_id={}&limit=50",
            self.base_url, EVENT_TYPES_QUERY, beatmapset_id
        );

        log::debug!("fetch events for beatmapset {}", beatmapset_id);
        let response = HTTP_CLIENT.get(&url).bearer_auth(token).send().await?;
        if !response.status().is_success() {
            return Err(PlatformError::ApiFailure(format!(
                "events for beatmapset {} failed",
                beatmapset_id
            )));
        }

        let body: EventsResponse = response.json().await?;
        Ok(body.events.into_iter().filter_map(|e| e.into_map_event()).collect())
    }

    async fn walk_global_events(&self, last_event_id: Option<i64>) -> Result<(Vec<MapEvent>, Option<i64>), PlatformError> {
        let token = self.token().await?;

        let mut collected: Vec<MapEvent> = Vec::new();
        let mut seen_ids: HashSet<i64> = HashSet::new();
        let mut new_cursor: Option<i64> = None;
        let mut page = 1usize;
        let mut pages_fetched_since_pause = 0usize;

        loop {
            if page > MAX_WALK_PAGES {
                return Err(PlatformError::ApiFailure(
                    "global event walker exceeded MAX_WALK_PAGES without reaching last_event_id".to_string(),
                ));
            }

            let url = format!(
                "{}/beatmapsets/events?{}&limit=50&page={}",
                self.base_url, EVENT_TYPES_QUERY, page
            );

            log::debug!("fetch global events page {}", page);
            let response = HTTP_CLIENT.get(&url).bearer_auth(token.clone()).send().await?;
            if !response.status().is_success() {
                return Err(PlatformError::ApiFailure(format!("global events page {} failed", page)));
            }

            let body: EventsResponse = response.json().await?;
            if body.events.is_empty() {
                break;
            }

            if page == 1 {
                new_cursor = body.events.first().map(|e| e.id);
            }

            let mut reached_cursor = false;
            for dto in body.events {
                if Some(dto.id) == last_event_id {
                    reached_cursor = true;
                    break;
                }
                if !seen_ids.insert(dto.id) {
                    continue;
                }
                if let Some(event) = dto.into_map_event() {
                    collected.push(event);
                }
            }

            if reached_cursor {
                break;
            }

            page += 1;
            pages_fetched_since_pause += 1;

            if pages_fetched_since_pause >= WALK_PAGES_PER_PAUSE {
                log::debug!("global event walker pausing after {} pages", pages_fetched_since_pause);
                tokio::time::delay_for(std::time::Duration::from_secs(WALK_PAUSE_SECS)).await;
                pages_fetched_since_pause = 0;
            }
        }

        collected.reverse(); // pages walk newest-first; callers expect chronological order.
        Ok((collected, new_cursor.or(last_event_id)))
    }

    async fn unresolved_discussions(&self) -> Result<Vec<i64>, PlatformError> {
        let token = self.token().await?;
        let url = format!(
            "{}/beatmapsets/discussions?beatmapset_status=qualified&message_types[]=suggestion&message_types[]=problem&only_unresolved=true&limit=50",
            self.base_url
        );

        log::debug!("fetch unresolved discussions");
        let response = HTTP_CLIENT.get(&url).bearer_auth(token).send().await?;
        if !response.status().is_success() {
            return Err(PlatformError::ApiFailure("unresolved discussions fetch failed".to_string()));
        }

        let body: DiscussionsResponse = response.json().await?;
        Ok(body.beatmapsets.into_iter().map(|b| b.id).collect())
    }
}
