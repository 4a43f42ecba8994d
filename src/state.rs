//! Application state: the in-memory store, config and the optional forum client.
//!
//! This module owns:
//!   - the challenge/requirement/submission store behind a RwLock
//!   - the loaded configuration (forum endpoint, output dialect)
//!   - the optional AniList client
//!
//! Lookups that combine store rows into codec inputs (requirement sets,
//! prerequisite links) live here so handlers stay thin.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::codec::{Prerequisite, RequirementSet};
use crate::config::{load_app_config_from_env, AppConfig};
use crate::domain::Challenge;
use crate::error::ApiError;
use crate::forum::AniList;
use crate::store::{ChallengeStore, MemoryStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<MemoryStore>>,
    pub forum: Option<AniList>,
    pub config: AppConfig,
}

impl AppState {
    /// Build state from env: load config, init the forum client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let config = load_app_config_from_env().unwrap_or_default();
        Self::with_config(config)
    }

    pub fn with_config(config: AppConfig) -> Self {
        let forum = AniList::from_config(&config.forum);
        if let Some(client) = &forum {
            info!(target: "awc_backend", api_url = %client.api_url, "Forum client enabled.");
        } else {
            info!(target: "awc_backend", "Forum client disabled. Only offline render/parse is available.");
        }
        Self {
            store: Arc::new(RwLock::new(MemoryStore::new())),
            forum,
            config,
        }
    }

    pub fn forum(&self) -> Result<&AniList, ApiError> {
        self.forum
            .as_ref()
            .ok_or_else(|| ApiError::ServiceUnavailable("forum client is disabled".into()))
    }

    /// Read-only access to a challenge by id.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_challenge(&self, id: Uuid) -> Result<Challenge, ApiError> {
        self.store
            .read()
            .await
            .challenge_by_id(id)
            .ok_or_else(|| ApiError::not_found(format!("Unknown challenge: {}", id)))
    }

    /// Definitions the codec should use for this challenge.
    pub async fn requirement_set(&self, challenge: &Challenge) -> RequirementSet {
        let store = self.store.read().await;
        RequirementSet::for_challenge(challenge, || store.requirements(challenge.id))
    }

    /// Prerequisites in order, linked to `user`'s submissions where they exist.
    pub async fn prerequisites(&self, challenge: &Challenge, user: Option<&str>) -> Vec<Prerequisite> {
        let store = self.store.read().await;
        challenge
            .prerequisites
            .iter()
            .filter_map(|id| store.challenge_by_id(*id))
            .map(|pre| Prerequisite {
                post: user.and_then(|u| store.submission(u, pre.id)).map(|s| s.locator()),
                name: pre.name,
            })
            .collect()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_config(AppConfig::default())
    }
}
