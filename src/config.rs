//! Loading service configuration from TOML.
//!
//! See `AppConfig` for the expected schema. Every section is optional.

use serde::Deserialize;
use tracing::{info, error};

use crate::codec::Dialect;

pub const DEFAULT_API_URL: &str = "https://graphql.anilist.co";
/// Forum thread where finished challenges are announced.
pub const DEFAULT_ANNOUNCEMENT_THREAD: u64 = 4446;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub forum: ForumConfig,
  #[serde(default)]
  pub codec: CodecConfig,
}

/// Forum API endpoint and thread settings.
#[derive(Clone, Debug, Deserialize)]
pub struct ForumConfig {
  #[serde(default = "default_api_url")] pub api_url: String,
  #[serde(default = "default_announcement_thread")] pub announcement_thread_id: u64,
  #[serde(default = "default_timeout_secs")] pub timeout_secs: u64,
  /// Set to false to run without the forum client (offline parse/render only).
  #[serde(default = "default_enabled")] pub enabled: bool,
}

impl Default for ForumConfig {
  fn default() -> Self {
    Self {
      api_url: default_api_url(),
      announcement_thread_id: default_announcement_thread(),
      timeout_secs: default_timeout_secs(),
      enabled: default_enabled(),
    }
  }
}

fn default_api_url() -> String { DEFAULT_API_URL.into() }
fn default_announcement_thread() -> u64 { DEFAULT_ANNOUNCEMENT_THREAD }
fn default_timeout_secs() -> u64 { 20 }
fn default_enabled() -> bool { true }

/// Challenge code output settings.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct CodecConfig {
  #[serde(default)]
  pub dialect: Dialect,
}

/// Parse configuration text; an empty string gives the defaults.
pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

/// Attempt to load `AppConfig` from AWC_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_app_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("AWC_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "awc_backend", %path, dialect = ?cfg.codec.dialect, "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "awc_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "awc_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
