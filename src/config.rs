//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{CatalogConfig, DEFAULT_BASE_URL, DEFAULT_IMAGE_BASE_URL};
use crate::trending::{LocalTrendStore, RemoteStoreConfig, RemoteTrendStore, TrendError, TrendStore};

pub const APP_DIR: &str = "movie_finder";
pub const API_KEY_ENV: &str = "TMDB_API_KEY";

/// Where trending search counters are kept
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum TrendBackend {
    #[default]
    Local,
    Remote,
}

impl TrendBackend {
    pub fn label(&self) -> &'static str {
        match self {
            TrendBackend::Local => "Local file",
            TrendBackend::Remote => "Remote database",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_trending_limit")]
    pub trending_limit: usize,
    // Trending storage
    #[serde(default)]
    pub trend_backend: TrendBackend,
    #[serde(default)]
    pub remote_endpoint: String,
    #[serde(default)]
    pub remote_project_id: String,
    #[serde(default)]
    pub remote_database_id: String,
    #[serde(default)]
    pub remote_collection_id: String,
    #[serde(default)]
    pub remote_api_key: String,
    // Appearance
    #[serde(default = "default_true")]
    pub dark_mode: bool,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
}

fn default_api_base_url() -> String { DEFAULT_BASE_URL.to_string() }
fn default_image_base_url() -> String { DEFAULT_IMAGE_BASE_URL.to_string() }
fn default_timeout() -> u64 { 30 }
fn default_debounce_ms() -> u64 { 1000 }
fn default_trending_limit() -> usize { 5 }
fn default_font_size() -> u32 { 14 }
fn default_true() -> bool { true }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: default_api_base_url(),
            image_base_url: default_image_base_url(),
            request_timeout_secs: 30,
            debounce_ms: 1000,
            trending_limit: 5,
            trend_backend: TrendBackend::Local,
            remote_endpoint: String::new(),
            remote_project_id: String::new(),
            remote_database_id: String::new(),
            remote_collection_id: String::new(),
            remote_api_key: String::new(),
            dark_mode: true,
            font_size: 14,
        }
    }
}

/// `<config dir>/movie_finder/<name>`
pub fn app_file_path(name: &str) -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    fs::create_dir_all(&path).ok();
    path.push(name);
    path
}

impl AppConfig {
    fn config_path() -> PathBuf {
        app_file_path("config.json")
    }

    pub fn load() -> Self {
        let path = Self::config_path();

        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => log::warn!("Ignoring unreadable config {}: {}", path.display(), e),
                },
                Err(e) => log::warn!("Could not read config {}: {}", path.display(), e),
            }
        }

        Self::default()
    }

    pub fn save(&self) {
        let path = Self::config_path();
        match serde_json::to_string_pretty(self) {
            Ok(content) => {
                if let Err(e) = fs::write(&path, content) {
                    log::error!("Failed to save config to {}: {}", path.display(), e);
                }
            }
            Err(e) => log::error!("Failed to serialize config: {}", e),
        }
    }

    /// Runtime environment first, then the saved key, then the key baked in at build time.
    pub fn resolve_api_key(&self) -> String {
        resolve_api_key(std::env::var(API_KEY_ENV).ok(), &self.api_key, option_env!("TMDB_API_KEY"))
    }

    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig::new(&self.resolve_api_key())
            .with_base_url(&self.api_base_url)
            .with_image_base_url(&self.image_base_url)
            .with_timeout(Duration::from_secs(self.request_timeout_secs.max(1)))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn remote_store_config(&self) -> RemoteStoreConfig {
        RemoteStoreConfig {
            endpoint: self.remote_endpoint.trim().to_string(),
            project_id: self.remote_project_id.trim().to_string(),
            database_id: self.remote_database_id.trim().to_string(),
            collection_id: self.remote_collection_id.trim().to_string(),
            api_key: self.remote_api_key.trim().to_string(),
            timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        }
    }

    /// Whether moving to `next` needs a new catalog client
    pub fn catalog_differs(&self, next: &AppConfig) -> bool {
        self.api_key != next.api_key
            || self.api_base_url != next.api_base_url
            || self.image_base_url != next.image_base_url
            || self.request_timeout_secs != next.request_timeout_secs
    }

    /// Whether moving to `next` needs a new trend store or recorder
    pub fn trending_differs(&self, next: &AppConfig) -> bool {
        self.trend_backend != next.trend_backend
            || self.trending_limit != next.trending_limit
            || self.image_base_url != next.image_base_url
            || self.remote_store_config() != next.remote_store_config()
    }

    pub fn trend_store(&self) -> Result<Arc<dyn TrendStore>, TrendError> {
        Ok(match self.trend_backend {
            TrendBackend::Local => Arc::new(LocalTrendStore::new(app_file_path("trending.json"))),
            TrendBackend::Remote => Arc::new(RemoteTrendStore::new(self.remote_store_config())?),
        })
    }
}

fn resolve_api_key(env: Option<String>, saved: &str, built_in: Option<&str>) -> String {
    env.filter(|k| !k.trim().is_empty())
        .or_else(|| Some(saved.to_string()).filter(|k| !k.trim().is_empty()))
        .or_else(|| built_in.map(str::to_string))
        .map(|k| k.trim().to_string())
        .unwrap_or_default()
}
