//! TMDB catalog API client

use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{Credits, Movie, MoviePage};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";
pub const DEFAULT_USER_AGENT: &str = concat!("movie_finder/", env!("CARGO_PKG_VERSION"));

/// Poster size used on cards and trend snapshots
pub const POSTER_SIZE: &str = "w500";
pub const BACKDROP_SIZE: &str = "w1280";
pub const PROFILE_SIZE: &str = "w185";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no catalog API key configured")]
    MissingApiKey,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("catalog returned HTTP {status}")]
    HttpStatus { status: u16 },
    #[error("movie {id} not found")]
    NotFound { id: u64 },
    #[error("failed to decode catalog response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }
}

impl From<ureq::Error> for CatalogError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(status) => CatalogError::HttpStatus { status },
            other => CatalogError::Transport(other.to_string()),
        }
    }
}

/// Connection settings for the catalog service
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub api_key: String,
    pub base_url: String,
    pub image_base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CatalogConfig {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_image_base_url(mut self, image_base_url: &str) -> Self {
        self.image_base_url = image_base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `{imageBase}/{size}{path}`, or `None` when the movie has no such image
    pub fn image_url(&self, size: &str, path: Option<&str>) -> Option<String> {
        image_url(&self.image_base_url, size, path)
    }
}

pub fn image_url(image_base_url: &str, size: &str, path: Option<&str>) -> Option<String> {
    let path = path.filter(|p| !p.is_empty())?;
    Some(format!("{}/{}{}", image_base_url.trim_end_matches('/'), size, path))
}

/// The four read-only queries the app makes against the movie catalog.
pub trait Catalog: Send + Sync {
    /// Popular movies, most popular first
    fn discover_popular(&self) -> Result<Vec<Movie>, CatalogError>;
    fn search_by_term(&self, term: &str) -> Result<Vec<Movie>, CatalogError>;
    fn get_movie(&self, id: u64) -> Result<Movie, CatalogError>;
    fn get_credits(&self, id: u64) -> Result<Credits, CatalogError>;
}

pub struct TmdbClient {
    config: CatalogConfig,
    agent: ureq::Agent,
}

impl TmdbClient {
    pub fn new(config: CatalogConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { config, agent }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Authenticated GET returning the decoded body. Non-2xx is an error;
    /// a 404 is mapped to `NotFound` when `id` is given.
    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        id: Option<u64>,
    ) -> Result<T, CatalogError> {
        if self.config.api_key.is_empty() {
            return Err(CatalogError::MissingApiKey);
        }

        let url = self.endpoint(path);
        let mut request = self
            .agent
            .get(&url)
            .header("Authorization", &format!("Bearer {}", self.config.api_key))
            .header("Accept", "application/json")
            .header("User-Agent", &self.config.user_agent);
        for (key, value) in query {
            request = request.query(*key, *value);
        }

        log::debug!("GET {}", url);
        let mut response = request.call()?;

        let status = response.status();
        if !status.is_success() {
            return Err(match id {
                Some(id) if status.as_u16() == 404 => CatalogError::NotFound { id },
                _ => CatalogError::HttpStatus { status: status.as_u16() },
            });
        }

        let body = response.body_mut().read_to_string()?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl Catalog for TmdbClient {
    fn discover_popular(&self) -> Result<Vec<Movie>, CatalogError> {
        let page: MoviePage =
            self.get_json("/discover/movie", &[("sort_by", "popularity.desc")], None)?;
        Ok(page.results.into_iter().map(Movie::normalized).collect())
    }

    fn search_by_term(&self, term: &str) -> Result<Vec<Movie>, CatalogError> {
        let page: MoviePage = self.get_json("/search/movie", &[("query", term)], None)?;
        Ok(page.results.into_iter().map(Movie::normalized).collect())
    }

    fn get_movie(&self, id: u64) -> Result<Movie, CatalogError> {
        let movie: Movie = self.get_json(&format!("/movie/{}", id), &[], Some(id))?;
        Ok(movie.normalized())
    }

    fn get_credits(&self, id: u64) -> Result<Credits, CatalogError> {
        let credits: Credits = self.get_json(&format!("/movie/{}/credits", id), &[], Some(id))?;
        Ok(credits.normalized())
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
