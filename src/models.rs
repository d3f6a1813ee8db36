//! Data models for Movie Finder

use serde::{Deserialize, Deserializer, Serialize};

/// Treat JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Turn `Some("")` into `None`
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionCompany {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// A movie as returned by the catalog, either from a list query or a detail lookup.
/// List responses leave the detail-only fields at their defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Movie {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_count: u64,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<Genre>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genre_ids: Vec<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub budget: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub revenue: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub production_companies: Vec<ProductionCompany>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_language: String,
    #[serde(default)]
    pub tagline: Option<String>,
}

impl Movie {
    /// Collapse blank optional strings so the views only ever check for `None`.
    pub fn normalized(mut self) -> Self {
        self.poster_path = non_empty(self.poster_path);
        self.backdrop_path = non_empty(self.backdrop_path);
        self.release_date = non_empty(self.release_date);
        self.tagline = non_empty(self.tagline);
        if self.runtime == Some(0) {
            self.runtime = None;
        }
        self
    }
}

/// Paged list envelope used by discover and search
#[derive(Debug, Clone, Deserialize)]
pub struct MoviePage {
    #[serde(default)]
    pub page: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<Movie>,
    #[serde(default)]
    pub total_results: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub character: String,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cast: Vec<CastMember>,
}

impl Credits {
    pub fn normalized(mut self) -> Self {
        for member in &mut self.cast {
            member.profile_path = non_empty(member.profile_path.take());
        }
        self
    }
}

/// Search counter row kept by the trend store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingEntry {
    pub id: String,
    pub search_term: String,
    pub count: u64,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub movie_id: Option<u64>,
}

/// Navigation target inside the app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Home,
    Movie(u64),
}

impl Route {
    /// Parse `/` or `/movie/{id}`
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.trim().trim_end_matches('/');
        if path.is_empty() {
            return Some(Route::Home);
        }
        let id = path.strip_prefix("/movie/")?;
        id.parse().ok().map(Route::Movie)
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Movie(id) => format!("/movie/{}", id),
        }
    }
}

/// UI Tab selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tab {
    Browse,
    Console,
}
