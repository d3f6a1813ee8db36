//! Display formatting derived from catalog data

use crate::api::{image_url, BACKDROP_SIZE, POSTER_SIZE, PROFILE_SIZE};
use crate::models::{CastMember, Credits, Movie};

/// Shown wherever a movie or person has no image
pub const PLACEHOLDER_IMAGE: &str = "no-movie.png";
pub const NOT_AVAILABLE: &str = "N/A";
pub const CAST_LIMIT: usize = 12;

/// Year part of `YYYY-MM-DD`
pub fn release_year(movie: &Movie) -> String {
    movie
        .release_date
        .as_deref()
        .and_then(|date| date.split('-').next())
        .filter(|year| !year.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

pub fn format_rating(vote_average: Option<f64>) -> String {
    match vote_average {
        Some(v) => format!("{:.1}", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// `$160.0M`
pub fn format_millions(amount: u64) -> String {
    format!("${:.1}M", amount as f64 / 1_000_000.0)
}

pub fn format_popularity(popularity: Option<f64>) -> String {
    popularity.map(|p| format!("{:.1}", p)).unwrap_or_default()
}

pub fn format_runtime(runtime: Option<u32>) -> Option<String> {
    runtime.map(|minutes| format!("{} min", minutes))
}

pub fn language_label(movie: &Movie) -> String {
    movie.original_language.to_uppercase()
}

pub fn poster_or_placeholder(image_base_url: &str, movie: &Movie) -> String {
    image_url(image_base_url, POSTER_SIZE, movie.poster_path.as_deref())
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())
}

pub fn backdrop_or_placeholder(image_base_url: &str, movie: &Movie) -> String {
    image_url(image_base_url, BACKDROP_SIZE, movie.backdrop_path.as_deref())
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())
}

pub fn profile_or_placeholder(image_base_url: &str, member: &CastMember) -> String {
    image_url(image_base_url, PROFILE_SIZE, member.profile_path.as_deref())
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())
}

/// Leading billed cast, at most `limit`
pub fn top_cast(credits: Option<&Credits>, limit: usize) -> &[CastMember] {
    match credits {
        Some(credits) => &credits.cast[..credits.cast.len().min(limit)],
        None => &[],
    }
}
