//! Trending searches
//!
//! Counts how often each search term led to results and keeps a snapshot of
//! the top movie for it. Storage is pluggable: a JSON file next to the config
//! or a remote document database.

mod local;
mod remote;

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

use crate::api::{image_url, POSTER_SIZE};
use crate::models::{Movie, TrendingEntry};
use crate::search::SearchEvent;

pub use local::LocalTrendStore;
pub use remote::{RemoteStoreConfig, RemoteTrendStore};

pub const DEFAULT_TRENDING_LIMIT: usize = 5;
pub const TRENDING_FAILED_MESSAGE: &str = "Failed to load trending movies.";

#[derive(Debug, Error)]
pub enum TrendError {
    #[error("trend store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("trend store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("trend store transport error: {0}")]
    Transport(String),
    #[error("trend store returned HTTP {status}")]
    HttpStatus { status: u16 },
    #[error("trend entry {id} not found")]
    NotFound { id: String },
    #[error("trend store not configured: {0}")]
    NotConfigured(String),
}

impl From<ureq::Error> for TrendError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(status) => TrendError::HttpStatus { status },
            other => TrendError::Transport(other.to_string()),
        }
    }
}

/// Document store holding one `TrendingEntry` per distinct search term.
pub trait TrendStore: Send + Sync {
    /// Exact, case-sensitive lookup
    fn find_by_term(&self, term: &str) -> Result<Option<TrendingEntry>, TrendError>;
    /// Insert a new entry; the store assigns the id
    fn create(&self, entry: &TrendingEntry) -> Result<TrendingEntry, TrendError>;
    /// Overwrite count and snapshot of an existing entry
    fn update(&self, entry: &TrendingEntry) -> Result<TrendingEntry, TrendError>;
    fn top_by_count(&self, limit: usize) -> Result<Vec<TrendingEntry>, TrendError>;
}

pub struct TrendRecorder {
    store: Arc<dyn TrendStore>,
    image_base_url: String,
}

impl TrendRecorder {
    pub fn new(store: Arc<dyn TrendStore>, image_base_url: &str) -> Self {
        Self {
            store,
            image_base_url: image_base_url.to_string(),
        }
    }

    /// Bump the counter for `term`, creating it at 1 on first use. The
    /// snapshot always reflects the latest top result.
    pub fn record_search(&self, term: &str, top: &Movie) -> Result<TrendingEntry, TrendError> {
        let poster_url =
            image_url(&self.image_base_url, POSTER_SIZE, top.poster_path.as_deref()).unwrap_or_default();

        match self.store.find_by_term(term)? {
            Some(mut entry) => {
                entry.count += 1;
                entry.poster_url = poster_url;
                entry.title = top.title.clone();
                entry.movie_id = Some(top.id);
                self.store.update(&entry)
            }
            None => self.store.create(&TrendingEntry {
                id: String::new(),
                search_term: term.to_string(),
                count: 1,
                poster_url,
                title: top.title.clone(),
                movie_id: Some(top.id),
            }),
        }
    }

    /// At most `limit` entries, highest count first
    pub fn list_trending(&self, limit: usize) -> Result<Vec<TrendingEntry>, TrendError> {
        let mut entries = self.store.top_by_count(limit)?;
        rank_by_count(&mut entries, limit);
        Ok(entries)
    }
}

/// Highest count first, ties by search term, cut to `limit`.
pub(crate) fn rank_by_count(entries: &mut Vec<TrendingEntry>, limit: usize) {
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.search_term.cmp(&b.search_term)));
    entries.truncate(limit);
}

/// Record every successful term search on a background thread. The thread
/// ends when the search controller goes away and returns how many searches
/// it stored.
pub fn spawn_subscriber(recorder: Arc<TrendRecorder>, events: Receiver<SearchEvent>) -> JoinHandle<usize> {
    thread::spawn(move || {
        let mut recorded = 0;
        for event in events {
            match event {
                SearchEvent::ResultsLoaded { term, top } => match recorder.record_search(&term, &top) {
                    Ok(entry) => {
                        recorded += 1;
                        log::info!("Recorded search '{}' (count {})", entry.search_term, entry.count);
                    }
                    Err(e) => log::warn!("Failed to record search '{}': {}", term, e),
                },
            }
        }
        recorded
    })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendingState {
    pub is_loading: bool,
    pub error_message: String,
    pub entries: Vec<TrendingEntry>,
}

/// State for the trending strip on the home page. Loads once per session.
#[derive(Default)]
pub struct TrendingPanel {
    state: TrendingState,
    requested: bool,
    receiver: Option<Receiver<Result<Vec<TrendingEntry>, TrendError>>>,
}

impl TrendingPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TrendingState {
        &self.state
    }

    /// Start the one-time fetch. Returns false if it already ran.
    pub fn load(&mut self, recorder: Arc<TrendRecorder>, limit: usize) -> bool {
        if self.requested {
            return false;
        }
        self.requested = true;
        self.state.is_loading = true;
        self.state.error_message.clear();

        let (sender, receiver) = channel();
        self.receiver = Some(receiver);
        thread::spawn(move || {
            let _ = sender.send(recorder.list_trending(limit));
        });
        true
    }

    pub fn poll(&mut self) -> bool {
        let Some(receiver) = &self.receiver else {
            return false;
        };
        match receiver.try_recv() {
            Ok(result) => self.finish(Some(result)),
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => self.finish(None),
        }
        true
    }

    pub fn wait(&mut self, timeout: Duration) -> bool {
        let Some(receiver) = &self.receiver else {
            return false;
        };
        match receiver.recv_timeout(timeout) {
            Ok(result) => self.finish(Some(result)),
            Err(RecvTimeoutError::Timeout) => return false,
            Err(RecvTimeoutError::Disconnected) => self.finish(None),
        }
        true
    }

    /// `None` means the worker died without answering.
    fn finish(&mut self, result: Option<Result<Vec<TrendingEntry>, TrendError>>) {
        self.receiver = None;
        self.state.is_loading = false;
        match result {
            Some(Ok(entries)) => {
                log::info!("Loaded {} trending searches", entries.len());
                self.state.entries = entries;
            }
            Some(Err(e)) => {
                log::error!("Error fetching trending movies: {}", e);
                self.state.error_message = TRENDING_FAILED_MESSAGE.to_string();
            }
            None => {
                log::error!("Trending worker exited without a result");
                self.state.error_message = TRENDING_FAILED_MESSAGE.to_string();
            }
        }
    }
}

#[cfg(test)]
#[path = "trending_tests.rs"]
mod tests;
