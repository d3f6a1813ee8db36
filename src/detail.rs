//! Movie detail page controller

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::api::{Catalog, CatalogError};
use crate::models::{Credits, Movie};

pub const DETAIL_FAILED_MESSAGE: &str = "Failed to load movie details. Please try again.";
pub const NOT_FOUND_MESSAGE: &str = "Movie not found";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailState {
    pub movie_id: Option<u64>,
    pub is_loading: bool,
    pub error_message: String,
    pub movie: Option<Movie>,
    /// Absent when the credits request failed; the page renders without cast
    pub credits: Option<Credits>,
}

impl DetailState {
    /// Whether the detail body should render at all
    pub fn has_movie(&self) -> bool {
        !self.is_loading && self.error_message.is_empty() && self.movie.is_some()
    }

    /// Message shown instead of the detail body once loading settled
    pub fn failure_message(&self) -> Option<&str> {
        if self.is_loading {
            None
        } else if !self.error_message.is_empty() {
            Some(&self.error_message)
        } else if self.movie.is_none() {
            Some(NOT_FOUND_MESSAGE)
        } else {
            None
        }
    }
}

#[derive(Debug)]
struct DetailOutcome {
    generation: u64,
    movie_id: u64,
    movie: Result<Movie, CatalogError>,
    credits: Option<Credits>,
}

/// Reports a failure if the worker exits without answering.
struct CompletionGuard {
    sender: Sender<DetailOutcome>,
    generation: u64,
    movie_id: u64,
    done: bool,
}

impl CompletionGuard {
    fn complete(mut self, movie: Result<Movie, CatalogError>, credits: Option<Credits>) {
        self.done = true;
        let _ = self.sender.send(DetailOutcome {
            generation: self.generation,
            movie_id: self.movie_id,
            movie,
            credits,
        });
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if !self.done {
            let _ = self.sender.send(DetailOutcome {
                generation: self.generation,
                movie_id: self.movie_id,
                movie: Err(CatalogError::Transport("detail worker exited unexpectedly".to_string())),
                credits: None,
            });
        }
    }
}

pub struct DetailController {
    catalog: Arc<dyn Catalog>,
    state: DetailState,
    generation: u64,
    scroll_to_top: bool,
    sender: Sender<DetailOutcome>,
    receiver: Receiver<DetailOutcome>,
}

impl DetailController {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        let (sender, receiver) = channel();
        Self {
            catalog,
            state: DetailState::default(),
            generation: 0,
            scroll_to_top: false,
            sender,
            receiver,
        }
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn set_catalog(&mut self, catalog: Arc<dyn Catalog>) {
        self.catalog = catalog;
    }

    /// Navigate to a movie. Always fetches fresh data.
    pub fn open(&mut self, id: u64) {
        self.generation += 1;
        self.scroll_to_top = true;
        self.state = DetailState {
            movie_id: Some(id),
            is_loading: true,
            ..Default::default()
        };
        log::info!("Loading details for movie {}", id);

        let catalog = Arc::clone(&self.catalog);
        let guard = CompletionGuard {
            sender: self.sender.clone(),
            generation: self.generation,
            movie_id: id,
            done: false,
        };

        thread::spawn(move || {
            let movie = catalog.get_movie(id);
            // cast is optional, only asked for once the movie resolved
            let credits = match &movie {
                Ok(_) => match catalog.get_credits(id) {
                    Ok(credits) => Some(credits),
                    Err(e) => {
                        log::debug!("Credits unavailable for movie {}: {}", id, e);
                        None
                    }
                },
                Err(_) => None,
            };
            guard.complete(movie, credits);
        });
    }

    /// Scroll reset request for the view. True once per `open`, on the
    /// first call after the movie body can render.
    pub fn take_scroll_to_top(&mut self) -> bool {
        if !self.state.has_movie() {
            return false;
        }
        std::mem::take(&mut self.scroll_to_top)
    }

    pub fn poll(&mut self) -> bool {
        let mut applied = false;
        while let Ok(outcome) = self.receiver.try_recv() {
            applied |= self.apply(outcome);
        }
        applied
    }

    pub fn wait(&mut self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => {
                self.apply(outcome);
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    fn apply(&mut self, outcome: DetailOutcome) -> bool {
        if outcome.generation != self.generation {
            log::debug!("Discarding stale details for movie {}", outcome.movie_id);
            return false;
        }

        self.state.is_loading = false;
        match outcome.movie {
            Ok(movie) => {
                log::info!("Loaded details for '{}'", movie.title);
                self.state.movie = Some(movie);
                self.state.credits = outcome.credits;
            }
            Err(e) if e.is_not_found() => {
                log::warn!("Movie {} not found", outcome.movie_id);
                self.state.error_message = NOT_FOUND_MESSAGE.to_string();
            }
            Err(e) => {
                log::error!("Error fetching movie details: {}", e);
                self.state.error_message = DETAIL_FAILED_MESSAGE.to_string();
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "detail_tests.rs"]
mod tests;
