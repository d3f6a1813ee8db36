//! Search controller: debounced input, catalog queries and result state

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::api::{Catalog, CatalogError};
use crate::debounce::Debouncer;
use crate::models::Movie;

pub const QUIET_PERIOD: Duration = Duration::from_millis(1000);
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch movies. Please try again later.";
pub const NO_RESULTS_MESSAGE: &str = "No movies found.";

/// What the search page currently shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub raw_term: String,
    pub debounced_term: String,
    pub is_loading: bool,
    pub error_message: String,
    pub results: Vec<Movie>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchMode {
    Discover,
    Term(String),
}

impl SearchMode {
    /// Only the exact empty string means "browse popular".
    pub fn for_term(term: &str) -> Self {
        if term.is_empty() {
            SearchMode::Discover
        } else {
            SearchMode::Term(term.to_string())
        }
    }

    pub fn term(&self) -> &str {
        match self {
            SearchMode::Discover => "",
            SearchMode::Term(term) => term,
        }
    }
}

/// Broadcast to subscribers after a term search returned at least one movie
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    ResultsLoaded { term: String, top: Movie },
}

/// Result of one catalog query, tagged with the request generation
#[derive(Debug)]
pub struct SearchOutcome {
    pub generation: u64,
    pub mode: SearchMode,
    pub result: Result<Vec<Movie>, CatalogError>,
}

/// Reports a failure if the worker exits without sending its outcome,
/// so a panicking query can never leave the page stuck loading.
struct CompletionGuard {
    sender: Sender<SearchOutcome>,
    generation: u64,
    mode: SearchMode,
    done: bool,
}

impl CompletionGuard {
    fn complete(mut self, result: Result<Vec<Movie>, CatalogError>) {
        self.done = true;
        let _ = self.sender.send(SearchOutcome {
            generation: self.generation,
            mode: self.mode.clone(),
            result,
        });
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if !self.done {
            let _ = self.sender.send(SearchOutcome {
                generation: self.generation,
                mode: self.mode.clone(),
                result: Err(CatalogError::Transport("search worker exited unexpectedly".to_string())),
            });
        }
    }
}

pub struct SearchController {
    catalog: Arc<dyn Catalog>,
    state: SearchState,
    debouncer: Debouncer<String>,
    generation: u64,
    outcome_sender: Sender<SearchOutcome>,
    outcome_receiver: Receiver<SearchOutcome>,
    subscribers: Vec<Sender<SearchEvent>>,
}

impl SearchController {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self::with_quiet_period(catalog, QUIET_PERIOD)
    }

    pub fn with_quiet_period(catalog: Arc<dyn Catalog>, quiet_period: Duration) -> Self {
        let (outcome_sender, outcome_receiver) = channel();
        Self {
            catalog,
            state: SearchState::default(),
            debouncer: Debouncer::new(quiet_period),
            generation: 0,
            outcome_sender,
            outcome_receiver,
            subscribers: Vec::new(),
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Number of queries issued so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replace the catalog, e.g. after the API key changed in settings.
    pub fn set_catalog(&mut self, catalog: Arc<dyn Catalog>) {
        self.catalog = catalog;
    }

    pub fn set_quiet_period(&mut self, quiet_period: Duration) {
        self.debouncer.set_quiet_period(quiet_period);
    }

    /// Query the current term again, e.g. against a newly configured catalog.
    pub fn refresh(&mut self) {
        let term = self.state.debounced_term.clone();
        self.run_search(&term);
    }

    pub fn subscribe(&mut self) -> Receiver<SearchEvent> {
        let (sender, receiver) = channel();
        self.subscribers.push(sender);
        receiver
    }

    /// Disconnect every subscriber; their receiving loops end.
    pub fn unsubscribe_all(&mut self) {
        self.subscribers.clear();
    }

    /// Initial load when the page opens: browse popular movies.
    pub fn mount(&mut self) {
        let term = self.state.debounced_term.clone();
        self.run_search(&term);
    }

    pub fn on_input_change(&mut self, term: &str) {
        self.on_input_change_at(term, Instant::now());
    }

    /// Updates the visible text right away; the query waits for the debouncer.
    pub fn on_input_change_at(&mut self, term: &str, now: Instant) {
        self.state.raw_term = term.to_string();
        self.debouncer.push_at(term.to_string(), now);
    }

    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    /// Promote a settled input to `debounced_term`. Returns true when that
    /// started a new query.
    pub fn tick_at(&mut self, now: Instant) -> bool {
        let Some(term) = self.debouncer.tick_at(now) else {
            return false;
        };
        if term == self.state.debounced_term {
            return false;
        }
        self.state.debounced_term = term.clone();
        self.run_search(&term);
        true
    }

    pub fn time_until_debounce(&self, now: Instant) -> Option<Duration> {
        self.debouncer.time_until_fire(now)
    }

    /// Start a catalog query on a worker thread. Any query still in flight
    /// is superseded and its response will be ignored.
    pub fn run_search(&mut self, term: &str) {
        self.generation += 1;
        self.state.is_loading = true;
        self.state.error_message.clear();

        let mode = SearchMode::for_term(term);
        match &mode {
            SearchMode::Discover => log::info!("Loading popular movies"),
            SearchMode::Term(term) => log::info!("Searching for '{}'", term),
        }

        let guard = CompletionGuard {
            sender: self.outcome_sender.clone(),
            generation: self.generation,
            mode,
            done: false,
        };
        let catalog = Arc::clone(&self.catalog);

        thread::spawn(move || {
            let result = match &guard.mode {
                SearchMode::Discover => catalog.discover_popular(),
                SearchMode::Term(term) => catalog.search_by_term(term),
            };
            guard.complete(result);
        });
    }

    /// Apply every finished query without blocking. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.outcome_receiver.try_recv() {
            if self.apply_outcome(outcome) {
                applied += 1;
            }
        }
        applied
    }

    /// Block until one outcome arrives (stale or not) or the timeout passes.
    pub fn wait_for_outcome(&mut self, timeout: Duration) -> bool {
        match self.outcome_receiver.recv_timeout(timeout) {
            Ok(outcome) => {
                self.apply_outcome(outcome);
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Returns false when the outcome belongs to a superseded query.
    fn apply_outcome(&mut self, outcome: SearchOutcome) -> bool {
        if outcome.generation != self.generation {
            log::debug!(
                "Discarding stale results for '{}' (request {}, current {})",
                outcome.mode.term(),
                outcome.generation,
                self.generation
            );
            return false;
        }

        self.state.is_loading = false;

        match outcome.result {
            Err(e) => {
                log::error!("Error fetching movies: {}", e);
                self.state.error_message = FETCH_FAILED_MESSAGE.to_string();
            }
            Ok(movies) if movies.is_empty() => {
                log::info!("No movies found for '{}'", outcome.mode.term());
                self.state.error_message = NO_RESULTS_MESSAGE.to_string();
                self.state.results.clear();
            }
            Ok(movies) => {
                log::info!("Loaded {} movies", movies.len());
                self.state.error_message.clear();
                if let SearchMode::Term(term) = &outcome.mode {
                    self.emit(SearchEvent::ResultsLoaded {
                        term: term.clone(),
                        top: movies[0].clone(),
                    });
                }
                self.state.results = movies;
            }
        }
        true
    }

    fn emit(&mut self, event: SearchEvent) {
        self.subscribers.retain(|s| s.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
