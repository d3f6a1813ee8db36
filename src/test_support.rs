//! Shared fakes for unit tests: a scripted catalog, an in-memory trend
//! store and a loopback HTTP server.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::api::{Catalog, CatalogError};
use crate::models::{CastMember, Credits, Movie, TrendingEntry};
use crate::trending::{TrendError, TrendStore};

pub fn movie(id: u64, title: &str) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        poster_path: Some(format!("/poster{}.jpg", id)),
        release_date: Some("2008-07-16".to_string()),
        vote_average: Some(8.5),
        original_language: "en".to_string(),
        ..Default::default()
    }
}

pub fn credits(names: &[&str]) -> Credits {
    Credits {
        cast: names
            .iter()
            .enumerate()
            .map(|(i, name)| CastMember {
                id: i as u64 + 1,
                name: name.to_string(),
                character: format!("Role {}", i + 1),
                profile_path: None,
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogCall {
    Discover,
    Search(String),
    Movie(u64),
    Credits(u64),
}

/// Catalog answering from canned data and recording every call.
/// Unknown search terms return an empty list; unknown ids are `NotFound`.
#[derive(Default)]
pub struct FakeCatalog {
    calls: Mutex<Vec<CatalogCall>>,
    discover: Mutex<Vec<Movie>>,
    searches: Mutex<HashMap<String, Vec<Movie>>>,
    delays: Mutex<HashMap<String, Duration>>,
    failing_terms: Mutex<Vec<String>>,
    panicking_terms: Mutex<Vec<String>>,
    movies: Mutex<HashMap<u64, Movie>>,
    credits: Mutex<HashMap<u64, Credits>>,
    broken_movies: Mutex<Vec<u64>>,
    fail_discover: AtomicBool,
    fail_credits: AtomicBool,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_discover(self, movies: Vec<Movie>) -> Self {
        *self.discover.lock().unwrap() = movies;
        self
    }

    pub fn with_search(self, term: &str, movies: Vec<Movie>) -> Self {
        self.searches.lock().unwrap().insert(term.to_string(), movies);
        self
    }

    pub fn with_delay(self, term: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(term.to_string(), delay);
        self
    }

    pub fn failing_search(self, term: &str) -> Self {
        self.failing_terms.lock().unwrap().push(term.to_string());
        self
    }

    pub fn panicking_search(self, term: &str) -> Self {
        self.panicking_terms.lock().unwrap().push(term.to_string());
        self
    }

    pub fn failing_discover(self) -> Self {
        self.fail_discover.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_movie(self, movie: Movie) -> Self {
        self.movies.lock().unwrap().insert(movie.id, movie);
        self
    }

    pub fn with_credits(self, id: u64, credits: Credits) -> Self {
        self.credits.lock().unwrap().insert(id, credits);
        self
    }

    /// `get_movie(id)` fails with a transport error instead of resolving
    pub fn broken_movie(self, id: u64) -> Self {
        self.broken_movies.lock().unwrap().push(id);
        self
    }

    pub fn failing_credits(self) -> Self {
        self.fail_credits.store(true, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<CatalogCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                CatalogCall::Search(term) => Some(term),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: CatalogCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Catalog for FakeCatalog {
    fn discover_popular(&self) -> Result<Vec<Movie>, CatalogError> {
        self.record(CatalogCall::Discover);
        if self.fail_discover.load(Ordering::SeqCst) {
            return Err(CatalogError::HttpStatus { status: 500 });
        }
        Ok(self.discover.lock().unwrap().clone())
    }

    fn search_by_term(&self, term: &str) -> Result<Vec<Movie>, CatalogError> {
        self.record(CatalogCall::Search(term.to_string()));
        let delay = self.delays.lock().unwrap().get(term).copied();
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        if self.panicking_terms.lock().unwrap().iter().any(|t| t == term) {
            panic!("scripted panic for '{}'", term);
        }
        if self.failing_terms.lock().unwrap().iter().any(|t| t == term) {
            return Err(CatalogError::Transport("connection refused".to_string()));
        }
        Ok(self.searches.lock().unwrap().get(term).cloned().unwrap_or_default())
    }

    fn get_movie(&self, id: u64) -> Result<Movie, CatalogError> {
        self.record(CatalogCall::Movie(id));
        if self.broken_movies.lock().unwrap().contains(&id) {
            return Err(CatalogError::Transport("connection reset".to_string()));
        }
        self.movies
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(CatalogError::NotFound { id })
    }

    fn get_credits(&self, id: u64) -> Result<Credits, CatalogError> {
        self.record(CatalogCall::Credits(id));
        if self.fail_credits.load(Ordering::SeqCst) {
            return Err(CatalogError::HttpStatus { status: 503 });
        }
        self.credits
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(CatalogError::NotFound { id })
    }
}

/// In-memory trend store; `set_failing(true)` makes every call error.
#[derive(Default)]
pub struct MemoryTrendStore {
    entries: Mutex<Vec<TrendingEntry>>,
    next_id: AtomicU64,
    failing: AtomicBool,
}

impl MemoryTrendStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn entries(&self) -> Vec<TrendingEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn insert(&self, term: &str, count: u64) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.entries.lock().unwrap().push(TrendingEntry {
            id: id.to_string(),
            search_term: term.to_string(),
            count,
            poster_url: String::new(),
            title: term.to_string(),
            movie_id: None,
        });
    }

    fn check(&self) -> Result<(), TrendError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TrendError::Transport("store offline".to_string()));
        }
        Ok(())
    }
}

impl TrendStore for MemoryTrendStore {
    fn find_by_term(&self, term: &str) -> Result<Option<TrendingEntry>, TrendError> {
        self.check()?;
        Ok(self.entries.lock().unwrap().iter().find(|e| e.search_term == term).cloned())
    }

    fn create(&self, entry: &TrendingEntry) -> Result<TrendingEntry, TrendError> {
        self.check()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut created = entry.clone();
        created.id = id.to_string();
        self.entries.lock().unwrap().push(created.clone());
        Ok(created)
    }

    fn update(&self, entry: &TrendingEntry) -> Result<TrendingEntry, TrendError> {
        self.check()?;
        let mut entries = self.entries.lock().unwrap();
        let existing = entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| TrendError::NotFound { id: entry.id.clone() })?;
        *existing = entry.clone();
        Ok(entry.clone())
    }

    fn top_by_count(&self, limit: usize) -> Result<Vec<TrendingEntry>, TrendError> {
        self.check()?;
        let mut entries = self.entries();
        crate::trending::rank_by_count(&mut entries, limit);
        Ok(entries)
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or("")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All decoded values for a query parameter, in order
    pub fn query_values(&self, key: &str) -> Vec<String> {
        let Some((_, query)) = self.target.split_once('?') else {
            return Vec::new();
        };
        query
            .split('&')
            .filter_map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (percent_decode(k) == key).then(|| percent_decode(v))
            })
            .collect()
    }

    pub fn query(&self, key: &str) -> Option<String> {
        self.query_values(key).into_iter().next()
    }
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
                match u8::from_str_radix(hex, 16) {
                    Ok(b) => {
                        out.push(b);
                        i += 2;
                    }
                    Err(_) => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

type Handler = dyn Fn(&RecordedRequest) -> (u16, String) + Send + Sync;

/// Minimal HTTP/1.1 server on 127.0.0.1 that answers each request from a
/// handler closure and keeps a log of what it received.
pub struct TestServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl TestServer {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        let log = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let log = Arc::clone(&log);
                let handler = Arc::clone(&handler);
                thread::spawn(move || serve(stream, &log, handler.as_ref()));
            }
        });

        Self { addr, requests }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn serve(stream: TcpStream, log: &Mutex<Vec<RecordedRequest>>, handler: &Handler) {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    if reader.read_line(&mut line).is_err() {
        return;
    }
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let target = parts.next().unwrap_or("").to_string();

    let mut headers = Vec::new();
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).is_err() {
            return;
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((k, v)) = header.split_once(':') {
            headers.push((k.trim().to_string(), v.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    if reader.read_exact(&mut body).is_err() {
        return;
    }

    let request = RecordedRequest {
        method,
        target,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    let (status, response_body) = handler(&request);
    log.lock().unwrap().push(request);

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        if status < 400 { "OK" } else { "Error" },
        response_body.len(),
        response_body
    );
    let mut stream = reader.into_inner();
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
