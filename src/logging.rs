//! Logger that feeds the in-app console and stderr

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use log::{Level, LevelFilter, Log, Metadata, Record};

pub const LOG_LEVEL_ENV: &str = "MOVIE_FINDER_LOG";
const MAX_LINES: usize = 500;

/// Shared line buffer shown in the Console tab
#[derive(Clone, Default)]
pub struct ConsoleLog {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, line: String) {
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.push_back(line);
        while lines.len() > MAX_LINES {
            lines.pop_front();
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

/// Get current local time as HH:MM:SS
fn timestamp_now() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

pub fn format_line(level: Level, message: &str) -> String {
    format!("[{}] [{}] {}", timestamp_now(), level, message)
}

struct ConsoleLogger {
    console: ConsoleLog,
    level: LevelFilter,
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
            && (metadata.target().starts_with(env!("CARGO_CRATE_NAME")) || metadata.level() <= Level::Warn)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record.level(), &record.args().to_string());
        eprintln!("{}", line);
        self.console.push(line);
    }

    fn flush(&self) {}
}

pub fn level_from_env(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| v.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install the global logger. Returns the console buffer it writes into.
pub fn init() -> ConsoleLog {
    let console = ConsoleLog::new();
    let level = level_from_env(std::env::var(LOG_LEVEL_ENV).ok().as_deref());
    let logger = ConsoleLogger {
        console: console.clone(),
        level,
    };
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(level);
    }
    console
}
