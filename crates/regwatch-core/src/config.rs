//! Run configuration, built once at process start and threaded into the
//! orchestrator. The ingestion crates never read environment state
//! themselves; tests construct a `Config` directly.

use std::path::PathBuf;

use crate::record::Level;

/// Regulations.gov v4 API root.
pub const FEDERAL_BASE_URL: &str = "https://api.regulations.gov/v4";
/// NYS Open Legislation API root.
pub const STATE_BASE_URL: &str = "https://legislation.nysenate.gov";
/// NYC open-data portal root (Socrata).
pub const LOCAL_BASE_URL: &str = "https://data.cityofnewyork.us";

/// Endpoint root and credential for one source.
///
/// `base_url` has no trailing slash; adapters append their own paths.
/// It is a plain field (rather than a constant) so tests can point a
/// source at a local mock server.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl SourceConfig {
    /// A source with no key (or an empty one) is skipped before any
    /// network I/O — a configuration gate, not a runtime error.
    pub fn enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}

/// Everything one aggregation run needs.
#[derive(Debug, Clone)]
pub struct Config {
    pub federal: SourceConfig,
    pub state: SourceConfig,
    pub local: SourceConfig,
    /// Lookback window in days for source date filters.
    pub days_back: u32,
    /// Maximum results requested per source (one page, no pagination).
    pub page_size: u32,
    /// Optional search term forwarded to sources that support one.
    pub search_term: Option<String>,
    /// Fixed HTTP timeout; a call that exceeds it counts as source
    /// unavailability.
    pub request_timeout_secs: u64,
    pub db_path: PathBuf,
}

impl Config {
    pub fn source(&self, level: Level) -> &SourceConfig {
        match level {
            Level::Federal => &self.federal,
            Level::State => &self.state,
            Level::Local => &self.local,
        }
    }

    /// True when no source has a key at all — nothing to fetch.
    pub fn no_sources_enabled(&self) -> bool {
        Level::ALL.iter().all(|&level| !self.source(level).enabled())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            federal: SourceConfig {
                base_url: FEDERAL_BASE_URL.to_string(),
                api_key: None,
            },
            state: SourceConfig {
                base_url: STATE_BASE_URL.to_string(),
                api_key: None,
            },
            local: SourceConfig {
                base_url: LOCAL_BASE_URL.to_string(),
                api_key: None,
            },
            days_back: 7,
            page_size: 10,
            search_term: None,
            request_timeout_secs: 30,
            db_path: PathBuf::from("regulations.db"),
        }
    }
}
