//! Time-window parameters shared by every source adapter.

use chrono::{Datelike, Duration, Utc};
use regwatch_core::Config;

/// Bounds one fetch: lookback window, page size, optional search term.
#[derive(Debug, Clone)]
pub struct FetchWindow {
    pub days_back: u32,
    pub page_size: u32,
    pub search_term: Option<String>,
}

impl FetchWindow {
    pub fn from_config(config: &Config) -> Self {
        Self {
            days_back: config.days_back,
            page_size: config.page_size,
            search_term: config.search_term.clone(),
        }
    }

    /// Inclusive lower bound for source date filters, as `YYYY-MM-DD`.
    pub fn from_date(&self) -> String {
        (Utc::now() - Duration::days(i64::from(self.days_back)))
            .format("%Y-%m-%d")
            .to_string()
    }

    /// Current legislative session year, used by the state source path.
    pub fn session_year(&self) -> i32 {
        Utc::now().year()
    }
}
