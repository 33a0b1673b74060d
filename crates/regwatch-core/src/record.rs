//! Shared record types for the aggregation pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Jurisdiction tier of a regulation source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Federal,
    State,
    Local,
}

impl Level {
    /// Every level, in the fixed order the orchestrator processes them.
    pub const ALL: [Level; 3] = [Level::Federal, Level::State, Level::Local];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Federal => "federal",
            Level::State => "state",
            Level::Local => "local",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("unknown level: {0:?} (expected federal, state, or local)")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "federal" => Ok(Level::Federal),
            "state" => Ok(Level::State),
            "local" => Ok(Level::Local),
            other => Err(ParseLevelError(other.to_string())),
        }
    }
}

/// A regulatory-update record in the common shape all sources normalize to.
///
/// Date fields are source-asserted ISO 8601 strings, stored as given:
/// sources disagree on precision (bare dates vs full datetimes) and the
/// pipeline never does arithmetic on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regulation {
    /// Unique within a source+level combination; table-wide primary key.
    pub id: String,
    pub level: Level,
    /// May be empty when the source omits it.
    pub title: String,
    /// Summary or abstract, when the source provides one.
    pub description: String,
    pub published_date: String,
    /// Extracted full text, or the serialized raw payload as a fallback.
    pub full_text: String,
    /// The API endpoint that produced the record.
    pub source_url: String,
    pub source_last_modified: String,
}
