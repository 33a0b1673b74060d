//! The closed set of source adapters.

use serde_json::Value;

use regwatch_core::{Level, Regulation, SourceConfig};

use crate::{
    FederalSource, FetchWindow, LocalSource, StateSource, SyncError, UnmappableRecord,
};

/// One government API behind the common fetch-and-normalize capability.
///
/// Adding a jurisdiction means adding a variant here plus its adapter
/// module; the orchestrator and the store stay untouched.
pub enum Source {
    Federal(FederalSource),
    State(StateSource),
    Local(LocalSource),
}

impl Source {
    /// Build the adapter for a level from its configuration. The caller
    /// has already checked the key gate; a missing key becomes an empty
    /// credential here.
    pub fn for_level(level: Level, config: &SourceConfig, client: reqwest::Client) -> Source {
        let key = config.api_key.clone().unwrap_or_default();
        match level {
            Level::Federal => Source::Federal(FederalSource::new(client, &config.base_url, key)),
            Level::State => Source::State(StateSource::new(client, &config.base_url, key)),
            Level::Local => Source::Local(LocalSource::new(client, &config.base_url, key)),
        }
    }

    pub fn level(&self) -> Level {
        match self {
            Source::Federal(_) => Level::Federal,
            Source::State(_) => Level::State,
            Source::Local(_) => Level::Local,
        }
    }

    /// One HTTP GET for one page of raw per-record JSON objects.
    pub async fn fetch(&self, window: &FetchWindow) -> Result<Vec<Value>, SyncError> {
        match self {
            Source::Federal(source) => source.fetch(window).await,
            Source::State(source) => source.fetch(window).await,
            Source::Local(source) => source.fetch(window).await,
        }
    }

    /// Map one raw object into the common record shape.
    pub fn normalize(&self, raw: &Value) -> Result<Regulation, UnmappableRecord> {
        match self {
            Source::Federal(source) => source.normalize(raw),
            Source::State(source) => source.normalize(raw),
            Source::Local(source) => source.normalize(raw),
        }
    }
}
