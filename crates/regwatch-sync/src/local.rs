//! Local adapter: NYC open-data rules feed (Socrata).
//!
//! Unlike the federal and state APIs, Socrata resources return a bare
//! JSON array of rows with no envelope, and authenticate via the
//! `X-App-Token` header rather than a query parameter.

use serde_json::Value;
use tracing::info;

use regwatch_core::{Level, Regulation};

use crate::json::{non_empty, str_field};
use crate::{FetchWindow, SyncError, UnmappableRecord, http};

/// Dataset path of the published-rules resource on the city portal.
const DATASET_PATH: &str = "/resource/ry4b-kwxk.json";

pub struct LocalSource {
    client: reqwest::Client,
    base_url: String,
    app_token: String,
}

impl LocalSource {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        app_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            app_token: app_token.into(),
        }
    }

    fn resource_url(&self) -> String {
        format!("{}{DATASET_PATH}", self.base_url)
    }

    /// Fetch one page of rules published within the window, newest first.
    pub async fn fetch(&self, window: &FetchWindow) -> Result<Vec<Value>, SyncError> {
        let url = self.resource_url();
        let mut query: Vec<(&str, String)> = vec![
            (
                "$where",
                format!("publication_date >= '{}'", window.from_date()),
            ),
            ("$order", "publication_date DESC".to_string()),
            ("$limit", window.page_size.to_string()),
        ];
        if let Some(term) = &window.search_term {
            query.push(("$q", term.clone()));
        }

        info!(url = %url, "fetching local rules");
        let body = http::get_json(
            self.client
                .get(&url)
                .header("X-App-Token", &self.app_token)
                .query(&query),
        )
        .await?;
        let rows = body
            .as_array()
            .cloned()
            .ok_or_else(|| SyncError::MalformedResponse("expected a JSON array".to_string()))?;
        info!(count = rows.len(), "fetched local rules");
        Ok(rows)
    }

    /// Map one dataset row to the common record shape.
    ///
    /// Rows are flat; ids get a `nyc-` prefix to stay unique alongside
    /// the other sources. Description falls back from `summary` to the
    /// rule `body`.
    pub fn normalize(&self, raw: &Value) -> Result<Regulation, UnmappableRecord> {
        let row_id = non_empty(raw.get("record_id"))
            .or_else(|| non_empty(raw.get("id")))
            .ok_or(UnmappableRecord)?;

        let published = str_field(raw, "publication_date");
        let mut description = str_field(raw, "summary");
        if description.is_empty() {
            description = str_field(raw, "body");
        }

        Ok(Regulation {
            id: format!("nyc-{row_id}"),
            level: Level::Local,
            title: str_field(raw, "title"),
            description,
            published_date: published.clone(),
            full_text: raw.to_string(),
            source_url: self.resource_url(),
            source_last_modified: non_empty(raw.get("updated_at")).unwrap_or(published),
        })
    }
}
