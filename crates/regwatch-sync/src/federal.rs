//! Federal adapter: Regulations.gov v4 document search.

use serde_json::{Value, json};
use tracing::info;

use regwatch_core::{Level, Regulation};

use crate::json::{non_empty, str_field};
use crate::{FetchWindow, SyncError, UnmappableRecord, http};

/// Regulations.gov exposes documents in JSON:API form: an envelope with a
/// `data` array whose items keep their content under `attributes`.
pub struct FederalSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FederalSource {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn documents_url(&self) -> String {
        format!("{}/documents", self.base_url)
    }

    /// Fetch one page of documents posted within the window.
    pub async fn fetch(&self, window: &FetchWindow) -> Result<Vec<Value>, SyncError> {
        let url = self.documents_url();
        let mut query: Vec<(&str, String)> = vec![
            ("filter[postedDate][ge]", window.from_date()),
            ("sort", "-postedDate".to_string()),
            ("page[size]", window.page_size.to_string()),
            ("api_key", self.api_key.clone()),
        ];
        if let Some(term) = &window.search_term {
            query.push(("filter[searchTerm]", term.clone()));
        }

        info!(url = %url, "fetching federal documents");
        let body = http::get_json(self.client.get(&url).query(&query)).await?;
        let data = body
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| SyncError::MalformedResponse("missing `data` array".to_string()))?;
        info!(count = data.len(), "fetched federal documents");
        Ok(data)
    }

    /// Map one JSON:API item to the common record shape.
    ///
    /// The document id lives in `attributes.documentId`, with the outer
    /// JSON:API `id` as fallback. Description prefers `summary` over
    /// `abstract`; `full_text` keeps the serialized attributes.
    pub fn normalize(&self, raw: &Value) -> Result<Regulation, UnmappableRecord> {
        let attrs = raw.get("attributes").cloned().unwrap_or_else(|| json!({}));
        let id = non_empty(attrs.get("documentId"))
            .or_else(|| non_empty(raw.get("id")))
            .ok_or(UnmappableRecord)?;

        let posted = str_field(&attrs, "postedDate");
        let mut description = str_field(&attrs, "summary");
        if description.is_empty() {
            description = str_field(&attrs, "abstract");
        }

        Ok(Regulation {
            id,
            level: Level::Federal,
            title: str_field(&attrs, "title"),
            description,
            published_date: posted.clone(),
            full_text: attrs.to_string(),
            source_url: self.documents_url(),
            source_last_modified: non_empty(attrs.get("lastModifiedDate")).unwrap_or(posted),
        })
    }
}
