//! State adapter: NYS Open Legislation bill search.

use serde_json::{Value, json};
use tracing::info;

use regwatch_core::{Level, Regulation};

use crate::json::{scalar_to_string, str_field};
use crate::{FetchWindow, SyncError, UnmappableRecord, http};

/// Bill search over the NYS Open Legislation API. Results arrive inside a
/// `result.items` envelope; each item wraps the bill under `result`.
pub struct StateSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl StateSource {
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

    fn search_url(&self, session_year: i32) -> String {
        format!("{}/api/3/bills/{session_year}/search", self.base_url)
    }

    /// Fetch one page of bills for the current session year.
    ///
    /// The API requires a search term; `*` matches everything when no
    /// term is configured. It has no date filter, so the window only
    /// bounds the page size here.
    pub async fn fetch(&self, window: &FetchWindow) -> Result<Vec<Value>, SyncError> {
        let url = self.search_url(window.session_year());
        let term = window.search_term.clone().unwrap_or_else(|| "*".to_string());
        let query: Vec<(&str, String)> = vec![
            ("term", term),
            ("limit", window.page_size.to_string()),
            ("key", self.api_key.clone()),
        ];

        info!(url = %url, "fetching state bills");
        let body = http::get_json(self.client.get(&url).query(&query)).await?;
        let items = body
            .get("result")
            .and_then(|result| result.get("items"))
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| {
                SyncError::MalformedResponse("missing `result.items` array".to_string())
            })?;
        info!(count = items.len(), "fetched state bills");
        Ok(items)
    }

    /// Map one search item to the common record shape.
    ///
    /// Ids are synthesized as `nys-{session}-{basePrintNo}`; a bill with
    /// no print number cannot be identified and is unmappable. Dates come
    /// from the latest status action.
    pub fn normalize(&self, raw: &Value) -> Result<Regulation, UnmappableRecord> {
        let bill = raw.get("result").cloned().unwrap_or_else(|| json!({}));
        let print_no = str_field(&bill, "basePrintNo");
        if print_no.is_empty() {
            return Err(UnmappableRecord);
        }
        let session = scalar_to_string(bill.get("session")).unwrap_or_default();

        let status = bill.get("status");
        let action_date = status
            .map(|s| str_field(s, "actionDate"))
            .unwrap_or_default();

        let bill_title = str_field(&bill, "title");
        let title = if bill_title.is_empty() {
            print_no.clone()
        } else {
            format!("{print_no}: {bill_title}")
        };

        Ok(Regulation {
            id: format!("nys-{session}-{print_no}"),
            level: Level::State,
            title,
            description: str_field(&bill, "summary"),
            published_date: action_date.clone(),
            full_text: bill.to_string(),
            source_url: format!("{}/api/3/bills", self.base_url),
            source_last_modified: action_date,
        })
    }
}
