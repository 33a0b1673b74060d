//! Request plumbing shared by the source adapters.

use serde_json::Value;

use crate::SyncError;

/// Send one GET and parse the body as JSON.
///
/// Non-success statuses and transport errors (including timeouts) are
/// `SourceUnavailable`; an unparseable body is `MalformedResponse`.
pub(crate) async fn get_json(request: reqwest::RequestBuilder) -> Result<Value, SyncError> {
    let resp = request.send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(SyncError::SourceUnavailable(format!(
            "server returned {status}"
        )));
    }
    resp.json()
        .await
        .map_err(|err| SyncError::MalformedResponse(err.to_string()))
}
