//! Response handling shared by the Google REST clients.

use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, ProviderResult};

/// Error envelope returned by Google APIs.
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: String,
}

/// Maps a transport failure to a provider error.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> ProviderError {
    let message = if err.is_timeout() {
        "request timeout".to_string()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        format!("request failed: {err}")
    };
    ProviderError::network(message)
        .with_provider(provider)
        .with_source(err)
}

/// Classifies a non-success response.
pub(crate) fn classify(provider: &str, status: StatusCode, body: &str) -> ProviderError {
    let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
    let detail = if envelope.error.message.is_empty() {
        body.trim().to_string()
    } else {
        envelope.error.message
    };
    let message = format!("API error ({status}): {detail}");
    let rate_limited = envelope
        .error
        .errors
        .iter()
        .any(|e| e.reason == "rateLimitExceeded" || e.reason == "userRateLimitExceeded");

    let err = match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(message),
        StatusCode::FORBIDDEN if rate_limited => ProviderError::rate_limited(message),
        StatusCode::FORBIDDEN => ProviderError::authorization(message),
        StatusCode::UNAUTHORIZED => ProviderError::authentication(message),
        StatusCode::NOT_FOUND | StatusCode::GONE => ProviderError::not_found(message),
        StatusCode::CONFLICT => ProviderError::conflict(message),
        StatusCode::BAD_REQUEST => ProviderError::bad_request(message),
        s if s.is_server_error() => ProviderError::server(message),
        _ => ProviderError::invalid_response(message),
    };
    err.with_provider(provider)
}

/// Checks the status and decodes a JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: &str,
    response: reqwest::Response,
) -> ProviderResult<T> {
    let body = read_body(provider, response).await?;
    serde_json::from_str(&body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse response: {e}"))
            .with_provider(provider)
    })
}

/// Checks the status and discards the body.
pub(crate) async fn read_empty(provider: &str, response: reqwest::Response) -> ProviderResult<()> {
    read_body(provider, response).await.map(|_| ())
}

async fn read_body(provider: &str, response: reqwest::Response) -> ProviderResult<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(provider, e))?;
    if !status.is_success() {
        return Err(classify(provider, status, &body));
    }
    Ok(body)
}
