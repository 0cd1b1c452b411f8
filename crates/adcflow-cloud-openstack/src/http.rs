//! Shared response handling for the Neutron and Nova clients.

use adcflow_cloud::{CloudError, Result};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

/// Map a transport-level failure into the shared error type.
pub(crate) fn transport(err: reqwest::Error) -> CloudError {
    CloudError::ApiError(err.to_string())
}

/// Map a non-success status into the shared error type.
async fn status_error(response: Response, what: &str) -> CloudError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => CloudError::NotFound(what.to_string()),
        StatusCode::CONFLICT => CloudError::AlreadyExists(what.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            CloudError::AuthenticationFailed(format!("{what}: HTTP {status}"))
        }
        _ => CloudError::ApiError(format!("{what}: HTTP {status}: {body}")),
    }
}

/// Expect a JSON body of type `T`.
pub(crate) async fn expect_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    if !response.status().is_success() {
        return Err(status_error(response, what).await);
    }
    response.json::<T>().await.map_err(transport)
}

/// Expect a success status, discarding any body.
pub(crate) async fn expect_ok(response: Response, what: &str) -> Result<()> {
    if !response.status().is_success() {
        return Err(status_error(response, what).await);
    }
    Ok(())
}
