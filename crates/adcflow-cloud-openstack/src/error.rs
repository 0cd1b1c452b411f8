//! OpenStack client error types

use adcflow_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpenStackError {
    #[error("Identity service rejected the credentials: {0}")]
    AuthenticationFailed(String),

    #[error("No token returned by the identity service")]
    MissingToken,

    #[error("Service catalog has no usable endpoint for '{0}'")]
    MissingEndpoint(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<OpenStackError> for CloudError {
    fn from(err: OpenStackError) -> Self {
        match err {
            OpenStackError::AuthenticationFailed(msg) => CloudError::AuthenticationFailed(msg),
            OpenStackError::MissingToken => {
                CloudError::AuthenticationFailed("no token in identity response".to_string())
            }
            OpenStackError::MissingEndpoint(service) => {
                CloudError::InvalidResponse(format!("no endpoint for service '{service}'"))
            }
            OpenStackError::Http(e) => CloudError::ApiError(e.to_string()),
            OpenStackError::Json(e) => CloudError::Json(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, OpenStackError>;
