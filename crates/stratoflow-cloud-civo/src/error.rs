//! Civo provider error types

use stratoflow_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CivoError {
    #[error("No Civo API token configured (set CIVO_TOKEN or add a credentials profile)")]
    MissingToken,

    #[error("Civo API rejected the token: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Civo API error {status} ({code}): {reason}")]
    Api {
        status: u16,
        code: String,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CivoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CivoError::NotFound(_))
    }

    /// The object cannot be deleted yet because something still uses it
    pub fn is_in_use(&self) -> bool {
        match self {
            CivoError::Api { code, reason, .. } => {
                code.contains("inuse")
                    || code.contains("in_use")
                    || reason.to_lowercase().contains("in use")
            }
            _ => false,
        }
    }
}

impl From<CivoError> for CloudError {
    fn from(err: CivoError) -> Self {
        match err {
            CivoError::NotFound(what) => CloudError::ResourceNotFound(what),
            CivoError::MissingToken => {
                CloudError::AuthenticationFailed(CivoError::MissingToken.to_string())
            }
            CivoError::Unauthorized(reason) => CloudError::AuthenticationFailed(reason),
            CivoError::InvalidConfig(message) => CloudError::InvalidConfig(message),
            CivoError::Json(e) => CloudError::Json(e),
            other => CloudError::ApiError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CivoError>;
