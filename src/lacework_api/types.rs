use serde::{Deserialize, Serialize};
use std::fmt;

/// Lacework integration error type
///
/// Represents every failure an onboarding operation can surface. Non-fatal
/// outcomes (an integration name that matches nothing, or more than one
/// integration) are not errors; see [`crate::AccountLookup`].
#[derive(Debug)]
pub enum LaceworkError {
    /// The secret store holds no string value for this credential identifier
    SecretNotFound(String),
    /// The credential record has never been populated with an access token
    MissingToken(String),
    /// The token endpoint answered with something other than 201
    TokenIssuance { status: u16, body: String },
    /// Creating a CloudAccounts integration did not return 201
    AccountCreation { status: u16, body: String },
    /// Deleting a CloudAccounts integration did not return 204
    AccountDeletion { status: u16, body: String },
    /// Searching CloudAccounts did not return 200
    Search { status: u16, body: String },
    /// Transport or response decoding failure
    Api(ApiError),
    /// Secret store failure
    Storage(crate::storage::StorageError),
    /// Configuration error
    Config(String),
}

impl LaceworkError {
    /// HTTP status carried by the error, if it came from a Lacework response
    pub fn status(&self) -> Option<u16> {
        match self {
            LaceworkError::TokenIssuance { status, .. }
            | LaceworkError::AccountCreation { status, .. }
            | LaceworkError::AccountDeletion { status, .. }
            | LaceworkError::Search { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for LaceworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaceworkError::SecretNotFound(id) => write!(f, "SecretString not found in {}", id),
            LaceworkError::MissingToken(id) => {
                write!(f, "No access token stored in {}", id)
            }
            LaceworkError::TokenIssuance { status, body } => {
                write!(f, "Generate access token failure {} {}", status, body)
            }
            LaceworkError::AccountCreation { status, body } => {
                write!(f, "API response error adding cloud account {} {}", status, body)
            }
            LaceworkError::AccountDeletion { status, body } => {
                write!(f, "API response error deleting cloud account {} {}", status, body)
            }
            LaceworkError::Search { status, body } => {
                write!(f, "API response error searching cloud accounts {} {}", status, body)
            }
            LaceworkError::Api(err) => write!(f, "API error: {}", err),
            LaceworkError::Storage(err) => write!(f, "Storage error: {}", err),
            LaceworkError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for LaceworkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LaceworkError::Api(err) => Some(err),
            LaceworkError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ApiError> for LaceworkError {
    fn from(err: ApiError) -> Self {
        LaceworkError::Api(err)
    }
}

impl From<crate::storage::StorageError> for LaceworkError {
    fn from(err: crate::storage::StorageError) -> Self {
        LaceworkError::Storage(err)
    }
}

impl From<reqwest::Error> for LaceworkError {
    fn from(err: reqwest::Error) -> Self {
        LaceworkError::Api(ApiError::Network(err))
    }
}

/// API-specific errors
#[derive(Debug)]
pub enum ApiError {
    /// Transport failure (connect, TLS, timeout). The reqwest error is kept as-is.
    Network(reqwest::Error),
    /// Failed to parse a successful response
    Parse(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(err) => write!(f, "Network error: {}", err),
            ApiError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Network(err) => Some(err),
            ApiError::Parse(_) => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err)
    }
}

/// Request body for `POST /api/v2/access/tokens`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenRequest {
    pub key_id: String,
    /// Requested validity window in seconds
    pub expiry_time: u64,
}

/// Response from the Lacework token endpoint
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    /// Bearer token, sent verbatim in the `Authorization` header
    pub token: String,
    /// Expiry timestamp (ISO 8601)
    pub expires_at: String,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
