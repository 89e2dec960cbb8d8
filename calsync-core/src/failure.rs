//! Translation of transport failures into domain failures.
//!
//! Remote sources report what went wrong on the wire as a [`TransportFailure`]. Callers never
//! see those directly: [`translate`] folds every one of them into exactly one [`DomainFailure`],
//! which is what decides whether a user can retry or has to sign in again.

use thiserror::Error;

pub const STATUS_CODE_OK: u16 = 200;
pub const STATUS_CODE_DELETE_SUCCESS: u16 = 204;
/// Server-specific "no authorization" sentinel. Not a standard HTTP status; matched literally.
pub const STATUS_CODE_NO_AUTHORIZATION: u16 = 418;

/// A failed remote call, as observed by the transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    #[error("Server responded with status {code}{}", message_suffix(.message))]
    Status { code: u16, message: Option<String> },

    #[error("Response body was empty")]
    MissingBody,

    #[error("Access token expired")]
    AccessTokenExpired,

    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Could not decode response: {0}")]
    Decode(String),
}

fn message_suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl TransportFailure {
    pub fn status(code: u16) -> Self {
        TransportFailure::Status {
            code,
            message: None,
        }
    }
}

pub type TransportResult<T> = Result<T, TransportFailure>;

/// Domain-level outcome of a failed remote call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainFailure {
    /// The server reported success but sent no usable payload.
    #[error("No data returned")]
    NoData,

    /// The access token lapsed; a silent refresh is expected to fix it.
    #[error("Access token expired")]
    AccessTokenExpired,

    /// The refresh token lapsed; the user has to sign in again.
    #[error("Refresh token expired, sign in again")]
    RefreshTokenExpired,

    #[error(transparent)]
    Unclassified(TransportFailure),
}

impl DomainFailure {
    pub fn requires_reauth(&self) -> bool {
        matches!(self, DomainFailure::RefreshTokenExpired)
    }

    pub fn is_retryable(&self) -> bool {
        !self.requires_reauth()
    }
}

/// Map a transport failure to the domain failure callers act on.
pub fn translate(failure: TransportFailure) -> DomainFailure {
    match failure {
        TransportFailure::Status {
            code: STATUS_CODE_NO_AUTHORIZATION,
            ..
        } => DomainFailure::RefreshTokenExpired,
        TransportFailure::MissingBody => DomainFailure::NoData,
        TransportFailure::AccessTokenExpired => DomainFailure::AccessTokenExpired,
        other => DomainFailure::Unclassified(other),
    }
}

impl From<TransportFailure> for DomainFailure {
    fn from(failure: TransportFailure) -> Self {
        translate(failure)
    }
}
