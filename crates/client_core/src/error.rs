use serde_json::Value;
use thiserror::Error;

use crate::transport::TransportFailure;

/// Status reported when a request was sent but nothing came back.
pub const NO_RESPONSE_STATUS: u16 = 503;
/// Status reported when a request could not be built or sent.
pub const REQUEST_SETUP_STATUS: u16 = 400;
pub const NO_RESPONSE_MESSAGE: &str = "No response from server";
pub const REQUEST_SETUP_MESSAGE: &str = "Error setting up request";
pub const SERVER_ERROR_FALLBACK: &str = "Server error";

/// Payload keys checked, in order, for a server supplied message.
const SERVER_MESSAGE_KEYS: [&str; 3] = ["message", "detail", "error"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ServerError,
    NoResponse,
    RequestSetupError,
}

/// Every failure the client surfaces, reduced to one shape: message, status, payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizedError {
    #[error("{message}")]
    Server {
        status: u16,
        message: String,
        payload: Option<Value>,
    },
    #[error("{}", NO_RESPONSE_MESSAGE)]
    NoResponse { detail: String },
    #[error("{}", REQUEST_SETUP_MESSAGE)]
    RequestSetup { detail: String },
}

impl NormalizedError {
    pub fn request_setup(detail: impl Into<String>) -> Self {
        Self::RequestSetup {
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Server { .. } => ErrorKind::ServerError,
            Self::NoResponse { .. } => ErrorKind::NoResponse,
            Self::RequestSetup { .. } => ErrorKind::RequestSetupError,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Server { message, .. } => message,
            Self::NoResponse { .. } => NO_RESPONSE_MESSAGE,
            Self::RequestSetup { .. } => REQUEST_SETUP_MESSAGE,
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Server { status, .. } => *status,
            Self::NoResponse { .. } => NO_RESPONSE_STATUS,
            Self::RequestSetup { .. } => REQUEST_SETUP_STATUS,
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Server { payload, .. } => payload.as_ref(),
            Self::NoResponse { .. } | Self::RequestSetup { .. } => None,
        }
    }

    /// Diagnostic text for logs; never shown to the user.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Server { .. } => None,
            Self::NoResponse { detail } | Self::RequestSetup { detail } => Some(detail),
        }
    }

    /// The message the server itself supplied, if it supplied one.
    pub fn server_message(&self) -> Option<&str> {
        self.payload().and_then(server_message_from)
    }
}

impl From<TransportFailure> for NormalizedError {
    fn from(failure: TransportFailure) -> Self {
        normalize(&failure)
    }
}

/// Classifies a transport failure. Pure: the same failure always yields the same error.
pub fn normalize(failure: &TransportFailure) -> NormalizedError {
    match (&failure.response, failure.request_sent) {
        (Some(response), _) => NormalizedError::Server {
            status: response.status,
            message: response
                .payload
                .as_ref()
                .and_then(server_message_from)
                .unwrap_or(SERVER_ERROR_FALLBACK)
                .to_string(),
            payload: response.payload.clone(),
        },
        (None, true) => NormalizedError::NoResponse {
            detail: failure.detail.clone(),
        },
        (None, false) => NormalizedError::RequestSetup {
            detail: failure.detail.clone(),
        },
    }
}

fn server_message_from(payload: &Value) -> Option<&str> {
    SERVER_MESSAGE_KEYS.iter().find_map(|key| {
        payload
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
    })
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
