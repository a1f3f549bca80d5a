//! Uniform response envelope returned by every service operation
//!
//! Failures never escape as Rust errors past this point: each one becomes an
//! envelope with `success: false`, an HTTP-style status code, and a message.
//! Internal failures are logged here and reported without detail.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{Error, Result};

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_CONFLICT: u16 = 409;
pub const STATUS_UNPROCESSABLE: u16 = 422;
pub const STATUS_INTERNAL: u16 = 500;

/// Message shown for internal failures
pub const INTERNAL_MESSAGE: &str = "An unexpected error occurred";

/// Either the payload or a human-readable message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload<T> {
    Data(T),
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: bool,
    pub status_code: u16,
    pub data: Payload<T>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self::with_status(STATUS_OK, data)
    }

    pub fn created(data: T) -> Self {
        Self::with_status(STATUS_CREATED, data)
    }

    pub fn with_status(status_code: u16, data: T) -> Self {
        Self {
            success: true,
            status_code,
            data: Payload::Data(data),
        }
    }

    pub fn failure(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            success: false,
            status_code,
            data: Payload::Message(message.into()),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::failure(STATUS_BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::failure(STATUS_NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::failure(STATUS_CONFLICT, message)
    }

    /// Translate a library error. Internal errors are logged and masked.
    pub fn from_error(err: Error) -> Self {
        match err {
            Error::Validation(messages) => Self::bad_request(messages.join("; ")),
            Error::Parse(msg) => Self::failure(STATUS_UNPROCESSABLE, msg),
            Error::Conflict(msg) => Self::conflict(msg),
            Error::NotFound(msg) => Self::not_found(format!("Not found: {}", msg)),
            other => {
                error!(error = %other, "Internal error");
                Self::failure(STATUS_INTERNAL, INTERNAL_MESSAGE)
            }
        }
    }

    /// Wrap a result, using `status_code` on success
    pub fn from_result(result: Result<T>, status_code: u16) -> Self {
        match result {
            Ok(data) => Self::with_status(status_code, data),
            Err(err) => Self::from_error(err),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// The payload, if this is a success
    pub fn data(&self) -> Option<&T> {
        match &self.data {
            Payload::Data(d) if self.success => Some(d),
            _ => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self.data {
            Payload::Data(d) if self.success => Some(d),
            _ => None,
        }
    }

    /// The failure message, if this is a failure
    pub fn message(&self) -> Option<&str> {
        match &self.data {
            Payload::Message(m) if !self.success => Some(m),
            _ => None,
        }
    }
}

impl<T> From<Result<T>> for Envelope<T> {
    fn from(result: Result<T>) -> Self {
        Self::from_result(result, STATUS_OK)
    }
}
