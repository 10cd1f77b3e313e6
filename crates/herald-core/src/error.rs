// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Herald outreach cascade.

use thiserror::Error;

use crate::types::DeliveryStatus;

/// The primary error type used across all Herald adapter traits and core operations.
#[derive(Debug, Error)]
pub enum HeraldError {
    /// Configuration errors (invalid TOML, invalid campaign definition, missing fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (provider rejected the send, transport failure).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// A referenced entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A lifecycle event is not legal for the record's current state.
    #[error("invalid transition from {from} on {event}")]
    InvalidTransition { from: DeliveryStatus, event: String },

    /// Document (de)serialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HeraldError {
    /// Shorthand for a channel error without an underlying source.
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel {
            message: message.into(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for HeraldError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            source: Box::new(e),
        }
    }
}
