// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the WhatsApp MCP bridge.

use strum::Display;
use thiserror::Error;

/// Message used whenever an operation is attempted before the session is ready.
pub const NOT_READY_MESSAGE: &str = "WhatsApp client not ready. Please try again later.";

/// Coarse classification of a [`WaError`].
///
/// The REST router maps each kind to one HTTP status code, and the protocol
/// bindings map it to a protocol error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// Session not yet authenticated or connected. Retryable.
    NotReady,
    /// Missing or malformed caller-supplied data.
    InvalidInput,
    /// Referenced number, group or message does not exist.
    NotFound,
    /// The backend lacks the requested capability.
    NotSupported,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// Classify an untyped error message by substring.
    ///
    /// Only used where text arrives without a type: driver error strings and
    /// remote error bodies. Typed errors never go through here.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("not ready") {
            ErrorKind::NotReady
        } else if lower.contains("not registered")
            || lower.contains("not found")
            || lower.contains("not a group chat")
            || lower.contains("does not contain media")
        {
            ErrorKind::NotFound
        } else if lower.contains("not supported") {
            ErrorKind::NotSupported
        } else if lower.contains("invalid") || lower.contains("required") {
            ErrorKind::InvalidInput
        } else {
            ErrorKind::Internal
        }
    }

    /// Map an HTTP status code returned by a remote deployment to a kind.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => ErrorKind::InvalidInput,
            404 => ErrorKind::NotFound,
            501 => ErrorKind::NotSupported,
            503 => ErrorKind::NotReady,
            _ => ErrorKind::Internal,
        }
    }
}

/// The error type used across both service backends and the session bridge.
#[derive(Debug, Error)]
pub enum WaError {
    /// The session is not in the ready state.
    #[error("{0}")]
    NotReady(String),

    /// Caller-supplied data is missing or malformed.
    #[error("{0}")]
    InvalidInput(String),

    /// A referenced entity does not exist on the backend.
    #[error("{0}")]
    NotFound(String),

    /// The backend does not offer this capability.
    #[error("{0}")]
    NotSupported(String),

    /// Backend exception, network failure, filesystem error.
    #[error("{message}")]
    Internal {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An operation-level wrapper that keeps the inner message as a suffix.
    #[error("{operation}: {source}")]
    Operation {
        operation: String,
        #[source]
        source: Box<WaError>,
    },
}

impl WaError {
    /// The uniform not-ready error raised before any backend call.
    pub fn not_ready() -> Self {
        WaError::NotReady(NOT_READY_MESSAGE.to_string())
    }

    /// Build an internal error without an underlying cause.
    pub fn internal(message: impl Into<String>) -> Self {
        WaError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Build an internal error that keeps its underlying cause.
    pub fn internal_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        WaError::Internal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build an error of the given kind from a plain message.
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::NotReady => WaError::NotReady(message),
            ErrorKind::InvalidInput => WaError::InvalidInput(message),
            ErrorKind::NotFound => WaError::NotFound(message),
            ErrorKind::NotSupported => WaError::NotSupported(message),
            ErrorKind::Internal => WaError::internal(message),
        }
    }

    /// Build an error from an untyped backend message, classifying it by text.
    pub fn from_backend_message(message: impl Into<String>) -> Self {
        let message = message.into();
        WaError::from_kind(ErrorKind::classify(&message), message)
    }

    /// Rewrap this error with an operation prefix, preserving its message and kind.
    pub fn context(self, operation: impl Into<String>) -> Self {
        WaError::Operation {
            operation: operation.into(),
            source: Box::new(self),
        }
    }

    /// The classification of the innermost error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WaError::NotReady(_) => ErrorKind::NotReady,
            WaError::InvalidInput(_) => ErrorKind::InvalidInput,
            WaError::NotFound(_) => ErrorKind::NotFound,
            WaError::NotSupported(_) => ErrorKind::NotSupported,
            WaError::Internal { .. } => ErrorKind::Internal,
            WaError::Operation { source, .. } => source.kind(),
        }
    }

    /// The outermost operation label, if this error was rewrapped.
    pub fn operation(&self) -> Option<&str> {
        match self {
            WaError::Operation { operation, .. } => Some(operation),
            _ => None,
        }
    }
}

/// Extension for attaching an operation label to a `Result`.
pub trait ResultExt<T> {
    /// Rewrap the error, if any, with `operation` as prefix.
    fn context(self, operation: &str) -> Result<T, WaError>;
}

impl<T> ResultExt<T> for Result<T, WaError> {
    fn context(self, operation: &str) -> Result<T, WaError> {
        self.map_err(|e| e.context(operation))
    }
}
