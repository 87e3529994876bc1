// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The error taxonomy shared across the mediator workspace.

use thiserror::Error;

/// The taxonomy kinds carried across the transport (mapped to HTTP status by
/// the daemon) and used internally to decide retry/restart behaviour.
#[derive(Debug, Error)]
pub enum MediatorError {
    /// Transport broken, remote unreachable, socket closed.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// Well-formed protocol, semantically invalid (unknown object, bad
    /// session, type mismatch).
    #[error("request error: {0}")]
    Request(String),

    /// Login/authentication failure.
    #[error("auth error: {0}")]
    Auth(String),

    /// Sync read/write did not complete in time.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Historian modify preconditions violated (Insert on duplicate, Update
    /// on missing).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unexpected condition, logged with its source chain; reported as 500
    /// with an opaque message.
    #[error("internal error: {0}")]
    Internal(String, #[source] Option<Box<dyn std::error::Error + Send + Sync>>),
}

impl MediatorError {
    pub fn internal(message: impl Into<String>) -> Self {
        MediatorError::Internal(message.into(), None)
    }

    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        MediatorError::Internal(message.into(), Some(Box::new(source)))
    }

    /// The HTTP status the daemon's transport layer maps this error to.
    pub fn http_status(&self) -> u16 {
        match self {
            MediatorError::Connectivity(_) => 503,
            MediatorError::Request(_) => 400,
            MediatorError::Auth(_) => 401,
            MediatorError::Timeout(_) => 408,
            MediatorError::Conflict(_) => 409,
            MediatorError::Internal(..) => 500,
        }
    }

    /// The taxonomy kind as a stable lowercase tag for structured JSON error
    /// bodies and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            MediatorError::Connectivity(_) => "connectivity",
            MediatorError::Request(_) => "request",
            MediatorError::Auth(_) => "auth",
            MediatorError::Timeout(_) => "timeout",
            MediatorError::Conflict(_) => "conflict",
            MediatorError::Internal(..) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping_matches_taxonomy() {
        assert_eq!(MediatorError::Connectivity("x".into()).http_status(), 503);
        assert_eq!(MediatorError::Request("x".into()).http_status(), 400);
        assert_eq!(MediatorError::Auth("x".into()).http_status(), 401);
        assert_eq!(MediatorError::Timeout("x".into()).http_status(), 408);
        assert_eq!(MediatorError::Conflict("x".into()).http_status(), 409);
        assert_eq!(MediatorError::internal("x").http_status(), 500);
    }

    #[test]
    fn kind_tags_are_stable() {
        assert_eq!(MediatorError::Auth("x".into()).kind(), "auth");
        assert_eq!(MediatorError::internal("x").kind(), "internal");
    }

    #[test]
    fn internal_with_source_preserves_chain() {
        let io_err = std::io::Error::other("disk full");
        let err = MediatorError::internal_with_source("flush failed", io_err);
        assert!(std::error::Error::source(&err).is_some());
    }
}
