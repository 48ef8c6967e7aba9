// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the lock coordinator

use crate::repository::RepositoryError;
use thiserror::Error;

/// Errors surfaced by coordinator operations
///
/// Barrier and acquisition outcomes are booleans, not errors; these cover
/// store failures the caller has to see.
#[derive(Debug, Error)]
pub enum CoordinationError {
    /// Lock and ack roots could not be established; the coordinator is unusable
    #[error("coordination store unavailable: {0}")]
    CoordinationUnavailable(#[source] RepositoryError),
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
    #[error("failed to watch {path}: {source}")]
    Watch {
        path: String,
        #[source]
        source: RepositoryError,
    },
}
