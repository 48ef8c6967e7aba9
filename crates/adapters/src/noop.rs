// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op repository for standalone deployments.

use async_trait::async_trait;
use gov_core::repository::{RegistryRepository, RepositoryError, WatchStream};
use std::time::Duration;

/// Repository that stores nothing.
///
/// Used when the proxy runs without a coordination store. Every lock is
/// granted and no instances are ever listed, so ack barriers pass at once.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpRepository;

impl NoOpRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RegistryRepository for NoOpRepository {
    async fn persist(&self, _key: &str, _value: &str) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn persist_ephemeral(&self, _key: &str, _value: &str) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, RepositoryError> {
        Ok(None)
    }

    async fn delete(&self, _key: &str) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn get_children_keys(&self, _key: &str) -> Result<Vec<String>, RepositoryError> {
        Ok(Vec::new())
    }

    async fn try_lock(&self, _key: &str, _timeout: Duration) -> Result<bool, RepositoryError> {
        Ok(true)
    }

    async fn release_lock(&self, _key: &str) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn watch(&self, _prefix: &str) -> Result<WatchStream, RepositoryError> {
        // Sender dropped immediately: the stream is already closed
        let (_, stream) = tokio::sync::mpsc::unbounded_channel();
        Ok(stream)
    }
}
