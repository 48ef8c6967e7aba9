// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced repository wrapper for consistent observability

use async_trait::async_trait;
use gov_core::repository::{RegistryRepository, RepositoryError, WatchStream};
use std::time::Duration;
use tracing::Instrument;

/// Wrapper that adds tracing to any RegistryRepository
#[derive(Clone)]
pub struct TracedRepository<R> {
    inner: R,
}

impl<R> TracedRepository<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

fn log_write(result: &Result<(), RepositoryError>, elapsed: Duration) {
    match result {
        Ok(()) => tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "written"),
        Err(e) => tracing::error!(
            elapsed_ms = elapsed.as_millis() as u64,
            error = %e,
            "write failed"
        ),
    }
}

#[async_trait]
impl<R: RegistryRepository> RegistryRepository for TracedRepository<R> {
    async fn persist(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        let span = tracing::info_span!("registry.persist", key);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.persist(key, value).await;
            log_write(&result, start.elapsed());
            result
        }
        .instrument(span)
        .await
    }

    async fn persist_ephemeral(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        let span = tracing::info_span!("registry.persist_ephemeral", key);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.persist_ephemeral(key, value).await;
            log_write(&result, start.elapsed());
            result
        }
        .instrument(span)
        .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let result = self.inner.get(key).await;
        match &result {
            Ok(value) => tracing::trace!(key, found = value.is_some(), "read"),
            Err(e) => tracing::warn!(key, error = %e, "read failed"),
        }
        result
    }

    async fn delete(&self, key: &str) -> Result<(), RepositoryError> {
        let span = tracing::info_span!("registry.delete", key);
        async {
            let result = self.inner.delete(key).await;
            match &result {
                Ok(()) => tracing::debug!("deleted"),
                Err(e) => tracing::warn!(error = %e, "delete failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn get_children_keys(&self, key: &str) -> Result<Vec<String>, RepositoryError> {
        let result = self.inner.get_children_keys(key).await;
        match &result {
            Ok(children) => tracing::trace!(key, count = children.len(), "listed children"),
            Err(e) => tracing::warn!(key, error = %e, "list children failed"),
        }
        result
    }

    async fn try_lock(&self, key: &str, timeout: Duration) -> Result<bool, RepositoryError> {
        let span = tracing::info_span!(
            "registry.try_lock",
            key,
            timeout_ms = timeout.as_millis() as u64
        );
        async {
            let start = std::time::Instant::now();
            let result = self.inner.try_lock(key, timeout).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(true) => tracing::info!(elapsed_ms, "lock acquired"),
                Ok(false) => tracing::info!(elapsed_ms, "lock busy"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "try lock failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn release_lock(&self, key: &str) -> Result<(), RepositoryError> {
        let span = tracing::info_span!("registry.release_lock", key);
        async {
            let result = self.inner.release_lock(key).await;
            match &result {
                Ok(()) => tracing::info!("lock released"),
                Err(e) => tracing::error!(error = %e, "release failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn watch(&self, prefix: &str) -> Result<WatchStream, RepositoryError> {
        let result = self.inner.watch(prefix).await;
        match &result {
            Ok(_) => tracing::info!(prefix, "watching"),
            Err(e) => tracing::error!(prefix, error = %e, "watch failed"),
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
