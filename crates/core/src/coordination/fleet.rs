// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet lock: acquire, barrier, release, barrier

use super::registry::LockRegistry;
use crate::clock::Clock;
use crate::repository::RegistryRepository;
use std::future::Future;
use std::time::Duration;

/// Lock that is only considered held once the whole fleet has observed it
#[derive(Clone)]
pub struct FleetLock<R, C> {
    registry: LockRegistry<R, C>,
}

impl<R: RegistryRepository, C: Clock> FleetLock<R, C> {
    pub fn new(registry: LockRegistry<R, C>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &LockRegistry<R, C> {
        &self.registry
    }

    /// Take the store lock and wait for every instance to ack it.
    ///
    /// A failed barrier has already released the lock.
    pub async fn try_lock(&self, lock_name: &str, timeout: Duration) -> bool {
        if !self.registry.try_lock(lock_name, timeout).await {
            return false;
        }
        self.registry.check_lock_ack(lock_name).await
    }

    /// [`try_lock`](Self::try_lock) with the configured default timeout
    pub async fn try_lock_default(&self, lock_name: &str) -> bool {
        self.try_lock(lock_name, self.registry.config().lock_timeout)
            .await
    }

    /// Release the store lock, wait for every instance to ack the unlock, and
    /// clear this instance's ack record. Returns the unlock barrier outcome.
    pub async fn release_lock(&self, lock_name: &str) -> bool {
        if let Err(e) = self.registry.release_lock(lock_name).await {
            tracing::warn!(lock = lock_name, error = %e, "release failed");
            return false;
        }
        let unlocked = self.registry.check_unlock_ack(lock_name).await;
        if !unlocked {
            tracing::warn!(lock = lock_name, "unlock ack barrier failed");
        }
        if let Err(e) = self.registry.delete_lock_ack(lock_name).await {
            tracing::warn!(lock = lock_name, error = %e, "failed to clear ack");
        }
        unlocked
    }

    /// Run `work` while holding the fleet lock.
    ///
    /// Returns `None` without running `work` if the lock could not be
    /// established.
    pub async fn run_exclusive<F, T>(&self, lock_name: &str, timeout: Duration, work: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        if !self.try_lock(lock_name, timeout).await {
            tracing::info!(lock = lock_name, "fleet lock not established, skipping");
            return None;
        }
        let output = work.await;
        self.release_lock(lock_name).await;
        Some(output)
    }
}

#[cfg(test)]
#[path = "fleet_tests.rs"]
mod tests;
