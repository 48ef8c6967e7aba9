// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock registry: fleet-wide exclusive locks with an ack barrier
//!
//! Acquiring the store lock only proves that no other instance holds it.
//! Each live instance also writes an ack record once it has observed the
//! transition, and the holder polls those records until every instance in
//! the membership snapshot agrees.
//!
//! The barrier is best-effort: an ack is a last-known state, and an instance
//! that never acks is indistinguishable from a slow one until the attempt
//! budget runs out.

use super::ack::LockAck;
use super::cancel::CancelToken;
use super::instance::{InstanceDirectory, InstanceId};
use super::node;
use crate::clock::Clock;
use crate::config::LockConfig;
use crate::error::CoordinationError;
use crate::repository::{RegistryRepository, RepositoryError};
use std::time::Duration;

/// How a barrier wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// Every snapshotted instance agreed on the given attempt (1-based)
    Acked { attempt: u32 },
    /// Attempt budget used up without full agreement
    Exhausted,
    /// The wait was cancelled before agreement
    Cancelled,
    /// The membership snapshot could not be read
    MembershipUnavailable,
}

impl AckOutcome {
    pub fn is_acked(&self) -> bool {
        matches!(self, AckOutcome::Acked { .. })
    }
}

/// Per-instance lock coordinator
#[derive(Clone)]
pub struct LockRegistry<R, C> {
    repository: R,
    directory: InstanceDirectory<R>,
    instance_id: InstanceId,
    config: LockConfig,
    clock: C,
}

impl<R: RegistryRepository, C: Clock> LockRegistry<R, C> {
    /// Create a coordinator for `instance_id`, ensuring the lock and ack
    /// roots exist. Safe to run concurrently from many instances.
    pub async fn new(
        repository: R,
        instance_id: InstanceId,
        config: LockConfig,
        clock: C,
    ) -> Result<Self, CoordinationError> {
        for root in [node::lock_root_path(), node::ack_root_path()] {
            repository
                .persist(root, "")
                .await
                .map_err(CoordinationError::CoordinationUnavailable)?;
        }
        tracing::debug!(instance = %instance_id, "lock roots ready");

        Ok(Self {
            directory: InstanceDirectory::new(repository.clone()),
            repository,
            instance_id,
            config,
            clock,
        })
    }

    pub fn instance_id(&self) -> &InstanceId {
        &self.instance_id
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Live instances according to the membership subtree
    pub async fn load_all_instances(&self) -> Result<Vec<InstanceId>, RepositoryError> {
        self.directory.load_all_instances().await
    }

    /// Single attempt to take the exclusive lock, bounded by `timeout`
    pub async fn try_lock(&self, lock_name: &str, timeout: Duration) -> bool {
        match self
            .repository
            .try_lock(&node::lock_path(lock_name), timeout)
            .await
        {
            Ok(acquired) => {
                tracing::info!(
                    lock = lock_name,
                    instance = %self.instance_id,
                    acquired,
                    "try lock"
                );
                acquired
            }
            Err(e) => {
                tracing::warn!(lock = lock_name, error = %e, "try lock failed");
                false
            }
        }
    }

    /// Release the exclusive lock; a no-op if this instance does not hold it
    pub async fn release_lock(&self, lock_name: &str) -> Result<(), CoordinationError> {
        self.repository
            .release_lock(&node::lock_path(lock_name))
            .await?;
        tracing::info!(lock = lock_name, instance = %self.instance_id, "lock released");
        Ok(())
    }

    /// Record that this instance observed `lock_name` being locked
    pub async fn ack_lock(&self, lock_name: &str) -> Result<(), CoordinationError> {
        self.write_ack(lock_name, LockAck::Locked).await
    }

    /// Record that this instance observed `lock_name` being unlocked
    pub async fn ack_unlock(&self, lock_name: &str) -> Result<(), CoordinationError> {
        self.write_ack(lock_name, LockAck::Unlocked).await
    }

    /// Remove this instance's ack record for `lock_name`
    pub async fn delete_lock_ack(&self, lock_name: &str) -> Result<(), CoordinationError> {
        self.repository.delete(&self.own_ack_path(lock_name)).await?;
        tracing::debug!(lock = lock_name, instance = %self.instance_id, "ack deleted");
        Ok(())
    }

    /// Stored ack value of `instance` for `lock_name`; empty if absent
    pub async fn load_lock_ack(
        &self,
        instance: &InstanceId,
        lock_name: &str,
    ) -> Result<String, RepositoryError> {
        let path = node::ack_path(&node::ack_key(instance.as_str(), lock_name));
        let value = self.repository.get(&path).await?.unwrap_or_default();
        tracing::trace!(lock = lock_name, instance = %instance, value = %value, "ack read");
        Ok(value)
    }

    /// Wait until every live instance acks LOCKED.
    ///
    /// On failure the lock is released before returning false, so callers
    /// must not treat it as still held.
    pub async fn check_lock_ack(&self, lock_name: &str) -> bool {
        self.finish_lock_check(lock_name, None).await
    }

    /// [`check_lock_ack`](Self::check_lock_ack) that stops early when
    /// `cancel` fires; cancellation also rolls the lock back.
    pub async fn check_lock_ack_until(&self, lock_name: &str, cancel: &CancelToken) -> bool {
        self.finish_lock_check(lock_name, Some(cancel)).await
    }

    /// Wait until every live instance acks UNLOCKED. Never touches the lock.
    pub async fn check_unlock_ack(&self, lock_name: &str) -> bool {
        self.await_ack(lock_name, LockAck::Unlocked, None)
            .await
            .is_acked()
    }

    /// [`check_unlock_ack`](Self::check_unlock_ack) that stops early when
    /// `cancel` fires
    pub async fn check_unlock_ack_until(&self, lock_name: &str, cancel: &CancelToken) -> bool {
        self.await_ack(lock_name, LockAck::Unlocked, Some(cancel))
            .await
            .is_acked()
    }

    /// Poll ack records of a single membership snapshot until all of them
    /// equal `expected`, the attempt budget runs out, or `cancel` fires.
    ///
    /// The clock pauses only between attempts: `n` attempts wait at most `n - 1`
    /// intervals, so the default budget gives up after 4s rather than 5s.
    pub async fn await_ack(
        &self,
        lock_name: &str,
        expected: LockAck,
        cancel: Option<&CancelToken>,
    ) -> AckOutcome {
        let instances = match self.directory.load_all_instances().await {
            Ok(instances) => instances,
            Err(e) => {
                tracing::warn!(lock = lock_name, error = %e, "membership snapshot failed");
                return AckOutcome::MembershipUnavailable;
            }
        };

        let attempts = self.config.ack_check_attempts;
        for attempt in 1..=attempts {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return AckOutcome::Cancelled;
            }
            if self.all_acked(&instances, lock_name, expected).await {
                tracing::debug!(
                    lock = lock_name,
                    %expected,
                    attempt,
                    instances = instances.len(),
                    "ack barrier reached"
                );
                return AckOutcome::Acked { attempt };
            }
            tracing::debug!(lock = lock_name, %expected, attempt, "waiting for acks");

            if attempt == attempts {
                break;
            }
            let pause = self.clock.sleep(self.config.ack_check_interval);
            match cancel {
                Some(token) => {
                    tokio::select! {
                        _ = pause => {}
                        _ = token.cancelled() => return AckOutcome::Cancelled,
                    }
                }
                None => pause.await,
            }
        }
        AckOutcome::Exhausted
    }

    async fn finish_lock_check(&self, lock_name: &str, cancel: Option<&CancelToken>) -> bool {
        let outcome = self.await_ack(lock_name, LockAck::Locked, cancel).await;
        if outcome.is_acked() {
            return true;
        }

        tracing::warn!(lock = lock_name, ?outcome, "lock ack barrier failed, releasing");
        if let Err(e) = self.release_lock(lock_name).await {
            tracing::error!(lock = lock_name, error = %e, "rollback release failed");
        }
        false
    }

    async fn all_acked(&self, instances: &[InstanceId], lock_name: &str, expected: LockAck) -> bool {
        for instance in instances {
            match self.load_lock_ack(instance, lock_name).await {
                Ok(value) if expected.matches(&value) => {}
                Ok(_) => return false,
                Err(e) => {
                    // Transport failure counts as "not yet acked" for this attempt
                    tracing::warn!(lock = lock_name, instance = %instance, error = %e, "ack read failed");
                    return false;
                }
            }
        }
        true
    }

    async fn write_ack(&self, lock_name: &str, ack: LockAck) -> Result<(), CoordinationError> {
        self.repository
            .persist_ephemeral(&self.own_ack_path(lock_name), ack.as_str())
            .await?;
        tracing::debug!(lock = lock_name, instance = %self.instance_id, %ack, "ack written");
        Ok(())
    }

    fn own_ack_path(&self, lock_name: &str) -> String {
        node::ack_path(&node::ack_key(self.instance_id.as_str(), lock_name))
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
