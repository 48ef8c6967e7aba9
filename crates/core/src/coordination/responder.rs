// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock ack responder
//!
//! Every instance runs one. It watches the lock root and writes this
//! instance's ack whenever a lock node appears or disappears, which is the
//! cooperative half of the barrier the lock holder waits on.

use super::node;
use super::registry::LockRegistry;
use crate::clock::Clock;
use crate::error::CoordinationError;
use crate::repository::{ChangeKind, DataChangedEvent, RegistryRepository, WatchStream};
use tokio::task::JoinHandle;

pub struct LockAckResponder<R, C> {
    registry: LockRegistry<R, C>,
}

impl<R: RegistryRepository, C: Clock> LockAckResponder<R, C> {
    pub fn new(registry: LockRegistry<R, C>) -> Self {
        Self { registry }
    }

    /// Subscribe to the lock root and respond on a background task
    pub async fn spawn(self) -> Result<JoinHandle<()>, CoordinationError> {
        let root = node::lock_root_path();
        let events = self
            .registry
            .repository()
            .watch(root)
            .await
            .map_err(|source| CoordinationError::Watch {
                path: root.to_string(),
                source,
            })?;
        Ok(tokio::spawn(self.run(events)))
    }

    /// Respond to events until the stream ends
    pub async fn run(self, mut events: WatchStream) {
        while let Some(event) = events.recv().await {
            self.handle(&event).await;
        }
        tracing::debug!(instance = %self.registry.instance_id(), "lock watch ended");
    }

    /// Ack a single change; returns whether an ack was written
    pub async fn handle(&self, event: &DataChangedEvent) -> bool {
        let Some(lock_name) = node::lock_name_from_path(&event.key) else {
            return false;
        };
        let result = match event.change {
            ChangeKind::Added | ChangeKind::Updated => self.registry.ack_lock(&lock_name).await,
            ChangeKind::Deleted => self.registry.ack_unlock(&lock_name).await,
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(lock = %lock_name, change = ?event.change, error = %e, "ack failed");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "responder_tests.rs"]
mod tests;
