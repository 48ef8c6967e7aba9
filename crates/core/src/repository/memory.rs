// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process coordination store
//!
//! A [`MemoryRegistry`] is the shared namespace; each participant talks to it
//! through its own [`MemorySession`], which owns ephemeral nodes and locks
//! the same way a ZooKeeper session does. Closing a session simulates a
//! crashed instance.

use super::{ChangeKind, DataChangedEvent, RegistryRepository, RepositoryError, WatchStream};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, Notify};

const EVENT_CAPACITY: usize = 1024;

/// Recorded call to a memory session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryCall {
    Persist { key: String, value: String },
    PersistEphemeral { key: String, value: String },
    Get { key: String },
    Delete { key: String },
    GetChildrenKeys { key: String },
    TryLock { key: String, timeout: Duration },
    ReleaseLock { key: String },
    Watch { prefix: String },
}

#[derive(Debug)]
struct Node {
    value: String,
    /// Owning session for ephemeral nodes
    owner: Option<u64>,
}

#[derive(Default)]
struct RegistryState {
    nodes: BTreeMap<String, Node>,
    /// Lock path -> holding session
    locks: HashMap<String, u64>,
    closed: HashSet<u64>,
    next_session: u64,
    unavailable: bool,
}

impl RegistryState {
    fn upsert(&mut self, key: &str, value: &str, owner: Option<u64>) -> DataChangedEvent {
        let previous = self.nodes.insert(
            key.to_string(),
            Node {
                value: value.to_string(),
                owner,
            },
        );
        DataChangedEvent {
            key: key.to_string(),
            value: value.to_string(),
            change: if previous.is_some() {
                ChangeKind::Updated
            } else {
                ChangeKind::Added
            },
        }
    }

    fn remove(&mut self, key: &str) -> Option<DataChangedEvent> {
        self.nodes.remove(key).map(|_| DataChangedEvent {
            key: key.to_string(),
            value: String::new(),
            change: ChangeKind::Deleted,
        })
    }
}

/// Shared in-memory namespace
#[derive(Clone)]
pub struct MemoryRegistry {
    state: Arc<Mutex<RegistryState>>,
    lock_released: Arc<Notify>,
    events: broadcast::Sender<DataChangedEvent>,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(RegistryState::default())),
            lock_released: Arc::new(Notify::new()),
            events,
        }
    }

    /// Open a new session against this registry
    pub fn connect(&self) -> MemorySession {
        let id = {
            let mut state = self.lock_state();
            state.next_session += 1;
            state.next_session
        };
        MemorySession {
            registry: self.clone(),
            id,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Simulate a store outage; every session call fails while unavailable
    pub fn set_available(&self, available: bool) {
        self.lock_state().unavailable = !available;
    }

    /// Current value of a node, bypassing sessions
    pub fn node(&self, key: &str) -> Option<String> {
        self.lock_state().nodes.get(key).map(|n| n.value.clone())
    }

    /// Whether the node exists and is bound to a session
    pub fn is_ephemeral(&self, key: &str) -> bool {
        self.lock_state()
            .nodes
            .get(key)
            .is_some_and(|n| n.owner.is_some())
    }

    /// Session currently holding the lock on `key`
    pub fn lock_holder(&self, key: &str) -> Option<u64> {
        self.lock_state().locks.get(key).copied()
    }

    /// Number of nodes whose path starts with `prefix`
    pub fn count_under(&self, prefix: &str) -> usize {
        self.lock_state()
            .nodes
            .keys()
            .filter(|k| k.starts_with(prefix))
            .count()
    }

    fn lock_state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, events: impl IntoIterator<Item = DataChangedEvent>) {
        for event in events {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }
}

/// One participant's connection to a [`MemoryRegistry`]
#[derive(Clone)]
pub struct MemorySession {
    registry: MemoryRegistry,
    id: u64,
    calls: Arc<Mutex<Vec<RepositoryCall>>>,
}

impl MemorySession {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn registry(&self) -> &MemoryRegistry {
        &self.registry
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<RepositoryCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Clear recorded calls
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Close the session: drop its ephemeral nodes and release its locks
    pub fn close(&self) {
        let events: Vec<DataChangedEvent> = {
            let mut state = self.registry.lock_state();
            if !state.closed.insert(self.id) {
                return;
            }
            let owned: Vec<String> = state
                .nodes
                .iter()
                .filter(|(_, node)| node.owner == Some(self.id))
                .map(|(key, _)| key.clone())
                .collect();
            state.locks.retain(|_, holder| *holder != self.id);
            owned.iter().filter_map(|key| state.remove(key)).collect()
        };
        tracing::debug!(session = self.id, removed = events.len(), "session closed");
        self.registry.emit(events);
        self.registry.lock_released.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.registry.lock_state().closed.contains(&self.id)
    }

    fn record(&self, call: RepositoryCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    fn check(&self, state: &RegistryState) -> Result<(), RepositoryError> {
        if state.unavailable {
            return Err(RepositoryError::Unavailable(
                "memory registry offline".to_string(),
            ));
        }
        if state.closed.contains(&self.id) {
            return Err(RepositoryError::SessionClosed(format!("session {}", self.id)));
        }
        Ok(())
    }

    fn upsert(&self, key: &str, value: &str, owner: Option<u64>) -> Result<(), RepositoryError> {
        let event = {
            let mut state = self.registry.lock_state();
            self.check(&state)?;
            state.upsert(key, value, owner)
        };
        self.registry.emit([event]);
        Ok(())
    }
}

#[async_trait]
impl RegistryRepository for MemorySession {
    async fn persist(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        self.record(RepositoryCall::Persist {
            key: key.to_string(),
            value: value.to_string(),
        });
        self.upsert(key, value, None)
    }

    async fn persist_ephemeral(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        self.record(RepositoryCall::PersistEphemeral {
            key: key.to_string(),
            value: value.to_string(),
        });
        self.upsert(key, value, Some(self.id))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        self.record(RepositoryCall::Get {
            key: key.to_string(),
        });
        let state = self.registry.lock_state();
        self.check(&state)?;
        Ok(state.nodes.get(key).map(|n| n.value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<(), RepositoryError> {
        self.record(RepositoryCall::Delete {
            key: key.to_string(),
        });
        let event = {
            let mut state = self.registry.lock_state();
            self.check(&state)?;
            state.remove(key)
        };
        self.registry.emit(event);
        Ok(())
    }

    async fn get_children_keys(&self, key: &str) -> Result<Vec<String>, RepositoryError> {
        self.record(RepositoryCall::GetChildrenKeys {
            key: key.to_string(),
        });
        let state = self.registry.lock_state();
        self.check(&state)?;

        let prefix = format!("{}/", key.trim_end_matches('/'));
        let children: BTreeSet<String> = state
            .nodes
            .range(prefix.clone()..)
            .map(|(path, _)| path)
            .take_while(|path| path.starts_with(&prefix))
            .filter_map(|path| path[prefix.len()..].split('/').next())
            .filter(|child| !child.is_empty())
            .map(str::to_string)
            .collect();
        Ok(children.into_iter().collect())
    }

    async fn try_lock(&self, key: &str, timeout: Duration) -> Result<bool, RepositoryError> {
        self.record(RepositoryCall::TryLock {
            key: key.to_string(),
            timeout,
        });
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            // Register for release notifications before inspecting state so
            // a release between the check and the wait is not missed.
            let released = self.registry.lock_released.notified();
            tokio::pin!(released);
            released.as_mut().enable();

            {
                let mut state = self.registry.lock_state();
                self.check(&state)?;
                match state.locks.get(key).copied() {
                    Some(holder) if holder == self.id => return Ok(true),
                    Some(_) => {}
                    None => {
                        state.locks.insert(key.to_string(), self.id);
                        let event = state.upsert(key, &self.id.to_string(), Some(self.id));
                        drop(state);
                        self.registry.emit([event]);
                        return Ok(true);
                    }
                }
            }

            if tokio::time::timeout_at(deadline, released).await.is_err() {
                return Ok(false);
            }
        }
    }

    async fn release_lock(&self, key: &str) -> Result<(), RepositoryError> {
        self.record(RepositoryCall::ReleaseLock {
            key: key.to_string(),
        });
        let event = {
            let mut state = self.registry.lock_state();
            self.check(&state)?;
            if state.locks.get(key) != Some(&self.id) {
                return Ok(());
            }
            state.locks.remove(key);
            state.remove(key)
        };
        self.registry.emit(event);
        self.registry.lock_released.notify_waiters();
        Ok(())
    }

    async fn watch(&self, prefix: &str) -> Result<WatchStream, RepositoryError> {
        self.record(RepositoryCall::Watch {
            prefix: prefix.to_string(),
        });
        {
            let state = self.registry.lock_state();
            self.check(&state)?;
        }

        let mut events = self.registry.events.subscribe();
        let (tx, stream) = mpsc::unbounded_channel();
        let exact = prefix.trim_end_matches('/').to_string();
        let under = format!("{exact}/");

        tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    _ = tx.closed() => break,
                    received = events.recv() => received,
                };
                match received {
                    Ok(event) => {
                        if (event.key == exact || event.key.starts_with(&under))
                            && tx.send(event).is_err()
                        {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(prefix = %exact, skipped, "watch lagged, events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::trace!(prefix = %exact, "watch forwarder stopped");
        });

        Ok(stream)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
