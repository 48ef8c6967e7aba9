// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination store contract
//!
//! The lock coordinator depends only on [`RegistryRepository`]. Concrete
//! backends (ZooKeeper, etcd, the in-process [`MemoryRegistry`]) implement it.

mod memory;

pub use memory::{MemoryRegistry, MemorySession, RepositoryCall};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

/// Errors from coordination store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("coordination store unavailable: {0}")]
    Unavailable(String),
    #[error("session closed: {0}")]
    SessionClosed(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Kind of change observed on a watched key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Updated,
    Deleted,
}

/// A change notification for a single key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChangedEvent {
    pub key: String,
    /// New value; empty for deletions
    pub value: String,
    pub change: ChangeKind,
}

/// Stream of change notifications returned by [`RegistryRepository::watch`]
pub type WatchStream = UnboundedReceiver<DataChangedEvent>;

/// Hierarchical key-value coordination store
///
/// Paths are `/`-separated. Writes are upserts; deletes of absent keys are
/// no-ops. Lock operations provide single-holder mutual exclusion per path.
#[async_trait]
pub trait RegistryRepository: Clone + Send + Sync + 'static {
    /// Upsert a persistent node
    async fn persist(&self, key: &str, value: &str) -> Result<(), RepositoryError>;

    /// Upsert a node bound to this session's lifetime
    async fn persist_ephemeral(&self, key: &str, value: &str) -> Result<(), RepositoryError>;

    /// Read a node, `None` if absent
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError>;

    /// Remove a node if present
    async fn delete(&self, key: &str) -> Result<(), RepositoryError>;

    /// Names of the direct children of `key`
    async fn get_children_keys(&self, key: &str) -> Result<Vec<String>, RepositoryError>;

    /// Try to take the exclusive lock on `key`, waiting at most `timeout`
    async fn try_lock(&self, key: &str, timeout: Duration) -> Result<bool, RepositoryError>;

    /// Release the exclusive lock on `key`; no-op unless held by this session
    async fn release_lock(&self, key: &str) -> Result<(), RepositoryError>;

    /// Subscribe to changes of keys under `prefix`
    async fn watch(&self, prefix: &str) -> Result<WatchStream, RepositoryError>;
}
