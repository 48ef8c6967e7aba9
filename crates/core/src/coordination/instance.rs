// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance identity and the live-instance directory

use super::node;
use crate::repository::{RegistryRepository, RepositoryError};
use std::fmt;

/// Identifier of one running proxy instance, unique across the cluster
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Conventional `host@pid` identity of the current process
    pub fn for_process(host: &str) -> Self {
        Self(format!("{host}@{}", std::process::id()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Read-side view of cluster membership
///
/// Reflects the store at call time; nothing is cached.
#[derive(Clone)]
pub struct InstanceDirectory<R> {
    repository: R,
}

impl<R: RegistryRepository> InstanceDirectory<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// All currently registered instances
    pub async fn load_all_instances(&self) -> Result<Vec<InstanceId>, RepositoryError> {
        let children = self
            .repository
            .get_children_keys(node::instances_root_path())
            .await?;
        Ok(children
            .iter()
            .map(|child| InstanceId(node::decode_segment(child)))
            .collect())
    }

    /// Publish `instance` as live for as long as this session lasts
    pub async fn register(&self, instance: &InstanceId) -> Result<(), RepositoryError> {
        self.repository
            .persist_ephemeral(&node::instance_path(instance.as_str()), "")
            .await
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
