//! gov-core: cluster coordination for a sharded database proxy fleet
//!
//! This crate provides:
//! - A coordination store contract and an in-process implementation
//! - Distributed locks with an acknowledgment barrier across live instances
//! - Testable time handling and configuration

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod clock;
pub mod config;
pub mod coordination;
pub mod error;
pub mod repository;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, GovernanceConfig, LockConfig};
pub use coordination::{
    AckOutcome, CancelSignal, CancelToken, FleetLock, InstanceDirectory, InstanceId, LockAck,
    LockAckResponder, LockRegistry,
};
pub use error::CoordinationError;
pub use repository::{
    ChangeKind, DataChangedEvent, MemoryRegistry, MemorySession, RegistryRepository,
    RepositoryCall, RepositoryError, WatchStream,
};
