// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet-wide lock coordination
//!
//! This module provides:
//! - **node** - Path layout for locks, acks and membership
//! - **LockRegistry** - Exclusive lock plus the ack barrier, one per instance
//! - **FleetLock** - Full lock/unlock cycle on top of the registry
//! - **LockAckResponder** - Writes this instance's acks as lock nodes change
//! - **InstanceDirectory** - Live instance listing

pub mod ack;
pub mod cancel;
pub mod fleet;
pub mod instance;
pub mod node;
pub mod registry;
pub mod responder;

pub use ack::LockAck;
pub use cancel::{CancelSignal, CancelToken};
pub use fleet::FleetLock;
pub use instance::{InstanceDirectory, InstanceId};
pub use registry::{AckOutcome, LockRegistry};
pub use responder::LockAckResponder;
