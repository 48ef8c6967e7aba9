// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ack values written by instances that observed a lock transition

use std::fmt;

/// Last lock state an instance reported for a lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockAck {
    Locked,
    Unlocked,
}

impl LockAck {
    /// Wire value persisted in the ack record
    pub fn as_str(&self) -> &'static str {
        match self {
            LockAck::Locked => "locked",
            LockAck::Unlocked => "unlocked",
        }
    }

    /// Case-insensitive comparison against a stored value.
    ///
    /// An absent record reads as the empty string and never matches.
    pub fn matches(&self, stored: &str) -> bool {
        stored.eq_ignore_ascii_case(self.as_str())
    }
}

impl fmt::Display for LockAck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
