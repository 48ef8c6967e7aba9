// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination store path layout
//!
//! ```text
//! /lock/locks/<lock>            exclusive lock node
//! /lock/ack/<instance>-<lock>   ack record, ephemeral
//! /states/proxynodes/<instance> membership, ephemeral
//! ```
//!
//! Every name is percent-encoded before it becomes a path segment, so a name
//! can never escape its parent or collide with another name. Inside an ack
//! key `-` is reserved as the separator and is encoded in both components.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

pub const LOCK_ROOT: &str = "/lock/locks";
pub const ACK_ROOT: &str = "/lock/ack";
pub const INSTANCES_ROOT: &str = "/states/proxynodes";

/// Separator between instance id and lock name in an ack key
pub const ACK_KEY_SEPARATOR: char = '-';

const SEGMENT: &AsciiSet = &CONTROLS.add(b'/').add(b'%');
const ACK_COMPONENT: &AsciiSet = &SEGMENT.add(b'-');

pub fn lock_root_path() -> &'static str {
    LOCK_ROOT
}

pub fn ack_root_path() -> &'static str {
    ACK_ROOT
}

pub fn instances_root_path() -> &'static str {
    INSTANCES_ROOT
}

/// Path of the exclusive lock node for `lock_name`
pub fn lock_path(lock_name: &str) -> String {
    format!("{LOCK_ROOT}/{}", encode_segment(lock_name))
}

/// Inverse of [`lock_path`]; `None` for anything that is not a direct child
/// of the lock root. The empty name maps to `/lock/locks/`.
pub fn lock_name_from_path(path: &str) -> Option<String> {
    let segment = path.strip_prefix(LOCK_ROOT)?.strip_prefix('/')?;
    if segment.contains('/') {
        return None;
    }
    decode(segment)
}

/// Composite key identifying one instance's ack for one lock
pub fn ack_key(instance_id: &str, lock_name: &str) -> String {
    format!(
        "{}{ACK_KEY_SEPARATOR}{}",
        utf8_percent_encode(instance_id, ACK_COMPONENT),
        utf8_percent_encode(lock_name, ACK_COMPONENT)
    )
}

/// Split an ack key back into `(instance_id, lock_name)`
pub fn parse_ack_key(key: &str) -> Option<(String, String)> {
    let (instance, lock) = key.split_once(ACK_KEY_SEPARATOR)?;
    Some((decode(instance)?, decode(lock)?))
}

/// Path of the ack record stored under `ack_key`
pub fn ack_path(ack_key: &str) -> String {
    format!("{ACK_ROOT}/{ack_key}")
}

/// Membership node of a registered instance
pub fn instance_path(instance_id: &str) -> String {
    format!("{INSTANCES_ROOT}/{}", encode_segment(instance_id))
}

/// Decode a child name listed under a root back into the original name
pub fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

fn encode_segment(name: &str) -> String {
    utf8_percent_encode(name, SEGMENT).to_string()
}

fn decode(segment: &str) -> Option<String> {
    percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
