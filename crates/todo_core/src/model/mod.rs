//! Domain model for tasks and their file attachments.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own record-level validation so every write path enforces it.
//!
//! # Invariants
//! - Identifiers are assigned by storage; `0` means "not persisted yet".
//! - Timestamps are Unix epoch milliseconds.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod attachment;
pub mod task;

/// Current wall-clock time in epoch milliseconds.
///
/// Clamps to `0` if the system clock reports a time before the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
