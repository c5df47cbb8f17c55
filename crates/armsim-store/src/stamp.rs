//! Concurrency stamping and the lock/unlock state machine.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use armsim_types::{ETag, Timestamp};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::model::{Node, Versioning};

/// Source of the current instant.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Move the clock to `instant`.
    pub fn set(&self, instant: Timestamp) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Assigns a fresh version token and modification time to versioned nodes.
///
/// Each stamp produces a token different from the node's previous token and
/// a time strictly after the previous modification time. When the clock has
/// not advanced (or has gone backwards) the time is bumped one microsecond
/// past the previous value.
#[derive(Clone, Debug)]
pub struct Stamper {
    clock: Arc<dyn Clock>,
}

impl Stamper {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// A stamper reading the system clock.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// The clock's current instant.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Replace `node`'s versioning metadata and return the new value.
    pub fn stamp(&self, node: &mut Node) -> Versioning {
        let now = self.clock.now();
        let next = match &node.version {
            Some(previous) => Versioning {
                etag: ETag::next_after(&previous.etag),
                last_modified: if now > previous.last_modified {
                    now
                } else {
                    previous.last_modified.next_tick()
                },
            },
            None => Versioning {
                etag: ETag::new(),
                last_modified: now,
            },
        };
        debug!(
            kind = %node.kind,
            key = %node.key,
            etag = %next.etag.short(),
            "stamped"
        );
        node.version = Some(next.clone());
        next
    }
}

impl Default for Stamper {
    fn default() -> Self {
        Self::system()
    }
}

/// Transition `node` from unlocked to locked and stamp it.
pub fn lock(node: &mut Node, stamper: &Stamper) -> StoreResult<Versioning> {
    set_locked(node, true, stamper)
}

/// Transition `node` from locked to unlocked and stamp it.
pub fn unlock(node: &mut Node, stamper: &Stamper) -> StoreResult<Versioning> {
    set_locked(node, false, stamper)
}

fn set_locked(node: &mut Node, locked: bool, stamper: &Stamper) -> StoreResult<Versioning> {
    if !node.kind.is_lockable() {
        return Err(StoreError::NotLockable { kind: node.kind });
    }
    if node.locked == locked {
        warn!(key = %node.key, locked, "lock state unchanged");
        return Err(StoreError::StateConflict {
            key: node.key.clone(),
            locked,
        });
    }
    node.locked = locked;
    Ok(stamper.stamp(node))
}
