//! Scoped access overrides.
//!
//! Mapping-internal writes (for example a service-level save) may need to
//! edit records the caller could not edit directly. The store exposes an
//! [`AccessPolicy`]; [`AccessPolicy::override_scope`] returns a guard that
//! lifts protection checks on the calling thread until it is dropped.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{StoreError, StoreResult};
use crate::record::Record;

static NEXT_POLICY: AtomicU64 = AtomicU64::new(1);

thread_local! {
    // Policies with a live override on this thread, innermost last.
    static ACTIVE_OVERRIDES: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

/// Access checks applied by a store before edits and saves.
///
/// Overrides are scoped to the thread that took them: a guard held on one
/// thread never lifts protection for another.
#[derive(Debug)]
pub struct AccessPolicy {
    id: u64,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            id: NEXT_POLICY.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl AccessPolicy {
    /// Create a policy with no active overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while the current thread holds an override guard.
    pub fn is_overridden(&self) -> bool {
        ACTIVE_OVERRIDES.with(|active| active.borrow().contains(&self.id))
    }

    /// Lift protection checks on the current thread until the returned guard
    /// is dropped.
    ///
    /// Guards nest; protection returns when the last one is released.
    pub fn override_scope(&self) -> SecurityOverride<'_> {
        ACTIVE_OVERRIDES.with(|active| active.borrow_mut().push(self.id));
        SecurityOverride {
            policy: self,
            _thread: PhantomData,
        }
    }

    /// Verify that `record` may be edited or saved right now.
    pub fn check_edit(&self, record: &Record) -> StoreResult<()> {
        if record.protected && !self.is_overridden() {
            return Err(StoreError::AccessDenied {
                id: record.id,
                reason: "record is protected".into(),
            });
        }
        Ok(())
    }
}

/// RAII guard returned by [`AccessPolicy::override_scope`].
///
/// Not `Send`: it must be released on the thread that took it.
#[derive(Debug)]
#[must_use = "the override is released as soon as the guard is dropped"]
pub struct SecurityOverride<'a> {
    policy: &'a AccessPolicy,
    _thread: PhantomData<*const ()>,
}

impl Drop for SecurityOverride<'_> {
    fn drop(&mut self) {
        let id = self.policy.id;
        ACTIVE_OVERRIDES.with(|active| {
            let mut active = active.borrow_mut();
            if let Some(pos) = active.iter().rposition(|p| *p == id) {
                active.remove(pos);
            }
        });
    }
}
