//! Per-employee run locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Hands out one mutex per employee id so runs for the same employee are
/// serialized while different employees proceed in parallel.
///
/// The mutexes guard no data, so a poisoned lock is taken over as-is: a run
/// that panicked committed nothing.
#[derive(Debug, Default)]
pub(crate) struct EmployeeLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EmployeeLocks {
    pub(crate) fn lock_for(&self, employee_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(employee_id.to_string()).or_default())
    }
}

/// Blocks until the employee's lock is free.
pub(crate) fn hold(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}
