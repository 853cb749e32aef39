use std::sync::{Mutex, MutexGuard};

/// Lock `mutex`, recovering the state if a previous holder panicked.
///
/// Every critical section in this crate leaves its map consistent before it
/// can panic, so the inner value is still valid after poisoning.
pub(crate) fn lock_or_recover<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!(state = what, "lock poisoned, recovering inner state");
            poisoned.into_inner()
        }
    }
}
