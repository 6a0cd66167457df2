//! Request Coalescing Module
//!
//! Collapses concurrent loads of the same key into a single execution. The
//! first caller for a key becomes the leader and runs the work; everyone
//! else arriving while it is in flight waits on the same call and receives
//! a clone of the leader's outcome.
//!
//! ## Mechanism
//! - A mutex-guarded map holds one in-flight call per key. The mutex is
//!   only ever held to look up or edit the map, never across the work
//!   itself.
//! - Each call carries a write-once result slot and a notification latch.
//!   The leader publishes into the slot, wakes all waiters, and removes the
//!   map entry, so the next caller for the key starts a fresh call. No
//!   results are remembered here; caching outcomes is the caller's job.
//! - Entry removal is tied to a guard that runs on every leader exit path.
//!   The guard raises a durable "leader gone" flag before waking waiters;
//!   waiters re-check that flag (and the result slot) after every wake, so
//!   a notification fired before a waiter finished registering cannot be
//!   lost. A waiter that finds the flag raised with no result re-enters
//!   and elects a new leader.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tokio::sync::Notify;

/// One in-flight load. Waiters hold the `Arc` directly, so a call stays
/// readable even after its map entry is gone.
struct Call<T> {
    result: OnceLock<T>,
    done: Notify,
    /// Raised when the leader exits, with or without a result. Unlike the
    /// notification, this survives being set while no waiter is registered.
    finished: AtomicBool,
}

impl<T> Call<T> {
    fn new() -> Self {
        Self {
            result: OnceLock::new(),
            done: Notify::new(),
            finished: AtomicBool::new(false),
        }
    }

    /// Waits until the call completes. `None` means the leader went away
    /// without publishing; the caller should start over.
    async fn wait(&self) -> Option<T>
    where
        T: Clone,
    {
        loop {
            if let Some(value) = self.result.get() {
                return Some(value.clone());
            }
            if self.finished.load(Ordering::Acquire) {
                // The leader is gone; whatever the slot holds is final.
                return self.result.get().cloned();
            }

            let notified = self.done.notified();
            tokio::pin!(notified);
            // Register before re-checking, so a completion between the
            // checks and the await cannot be missed.
            notified.as_mut().enable();
            if self.result.get().is_some() || self.finished.load(Ordering::Acquire) {
                continue;
            }
            notified.await;
        }
    }
}

/// Retires the call when the leader finishes, whether it published a result
/// or was torn down mid-flight: removes the map entry, raises the durable
/// flag, and wakes waiters.
struct CallGuard<'a, T> {
    flight: &'a SingleFlight<T>,
    key: String,
    call: Arc<Call<T>>,
}

impl<T> Drop for CallGuard<'_, T> {
    fn drop(&mut self) {
        let mut calls = self.flight.calls.lock();
        // Only retire our own entry; a successor call may already occupy
        // the slot if we were cancelled and another leader moved in.
        if let Some(current) = calls.get(&self.key) {
            if Arc::ptr_eq(current, &self.call) {
                calls.remove(&self.key);
            }
        }
        drop(calls);
        // Flag first, then wake: a waiter that misses the notification
        // still observes the flag on its next check.
        self.call.finished.store(true, Ordering::Release);
        self.call.done.notify_waiters();
    }
}

/// Deduplicates concurrent executions per key.
pub struct SingleFlight<T> {
    calls: Mutex<HashMap<String, Arc<Call<T>>>>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> SingleFlight<T> {
    /// Runs `work` for `key` unless an identical call is already in flight,
    /// in which case the in-flight outcome is awaited and returned.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let call = loop {
            let (call, leads) = {
                let mut calls = self.calls.lock();
                match calls.entry(key.to_string()) {
                    Entry::Occupied(entry) => (Arc::clone(entry.get()), false),
                    Entry::Vacant(entry) => {
                        let call = Arc::new(Call::new());
                        entry.insert(Arc::clone(&call));
                        (call, true)
                    }
                }
            };
            if leads {
                break call;
            }
            if let Some(value) = call.wait().await {
                return value;
            }
            // The leader vanished without a result; contend for the slot.
        };

        let guard = CallGuard {
            flight: self,
            key: key.to_string(),
            call: Arc::clone(&call),
        };
        let value = work().await;
        let _ = call.result.set(value.clone());
        drop(guard);
        value
    }

    /// Number of keys with a load currently in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}
