//! Concrete node table, operation cache, and parallel runtime (C2, C4,
//! C5) wiring `addd-core`'s traits into one manager implementation.

pub mod apply_cache;
pub mod gc;
pub mod manager_impl;
pub mod node_table;
pub mod protect;
pub mod scheduler;
pub mod worker;

pub use manager_impl::{EvbddManager, ManagerConfig};

use std::sync::OnceLock;

static WORKER_COUNT: OnceLock<usize> = OnceLock::new();

/// Set once by `EvbddManager::new`; read by the scheduler's pool
/// construction (which is itself lazily built on first `join`/
/// `fork_join_n` call, so this must be set before any recursive
/// operation runs).
pub(crate) fn set_worker_count(n: usize) {
    let _ = WORKER_COUNT.set(n.max(1));
}

pub(crate) fn config_worker_count() -> usize {
    *WORKER_COUNT.get_or_init(default_worker_count)
}

#[cfg(feature = "multi-threading")]
fn default_worker_count() -> usize {
    num_cpus::get().max(1)
}

#[cfg(not(feature = "multi-threading"))]
fn default_worker_count() -> usize {
    1
}
