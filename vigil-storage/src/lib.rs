//! VIGIL Storage - Snapshot persistence
//!
//! One mutable "latest" pointer plus an append-only timestamped archive.
//! Saves are atomic with respect to partial writes: a crash mid-write can
//! never corrupt the latest pointer.

mod store;

pub use store::{SavedSnapshot, SnapshotStore};
