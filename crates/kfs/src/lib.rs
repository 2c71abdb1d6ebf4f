#![forbid(unsafe_code)]
//! KISS filesystem public API facade.
//!
//! Re-exports the driver surface from `kfs-core` through a stable external
//! interface. This is the crate the surrounding kernel's file-descriptor
//! layer (and the test harness) depends on.

pub use kfs_core::*;
