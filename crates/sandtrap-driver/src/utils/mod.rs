//! Utility modules
//!
//! - `memory`: pool allocations for kernel-filled scratch buffers

pub mod memory;
