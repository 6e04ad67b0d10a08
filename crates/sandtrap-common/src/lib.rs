//! Common types and definitions shared between the driver and the user-mode collector
//!
//! This crate pins down everything both sides of the log transport have to
//! agree on:
//! - API signatures identifying which intercepted call produced a record
//! - The per-operation field layout of every record (consumers parse positionally)
//! - A parser for the record grammar
//! - NT status codes, access/share/option flags and x64 structure layouts
//! - The statistics snapshot exported by the engine

#![no_std]

extern crate alloc;

pub mod flags;
pub mod layout;
pub mod signature;
pub mod stats;
pub mod status;
pub mod types;
pub mod wire;

pub use flags::{AccessMask, CreateOptions, ShareAccess};
pub use signature::Signature;
pub use stats::InterceptStats;
pub use status::{nt_success, NtStatus};
pub use types::{Handle, ProcessId, ProcessorMode, UserPtr};
pub use wire::{ParseError, ParsedRecord, RecordLayout, SENTINEL};
