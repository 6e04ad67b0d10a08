//! Sandtrap interception engine
//!
//! Policy core of the sandbox's file-system interception: the handlers
//! that sit in front of nine native file services for monitored
//! processes, plus the state and primitives they share.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    sandtrap-driver                      │
//! │   hooked_Nt* ──► Interceptor<KernelPlatform> ──► Orig_* │
//! └────────────────────────────┬────────────────────────────┘
//!                              │ Platform traits
//! ┌────────────────────────────┴────────────────────────────┐
//! │                    sandtrap-engine                      │
//! │  ┌──────────┐ ┌──────────┐ ┌────────┐ ┌──────────────┐  │
//! │  │ Registry │ │ Accessor │ │ Dumper │ │ RecordEncoder│  │
//! │  └──────────┘ └──────────┘ └────────┘ └──────────────┘  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine never touches kernel APIs itself. Everything external
//! (caller identity, caller memory, handle names, the real services,
//! evidence files, the log transport) is reached through the traits in
//! [`platform`], so the whole engine runs unchanged against in-memory
//! fakes.
//!
//! # Modules
//! - [`intercept`]: the nine entry points
//! - [`registry`]: monitored processes and handles marked for capture
//! - [`memory`]: bounded, fault-tolerant reads of caller memory
//! - [`dump`]: evidence copies into quarantine
//! - [`record`]: audit record rendering
//! - [`path`]: root-relative path reconstruction
//! - [`artifacts`]: hypervisor artifact signatures

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod args;
pub mod artifacts;
pub mod config;
pub mod dump;
pub mod error;
pub mod intercept;
pub mod memory;
pub mod path;
pub mod platform;
pub mod record;
pub mod registry;
pub mod stats;

pub use args::{
    CreateFileArgs, DeleteFileArgs, DeviceIoControlArgs, FileIoArgs, OpenFileArgs,
    QueryAttributesArgs, SetInformationArgs,
};
pub use config::EngineConfig;
pub use error::{CaptureError, DumpError, Fault, NameError};
pub use intercept::Interceptor;
pub use platform::{
    CallerContext, EvidenceFs, FilePassthrough, ForeignMemory, LogSink, ObjectNames, Platform,
};
pub use registry::Registry;
