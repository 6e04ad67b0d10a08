//! Services the engine consumes from its host
//!
//! The engine owns policy; the host owns everything that touches the
//! kernel. The driver implements these traits over the WDK, and the test
//! suite implements them over in-memory fakes.
//!
//! # Collaborators
//! - [`CallerContext`]: who is calling, and from which processor mode
//! - [`ForeignMemory`]: fault-tolerant copy out of caller memory
//! - [`ObjectNames`]: handle to name resolution, early handle release
//! - [`LogSink`]: one-way transport for finished records
//! - [`FilePassthrough`]: the original, unhooked system services
//! - [`EvidenceFs`]: file primitives used to copy evidence into quarantine

use alloc::string::String;

use sandtrap_common::{Handle, NtStatus, ProcessId, ProcessorMode, Signature};

use crate::args::{
    CreateFileArgs, DeleteFileArgs, DeviceIoControlArgs, FileIoArgs, OpenFileArgs,
    QueryAttributesArgs, SetInformationArgs,
};
use crate::error::{Fault, NameError};

pub trait CallerContext {
    fn current_process_id(&self) -> ProcessId;

    /// Mode the calling thread was in before entering the system service
    fn previous_mode(&self) -> ProcessorMode;
}

pub trait ForeignMemory {
    /// Copy exactly `dest.len()` bytes starting at `address` in the
    /// caller's address space.
    ///
    /// Must report an invalid, unmapped or out-of-range source as a
    /// [`Fault`] instead of raising. On error the content of `dest` is
    /// unspecified.
    fn copy_foreign(&self, address: usize, dest: &mut [u8]) -> Result<(), Fault>;
}

pub trait ObjectNames {
    /// Canonical name of the object behind `handle`, in the caller's handle table
    fn resolve_name(&self, handle: Handle) -> Result<String, NameError>;

    /// Close `handle` ahead of the caller
    fn release_handle(&self, handle: Handle) -> NtStatus;
}

pub trait LogSink {
    /// Hand one finished record to the transport. Fire-and-forget.
    fn emit_log(&self, process_id: ProcessId, signature: Signature, record: &str);
}

/// The real implementations of the intercepted services
pub trait FilePassthrough {
    fn query_attributes_file(&self, args: &QueryAttributesArgs) -> NtStatus;
    fn device_io_control_file(&self, args: &DeviceIoControlArgs) -> NtStatus;
    fn close(&self, handle: Handle) -> NtStatus;
    fn set_information_file(&self, args: &SetInformationArgs) -> NtStatus;
    fn open_file(&self, args: &OpenFileArgs) -> NtStatus;
    fn delete_file(&self, args: &DeleteFileArgs) -> NtStatus;
    fn create_file(&self, args: &CreateFileArgs) -> NtStatus;
    fn read_file(&self, args: &FileIoArgs) -> NtStatus;
    fn write_file(&self, args: &FileIoArgs) -> NtStatus;
}

/// Kernel-side file access for evidence capture
///
/// `Source` and `Sink` close themselves when dropped.
pub trait EvidenceFs {
    type Source;
    type Sink;

    fn open_source(&self, path: &str) -> Result<Self::Source, NtStatus>;

    /// Create a new file, failing with `STATUS_OBJECT_NAME_COLLISION` if it exists
    fn create_exclusive(&self, path: &str) -> Result<Self::Sink, NtStatus>;

    /// Read the next chunk; `Ok(0)` at end of file
    fn read(&self, source: &mut Self::Source, buf: &mut [u8]) -> Result<usize, NtStatus>;

    fn write(&self, sink: &mut Self::Sink, data: &[u8]) -> Result<(), NtStatus>;

    /// Delete a partially written copy
    fn discard(&self, sink: Self::Sink);
}

/// Everything an [`Interceptor`](crate::Interceptor) needs from its host
pub trait Platform:
    CallerContext + ForeignMemory + ObjectNames + LogSink + FilePassthrough + EvidenceFs
{
}

impl<T> Platform for T where
    T: CallerContext + ForeignMemory + ObjectNames + LogSink + FilePassthrough + EvidenceFs
{
}
