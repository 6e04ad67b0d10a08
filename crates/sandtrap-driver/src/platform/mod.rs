//! Kernel implementation of the engine's platform traits
//!
//! Everything here runs in the context of the intercepted thread, at
//! `PASSIVE_LEVEL`, inside the monitored process.

mod evidence;
mod passthrough;

pub use evidence::KernelFile;
pub use passthrough::ServiceTable;

use alloc::string::String;
use core::mem::size_of;
use core::ptr;

use sandtrap_common::status::STATUS_SUCCESS;
use sandtrap_common::{Handle, NtStatus, ProcessId, ProcessorMode, Signature};
use sandtrap_engine::{
    CallerContext, Fault, ForeignMemory, LogSink, NameError, ObjectNames,
};
use spin::Once;
use wdk::println;
use wdk_sys::{
    ntddk::{ExGetPreviousMode, MmCopyMemory, PsGetCurrentProcessId, ZwClose},
    HANDLE, MM_COPY_ADDRESS, MODE, STATUS_BUFFER_OVERFLOW, STATUS_BUFFER_TOO_SMALL,
    STATUS_INFO_LENGTH_MISMATCH, UNICODE_STRING,
};

use crate::ffi::{ZwQueryObject, MM_COPY_MEMORY_VIRTUAL, OBJECT_NAME_INFORMATION_CLASS};
use crate::utils::memory::PoolAllocation;
use crate::DRIVER_NAME;

/// `MM_USER_PROBE_ADDRESS` on x64: first address above user space
const USER_PROBE_ADDRESS: usize = 0x7FFF_FFFF_0000;

/// Largest `OBJECT_NAME_INFORMATION` accepted from the name query
const MAX_NAME_INFORMATION: u32 = (size_of::<UNICODE_STRING>() + u16::MAX as usize) as u32;

/// Delivers one finished record to the user-mode collector
///
/// `record` is not NUL-terminated and only valid for the duration of the
/// call.
pub type LogTransport =
    unsafe extern "C" fn(process_id: u32, signature: u32, record: *const u8, len: usize);

pub struct KernelPlatform {
    originals: Once<ServiceTable>,
    transport: Once<Option<LogTransport>>,
}

impl KernelPlatform {
    pub const fn new() -> Self {
        Self {
            originals: Once::new(),
            transport: Once::new(),
        }
    }

    /// Record the original services and the transport; only the first call wins
    pub fn install(
        &self,
        table: ServiceTable,
        transport: Option<LogTransport>,
    ) -> Result<(), NtStatus> {
        if self.originals.is_completed() {
            return Err(wdk_sys::STATUS_UNSUCCESSFUL);
        }
        self.originals.call_once(|| table);
        self.transport.call_once(|| transport);
        Ok(())
    }

    fn originals(&self) -> Option<&ServiceTable> {
        self.originals.get()
    }
}

impl CallerContext for KernelPlatform {
    fn current_process_id(&self) -> ProcessId {
        ProcessId(unsafe { PsGetCurrentProcessId() } as usize as u32)
    }

    fn previous_mode(&self) -> ProcessorMode {
        if unsafe { ExGetPreviousMode() } == MODE::KernelMode as i8 {
            ProcessorMode::Kernel
        } else {
            ProcessorMode::User
        }
    }
}

impl ForeignMemory for KernelPlatform {
    /// `MmCopyMemory` tolerates invalid and unmapped virtual addresses, so
    /// no structured exception handling is needed around the copy. The
    /// range check keeps a user-supplied pointer from naming kernel memory.
    fn copy_foreign(&self, address: usize, dest: &mut [u8]) -> Result<(), Fault> {
        let violation = Fault::AccessViolation { address, len: dest.len() };
        if dest.is_empty() {
            return Ok(());
        }

        let end = address.checked_add(dest.len()).ok_or(violation)?;
        if address == 0 || end > USER_PROBE_ADDRESS {
            return Err(violation);
        }

        let mut source: MM_COPY_ADDRESS = unsafe { core::mem::zeroed() };
        source.__bindgen_anon_1.VirtualAddress = address as _;

        let mut copied: u64 = 0;
        let status = unsafe {
            MmCopyMemory(
                dest.as_mut_ptr().cast(),
                source,
                dest.len() as u64,
                MM_COPY_MEMORY_VIRTUAL,
                &mut copied,
            )
        };

        if status != STATUS_SUCCESS || copied as usize != dest.len() {
            return Err(violation);
        }
        Ok(())
    }
}

impl ObjectNames for KernelPlatform {
    fn resolve_name(&self, handle: Handle) -> Result<String, NameError> {
        let raw = handle.0 as HANDLE;

        let mut needed: u32 = 0;
        let status = unsafe {
            ZwQueryObject(raw, OBJECT_NAME_INFORMATION_CLASS, ptr::null_mut(), 0, &mut needed)
        };
        match status {
            STATUS_INFO_LENGTH_MISMATCH | STATUS_BUFFER_TOO_SMALL | STATUS_BUFFER_OVERFLOW => {}
            status if status < 0 => return Err(NameError::Query(status)),
            _ => {}
        }
        if (needed as usize) < size_of::<UNICODE_STRING>() || needed > MAX_NAME_INFORMATION {
            return Err(NameError::Query(STATUS_INFO_LENGTH_MISMATCH));
        }

        let mut info =
            unsafe { PoolAllocation::new(needed as usize) }.ok_or(NameError::Allocation)?;
        let status = unsafe {
            ZwQueryObject(
                raw,
                OBJECT_NAME_INFORMATION_CLASS,
                info.as_mut_ptr(),
                info.size() as u32,
                &mut needed,
            )
        };
        if status < 0 {
            return Err(NameError::Query(status));
        }

        // OBJECT_NAME_INFORMATION is a single UNICODE_STRING whose buffer
        // follows it inside the same allocation
        let name = unsafe { ptr::read_unaligned(info.as_mut_ptr() as *const UNICODE_STRING) };
        if name.Length == 0 || name.Buffer.is_null() {
            return Err(NameError::Unnamed);
        }

        let units = unsafe {
            core::slice::from_raw_parts(name.Buffer as *const u16, name.Length as usize / 2)
        };
        decode_name(units)
    }

    fn release_handle(&self, handle: Handle) -> NtStatus {
        unsafe { ZwClose(handle.0 as HANDLE) }
    }
}

fn decode_name(units: &[u16]) -> Result<String, NameError> {
    let mut name = String::new();
    name.try_reserve(units.len()).map_err(|_| NameError::Allocation)?;
    name.extend(
        char::decode_utf16(units.iter().copied())
            .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER)),
    );
    Ok(name)
}

impl LogSink for KernelPlatform {
    fn emit_log(&self, process_id: ProcessId, signature: Signature, record: &str) {
        match self.transport.get().copied().flatten() {
            Some(transport) => unsafe {
                transport(process_id.0, signature.id(), record.as_ptr(), record.len())
            },
            // no collector attached: records go to the debugger
            None => println!("[{}] {} {} {}", DRIVER_NAME, process_id, signature, record),
        }
    }
}
