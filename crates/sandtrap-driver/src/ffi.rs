//! Kernel exports not covered by the generated bindings

use wdk_sys::{HANDLE, NTSTATUS, PVOID, ULONG};

/// `OBJECT_INFORMATION_CLASS::ObjectNameInformation`
pub const OBJECT_NAME_INFORMATION_CLASS: u32 = 1;

/// `MM_COPY_MEMORY_VIRTUAL`
pub const MM_COPY_MEMORY_VIRTUAL: ULONG = 0x2;

extern "system" {
    /// Exported by ntoskrnl, declared in ntifs.h
    pub fn ZwQueryObject(
        handle: HANDLE,
        object_information_class: u32,
        object_information: PVOID,
        object_information_length: ULONG,
        return_length: *mut ULONG,
    ) -> NTSTATUS;
}
