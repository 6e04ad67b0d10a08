//! The original service routines
//!
//! The hook installer saves each service's original entry before
//! redirecting it, and hands the saved set over as a [`ServiceTable`].
//! Forwarding converts the engine's argument structs back into the native
//! argument list unchanged.

use sandtrap_common::{Handle, NtStatus, UserPtr};
use sandtrap_engine::{
    CreateFileArgs, DeleteFileArgs, DeviceIoControlArgs, FileIoArgs, FilePassthrough,
    OpenFileArgs, QueryAttributesArgs, SetInformationArgs,
};
use wdk_sys::{ACCESS_MASK, HANDLE, NTSTATUS, PVOID, STATUS_NOT_IMPLEMENTED, ULONG};

use super::KernelPlatform;

pub type NtQueryAttributesFileFn = unsafe extern "system" fn(
    object_attributes: PVOID,
    file_information: PVOID,
) -> NTSTATUS;

pub type NtDeviceIoControlFileFn = unsafe extern "system" fn(
    file_handle: HANDLE,
    event: HANDLE,
    apc_routine: PVOID,
    apc_context: PVOID,
    io_status_block: PVOID,
    io_control_code: ULONG,
    input_buffer: PVOID,
    input_buffer_length: ULONG,
    output_buffer: PVOID,
    output_buffer_length: ULONG,
) -> NTSTATUS;

pub type NtCloseFn = unsafe extern "system" fn(handle: HANDLE) -> NTSTATUS;

pub type NtSetInformationFileFn = unsafe extern "system" fn(
    file_handle: HANDLE,
    io_status_block: PVOID,
    file_information: PVOID,
    length: ULONG,
    file_information_class: ULONG,
) -> NTSTATUS;

pub type NtOpenFileFn = unsafe extern "system" fn(
    file_handle: PVOID,
    desired_access: ACCESS_MASK,
    object_attributes: PVOID,
    io_status_block: PVOID,
    share_access: ULONG,
    open_options: ULONG,
) -> NTSTATUS;

pub type NtDeleteFileFn = unsafe extern "system" fn(object_attributes: PVOID) -> NTSTATUS;

pub type NtCreateFileFn = unsafe extern "system" fn(
    file_handle: PVOID,
    desired_access: ACCESS_MASK,
    object_attributes: PVOID,
    io_status_block: PVOID,
    allocation_size: PVOID,
    file_attributes: ULONG,
    share_access: ULONG,
    create_disposition: ULONG,
    create_options: ULONG,
    ea_buffer: PVOID,
    ea_length: ULONG,
) -> NTSTATUS;

/// `NtReadFile` and `NtWriteFile`
pub type NtFileIoFn = unsafe extern "system" fn(
    file_handle: HANDLE,
    event: HANDLE,
    apc_routine: PVOID,
    apc_context: PVOID,
    io_status_block: PVOID,
    buffer: PVOID,
    length: ULONG,
    byte_offset: PVOID,
    key: PVOID,
) -> NTSTATUS;

/// Original entry of every intercepted service
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ServiceTable {
    pub nt_query_attributes_file: NtQueryAttributesFileFn,
    pub nt_device_io_control_file: NtDeviceIoControlFileFn,
    pub nt_close: NtCloseFn,
    pub nt_set_information_file: NtSetInformationFileFn,
    pub nt_open_file: NtOpenFileFn,
    pub nt_delete_file: NtDeleteFileFn,
    pub nt_create_file: NtCreateFileFn,
    pub nt_read_file: NtFileIoFn,
    pub nt_write_file: NtFileIoFn,
}

fn raw(ptr: UserPtr) -> PVOID {
    ptr.0 as PVOID
}

fn handle(handle: Handle) -> HANDLE {
    handle.0 as HANDLE
}

// Arguments are the caller's own, forwarded as received (or as rewritten
// by the engine); the original routine validates them as it always would.
impl FilePassthrough for KernelPlatform {
    fn query_attributes_file(&self, args: &QueryAttributesArgs) -> NtStatus {
        let Some(table) = self.originals() else {
            return STATUS_NOT_IMPLEMENTED;
        };
        unsafe { (table.nt_query_attributes_file)(raw(args.object_attributes), raw(args.file_information)) }
    }

    fn device_io_control_file(&self, args: &DeviceIoControlArgs) -> NtStatus {
        let Some(table) = self.originals() else {
            return STATUS_NOT_IMPLEMENTED;
        };
        unsafe {
            (table.nt_device_io_control_file)(
                handle(args.file_handle),
                handle(args.event),
                raw(args.apc_routine),
                raw(args.apc_context),
                raw(args.io_status_block),
                args.io_control_code,
                raw(args.input_buffer),
                args.input_buffer_length,
                raw(args.output_buffer),
                args.output_buffer_length,
            )
        }
    }

    fn close(&self, file_handle: Handle) -> NtStatus {
        let Some(table) = self.originals() else {
            return STATUS_NOT_IMPLEMENTED;
        };
        unsafe { (table.nt_close)(handle(file_handle)) }
    }

    fn set_information_file(&self, args: &SetInformationArgs) -> NtStatus {
        let Some(table) = self.originals() else {
            return STATUS_NOT_IMPLEMENTED;
        };
        unsafe {
            (table.nt_set_information_file)(
                handle(args.file_handle),
                raw(args.io_status_block),
                raw(args.file_information),
                args.length,
                args.information_class,
            )
        }
    }

    fn open_file(&self, args: &OpenFileArgs) -> NtStatus {
        let Some(table) = self.originals() else {
            return STATUS_NOT_IMPLEMENTED;
        };
        unsafe {
            (table.nt_open_file)(
                raw(args.file_handle),
                args.desired_access.bits(),
                raw(args.object_attributes),
                raw(args.io_status_block),
                args.share_access.bits(),
                args.open_options.bits(),
            )
        }
    }

    fn delete_file(&self, args: &DeleteFileArgs) -> NtStatus {
        let Some(table) = self.originals() else {
            return STATUS_NOT_IMPLEMENTED;
        };
        unsafe { (table.nt_delete_file)(raw(args.object_attributes)) }
    }

    fn create_file(&self, args: &CreateFileArgs) -> NtStatus {
        let Some(table) = self.originals() else {
            return STATUS_NOT_IMPLEMENTED;
        };
        unsafe {
            (table.nt_create_file)(
                raw(args.file_handle),
                args.desired_access.bits(),
                raw(args.object_attributes),
                raw(args.io_status_block),
                raw(args.allocation_size),
                args.file_attributes,
                args.share_access.bits(),
                args.create_disposition,
                args.create_options.bits(),
                raw(args.ea_buffer),
                args.ea_length,
            )
        }
    }

    fn read_file(&self, args: &FileIoArgs) -> NtStatus {
        let Some(table) = self.originals() else {
            return STATUS_NOT_IMPLEMENTED;
        };
        unsafe { forward_io(table.nt_read_file, args) }
    }

    fn write_file(&self, args: &FileIoArgs) -> NtStatus {
        let Some(table) = self.originals() else {
            return STATUS_NOT_IMPLEMENTED;
        };
        unsafe { forward_io(table.nt_write_file, args) }
    }
}

/// # Safety
/// `routine` must be the original `NtReadFile` or `NtWriteFile`.
unsafe fn forward_io(routine: NtFileIoFn, args: &FileIoArgs) -> NtStatus {
    unsafe {
        routine(
            handle(args.file_handle),
            handle(args.event),
            raw(args.apc_routine),
            raw(args.apc_context),
            raw(args.io_status_block),
            raw(args.buffer),
            args.length,
            raw(args.byte_offset),
            raw(args.key),
        )
    }
}
