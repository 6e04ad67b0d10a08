//! Hook entry points
//!
//! One `extern "system"` function per intercepted service, with the native
//! signature. The installer fetches them with `SandtrapHookTable` and
//! points each service at its `hooked_*` routine after `SandtrapInstall`
//! has received the originals. Raw arguments are
//! packed into the engine's argument structs as plain values; the engine
//! decides whether to log, rewrite or forward.

use sandtrap_common::{AccessMask, CreateOptions, Handle, ShareAccess, UserPtr};
use sandtrap_engine::{
    CreateFileArgs, DeleteFileArgs, DeviceIoControlArgs, FileIoArgs, OpenFileArgs,
    QueryAttributesArgs, SetInformationArgs,
};
use wdk_sys::{ACCESS_MASK, HANDLE, NTSTATUS, PVOID, STATUS_UNSUCCESSFUL, ULONG};

use crate::platform::ServiceTable;

/// The `hooked_*` routines, laid out like the originals they replace
pub fn hook_table() -> ServiceTable {
    ServiceTable {
        nt_query_attributes_file: hooked_nt_query_attributes_file,
        nt_device_io_control_file: hooked_nt_device_io_control_file,
        nt_close: hooked_nt_close,
        nt_set_information_file: hooked_nt_set_information_file,
        nt_open_file: hooked_nt_open_file,
        nt_delete_file: hooked_nt_delete_file,
        nt_create_file: hooked_nt_create_file,
        nt_read_file: hooked_nt_read_file,
        nt_write_file: hooked_nt_write_file,
    }
}

fn ptr(value: PVOID) -> UserPtr {
    UserPtr(value as usize)
}

fn handle(value: HANDLE) -> Handle {
    Handle(value as usize)
}

/// Evaluate `body` against the engine, or fail the call if it was never created
macro_rules! with_engine {
    (|$engine:ident| $body:expr) => {
        match crate::engine() {
            Some($engine) => $body,
            None => STATUS_UNSUCCESSFUL,
        }
    };
}

/// # Safety
/// Called only through the redirected `NtQueryAttributesFile`.
pub unsafe extern "system" fn hooked_nt_query_attributes_file(
    object_attributes: PVOID,
    file_information: PVOID,
) -> NTSTATUS {
    let args = QueryAttributesArgs {
        object_attributes: ptr(object_attributes),
        file_information: ptr(file_information),
    };
    with_engine!(|engine| engine.nt_query_attributes_file(&args))
}

/// # Safety
/// Called only through the redirected `NtDeviceIoControlFile`.
pub unsafe extern "system" fn hooked_nt_device_io_control_file(
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
) -> NTSTATUS {
    let args = DeviceIoControlArgs {
        file_handle: handle(file_handle),
        event: handle(event),
        apc_routine: ptr(apc_routine),
        apc_context: ptr(apc_context),
        io_status_block: ptr(io_status_block),
        io_control_code,
        input_buffer: ptr(input_buffer),
        input_buffer_length,
        output_buffer: ptr(output_buffer),
        output_buffer_length,
    };
    with_engine!(|engine| engine.nt_device_io_control_file(&args))
}

/// # Safety
/// Called only through the redirected `NtClose`.
pub unsafe extern "system" fn hooked_nt_close(file_handle: HANDLE) -> NTSTATUS {
    with_engine!(|engine| engine.nt_close(handle(file_handle)))
}

/// # Safety
/// Called only through the redirected `NtSetInformationFile`.
pub unsafe extern "system" fn hooked_nt_set_information_file(
    file_handle: HANDLE,
    io_status_block: PVOID,
    file_information: PVOID,
    length: ULONG,
    file_information_class: ULONG,
) -> NTSTATUS {
    let args = SetInformationArgs {
        file_handle: handle(file_handle),
        io_status_block: ptr(io_status_block),
        file_information: ptr(file_information),
        length,
        information_class: file_information_class,
    };
    with_engine!(|engine| engine.nt_set_information_file(&args))
}

/// # Safety
/// Called only through the redirected `NtOpenFile`.
pub unsafe extern "system" fn hooked_nt_open_file(
    file_handle: PVOID,
    desired_access: ACCESS_MASK,
    object_attributes: PVOID,
    io_status_block: PVOID,
    share_access: ULONG,
    open_options: ULONG,
) -> NTSTATUS {
    let args = OpenFileArgs {
        file_handle: ptr(file_handle),
        desired_access: AccessMask::from_bits_retain(desired_access),
        object_attributes: ptr(object_attributes),
        io_status_block: ptr(io_status_block),
        share_access: ShareAccess::from_bits_retain(share_access),
        open_options: CreateOptions::from_bits_retain(open_options),
    };
    with_engine!(|engine| engine.nt_open_file(&args))
}

/// # Safety
/// Called only through the redirected `NtDeleteFile`.
pub unsafe extern "system" fn hooked_nt_delete_file(object_attributes: PVOID) -> NTSTATUS {
    let args = DeleteFileArgs {
        object_attributes: ptr(object_attributes),
    };
    with_engine!(|engine| engine.nt_delete_file(&args))
}

/// # Safety
/// Called only through the redirected `NtCreateFile`.
pub unsafe extern "system" fn hooked_nt_create_file(
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
) -> NTSTATUS {
    let args = CreateFileArgs {
        file_handle: ptr(file_handle),
        desired_access: AccessMask::from_bits_retain(desired_access),
        object_attributes: ptr(object_attributes),
        io_status_block: ptr(io_status_block),
        allocation_size: ptr(allocation_size),
        file_attributes,
        share_access: ShareAccess::from_bits_retain(share_access),
        create_disposition,
        create_options: CreateOptions::from_bits_retain(create_options),
        ea_buffer: ptr(ea_buffer),
        ea_length,
    };
    with_engine!(|engine| engine.nt_create_file(&args))
}

#[allow(clippy::too_many_arguments)]
fn file_io_args(
    file_handle: HANDLE,
    event: HANDLE,
    apc_routine: PVOID,
    apc_context: PVOID,
    io_status_block: PVOID,
    buffer: PVOID,
    length: ULONG,
    byte_offset: PVOID,
    key: PVOID,
) -> FileIoArgs {
    FileIoArgs {
        file_handle: handle(file_handle),
        event: handle(event),
        apc_routine: ptr(apc_routine),
        apc_context: ptr(apc_context),
        io_status_block: ptr(io_status_block),
        buffer: ptr(buffer),
        length,
        byte_offset: ptr(byte_offset),
        key: ptr(key),
    }
}

/// # Safety
/// Called only through the redirected `NtReadFile`.
pub unsafe extern "system" fn hooked_nt_read_file(
    file_handle: HANDLE,
    event: HANDLE,
    apc_routine: PVOID,
    apc_context: PVOID,
    io_status_block: PVOID,
    buffer: PVOID,
    length: ULONG,
    byte_offset: PVOID,
    key: PVOID,
) -> NTSTATUS {
    let args = file_io_args(
        file_handle,
        event,
        apc_routine,
        apc_context,
        io_status_block,
        buffer,
        length,
        byte_offset,
        key,
    );
    with_engine!(|engine| engine.nt_read_file(&args))
}

/// # Safety
/// Called only through the redirected `NtWriteFile`.
pub unsafe extern "system" fn hooked_nt_write_file(
    file_handle: HANDLE,
    event: HANDLE,
    apc_routine: PVOID,
    apc_context: PVOID,
    io_status_block: PVOID,
    buffer: PVOID,
    length: ULONG,
    byte_offset: PVOID,
    key: PVOID,
) -> NTSTATUS {
    let args = file_io_args(
        file_handle,
        event,
        apc_routine,
        apc_context,
        io_status_block,
        buffer,
        length,
        byte_offset,
        key,
    );
    with_engine!(|engine| engine.nt_write_file(&args))
}
