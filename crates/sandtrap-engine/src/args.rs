//! Raw argument sets of the intercepted system services
//!
//! Each struct mirrors the native signature one-to-one. Pointers are kept
//! as [`UserPtr`] so that a handler can forward the exact arguments it was
//! given, or a rewritten copy, without ever dereferencing them itself.

use sandtrap_common::{AccessMask, CreateOptions, Handle, ShareAccess, UserPtr};

/// `NtQueryAttributesFile`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryAttributesArgs {
    /// `POBJECT_ATTRIBUTES`
    pub object_attributes: UserPtr,
    /// `PFILE_BASIC_INFORMATION`
    pub file_information: UserPtr,
}

/// `NtDeviceIoControlFile`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIoControlArgs {
    pub file_handle: Handle,
    pub event: Handle,
    pub apc_routine: UserPtr,
    pub apc_context: UserPtr,
    pub io_status_block: UserPtr,
    pub io_control_code: u32,
    pub input_buffer: UserPtr,
    pub input_buffer_length: u32,
    pub output_buffer: UserPtr,
    pub output_buffer_length: u32,
}

/// `NtSetInformationFile`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetInformationArgs {
    pub file_handle: Handle,
    pub io_status_block: UserPtr,
    pub file_information: UserPtr,
    pub length: u32,
    /// `FILE_INFORMATION_CLASS`
    pub information_class: u32,
}

/// `NtOpenFile`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFileArgs {
    /// `PHANDLE` receiving the new handle
    pub file_handle: UserPtr,
    pub desired_access: AccessMask,
    pub object_attributes: UserPtr,
    pub io_status_block: UserPtr,
    pub share_access: ShareAccess,
    pub open_options: CreateOptions,
}

/// `NtCreateFile`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateFileArgs {
    /// `PHANDLE` receiving the new handle
    pub file_handle: UserPtr,
    pub desired_access: AccessMask,
    pub object_attributes: UserPtr,
    pub io_status_block: UserPtr,
    /// `PLARGE_INTEGER`, optional
    pub allocation_size: UserPtr,
    pub file_attributes: u32,
    pub share_access: ShareAccess,
    pub create_disposition: u32,
    pub create_options: CreateOptions,
    pub ea_buffer: UserPtr,
    pub ea_length: u32,
}

/// `NtDeleteFile`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteFileArgs {
    pub object_attributes: UserPtr,
}

/// `NtReadFile` and `NtWriteFile` share one argument list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIoArgs {
    pub file_handle: Handle,
    pub event: Handle,
    pub apc_routine: UserPtr,
    pub apc_context: UserPtr,
    pub io_status_block: UserPtr,
    pub buffer: UserPtr,
    pub length: u32,
    /// `PLARGE_INTEGER`, optional
    pub byte_offset: UserPtr,
    /// `PULONG`, optional
    pub key: UserPtr,
}
