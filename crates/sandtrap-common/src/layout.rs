//! Byte layouts of the x64 NT structures read out of caller memory
//!
//! The engine never casts caller memory to a Rust struct. It copies a
//! structure's bytes into a kernel buffer and decodes fields at these
//! offsets, so a structure that changes under our feet can at worst yield
//! a stale value, never a dangling reference.

/// `UNICODE_STRING`
pub mod unicode_string {
    pub const SIZE: usize = 16;
    /// `USHORT Length` (bytes, not characters)
    pub const LENGTH: usize = 0;
    /// `USHORT MaximumLength`
    pub const MAXIMUM_LENGTH: usize = 2;
    /// `PWSTR Buffer`
    pub const BUFFER: usize = 8;
}

/// `OBJECT_ATTRIBUTES`
pub mod object_attributes {
    pub const SIZE: usize = 48;
    pub const LENGTH: usize = 0;
    /// `HANDLE RootDirectory`
    pub const ROOT_DIRECTORY: usize = 8;
    /// `PUNICODE_STRING ObjectName`
    pub const OBJECT_NAME: usize = 16;
    pub const ATTRIBUTES: usize = 24;
}

/// `IO_STATUS_BLOCK`
pub mod io_status_block {
    pub const SIZE: usize = 16;
    pub const STATUS: usize = 0;
    /// `ULONG_PTR Information` (bytes transferred for read/write)
    pub const INFORMATION: usize = 8;
}

/// `FILE_RENAME_INFORMATION` (and the `Ex` variant, which shares it)
pub mod file_rename_information {
    /// Offset of the variable-length name; also the fixed header size
    pub const FILE_NAME: usize = 20;
    pub const FLAGS: usize = 0;
    pub const ROOT_DIRECTORY: usize = 8;
    /// `ULONG FileNameLength` (bytes)
    pub const FILE_NAME_LENGTH: usize = 16;
}

/// `FILE_DISPOSITION_INFORMATION`
pub mod file_disposition_information {
    pub const SIZE: usize = 1;
    /// `BOOLEAN DeleteFile`
    pub const DELETE_FILE: usize = 0;
}

/// `FILE_DISPOSITION_INFORMATION_EX`
pub mod file_disposition_information_ex {
    pub const SIZE: usize = 4;
    /// `ULONG Flags`
    pub const FLAGS: usize = 0;
}

/// Size of a `HANDLE` as written to a `PHANDLE` out-parameter
pub const HANDLE_SIZE: usize = 8;

/// Size of a `LARGE_INTEGER`
pub const LARGE_INTEGER_SIZE: usize = 8;
