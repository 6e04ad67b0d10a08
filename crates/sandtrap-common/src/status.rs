//! NTSTATUS values used by the interception engine
//!
//! Only the handful of codes the engine produces or inspects are listed.
//! Values are kept as `i32` so they render with the sign the collector
//! expects (`0xC0000005` is logged as `-1073741819`).

/// Raw NTSTATUS value
pub type NtStatus = i32;

pub const STATUS_SUCCESS: NtStatus = 0;
pub const STATUS_PENDING: NtStatus = 0x0000_0103;
pub const STATUS_DATATYPE_MISALIGNMENT: NtStatus = 0x8000_0002_u32 as i32;
pub const STATUS_UNSUCCESSFUL: NtStatus = 0xC000_0001_u32 as i32;
pub const STATUS_ACCESS_VIOLATION: NtStatus = 0xC000_0005_u32 as i32;
pub const STATUS_INVALID_HANDLE: NtStatus = 0xC000_0008_u32 as i32;
pub const STATUS_INVALID_PARAMETER: NtStatus = 0xC000_000D_u32 as i32;
pub const STATUS_END_OF_FILE: NtStatus = 0xC000_0011_u32 as i32;
pub const STATUS_NO_MEMORY: NtStatus = 0xC000_0017_u32 as i32;
pub const STATUS_ACCESS_DENIED: NtStatus = 0xC000_0022_u32 as i32;
pub const STATUS_OBJECT_NAME_NOT_FOUND: NtStatus = 0xC000_0034_u32 as i32;
pub const STATUS_OBJECT_NAME_COLLISION: NtStatus = 0xC000_0035_u32 as i32;
pub const STATUS_INSUFFICIENT_RESOURCES: NtStatus = 0xC000_009A_u32 as i32;
pub const STATUS_FILE_TOO_LARGE: NtStatus = 0xC000_0904_u32 as i32;

/// Status handed back to a caller probing for hypervisor artifacts.
///
/// The file is reported the same way a genuinely absent file would be.
pub const STATUS_ATTRIBUTES_UNAVAILABLE: NtStatus = STATUS_OBJECT_NAME_NOT_FOUND;

/// Equivalent of the `NT_SUCCESS` macro
#[inline]
pub const fn nt_success(status: NtStatus) -> bool {
    status >= 0
}
