//! Access, share and create-option flag sets
//!
//! Every set keeps unknown bits (`from_bits_retain`) so that a request can
//! be rewritten and forwarded without losing flags we do not name.

use bitflags::bitflags;

bitflags! {
    /// `ACCESS_MASK` bits relevant to file objects
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessMask: u32 {
        const FILE_READ_DATA = 0x0000_0001;
        const FILE_WRITE_DATA = 0x0000_0002;
        const FILE_APPEND_DATA = 0x0000_0004;
        const FILE_READ_EA = 0x0000_0008;
        const FILE_WRITE_EA = 0x0000_0010;
        const FILE_EXECUTE = 0x0000_0020;
        const FILE_READ_ATTRIBUTES = 0x0000_0080;
        const FILE_WRITE_ATTRIBUTES = 0x0000_0100;
        const DELETE = 0x0001_0000;
        const READ_CONTROL = 0x0002_0000;
        const WRITE_DAC = 0x0004_0000;
        const WRITE_OWNER = 0x0008_0000;
        const SYNCHRONIZE = 0x0010_0000;
        const GENERIC_ALL = 0x1000_0000;
        const GENERIC_EXECUTE = 0x2000_0000;
        const GENERIC_WRITE = 0x4000_0000;
        const GENERIC_READ = 0x8000_0000;

        const _ = !0;
    }
}

bitflags! {
    /// `ShareAccess` argument of `NtCreateFile`/`NtOpenFile`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShareAccess: u32 {
        const READ = 0x0000_0001;
        const WRITE = 0x0000_0002;
        const DELETE = 0x0000_0004;

        const _ = !0;
    }
}

bitflags! {
    /// `CreateOptions`/`OpenOptions` argument
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CreateOptions: u32 {
        const DIRECTORY_FILE = 0x0000_0001;
        const WRITE_THROUGH = 0x0000_0002;
        const SEQUENTIAL_ONLY = 0x0000_0004;
        const SYNCHRONOUS_IO_ALERT = 0x0000_0010;
        const SYNCHRONOUS_IO_NONALERT = 0x0000_0020;
        const NON_DIRECTORY_FILE = 0x0000_0040;
        const DELETE_ON_CLOSE = 0x0000_1000;
        const OPEN_BY_FILE_ID = 0x0000_2000;
        const OPEN_REPARSE_POINT = 0x0020_0000;

        const _ = !0;
    }
}

/// `FILE_INFORMATION_CLASS` values handled by `NtSetInformationFile`
pub mod info_class {
    pub const FILE_RENAME_INFORMATION: u32 = 10;
    pub const FILE_DISPOSITION_INFORMATION: u32 = 13;
    pub const FILE_DISPOSITION_INFORMATION_EX: u32 = 64;
    pub const FILE_RENAME_INFORMATION_EX: u32 = 65;
}

/// `FILE_DISPOSITION_INFORMATION_EX.Flags` bit requesting deletion
pub const FILE_DISPOSITION_DELETE: u32 = 0x0000_0001;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_bits_survive_removal() {
        let mut options = CreateOptions::from_bits_retain(0x8000_1040);
        options.remove(CreateOptions::DELETE_ON_CLOSE);
        assert_eq!(options.bits(), 0x8000_0040);
    }
}
