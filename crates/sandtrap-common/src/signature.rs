//! API signatures attached to every emitted record
//!
//! The collector uses the signature to pick the record layout and the API
//! name it reports. Numeric ids are part of the transport contract and
//! must never be renumbered.

use core::fmt;

#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signature {
    NtQueryAttributesFile = 1,
    NtDeviceIoControlFile = 2,
    NtClose = 3,
    NtSetInformationFile = 4,
    /// Disposition-delete through `NtSetInformationFile`, reported under the
    /// Win32 API name the collector groups deletions by
    DeleteFileW = 5,
    NtOpenFile = 6,
    NtDeleteFile = 7,
    NtCreateFile = 8,
    NtReadFile = 9,
    NtWriteFile = 10,
}

impl Signature {
    pub const ALL: [Signature; 10] = [
        Signature::NtQueryAttributesFile,
        Signature::NtDeviceIoControlFile,
        Signature::NtClose,
        Signature::NtSetInformationFile,
        Signature::DeleteFileW,
        Signature::NtOpenFile,
        Signature::NtDeleteFile,
        Signature::NtCreateFile,
        Signature::NtReadFile,
        Signature::NtWriteFile,
    ];

    pub const fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Option<Signature> {
        Self::ALL.iter().copied().find(|signature| signature.id() == id)
    }

    /// Module-qualified API name, e.g. `ntdll.NtCreateFile`
    pub const fn api_name(self) -> &'static str {
        match self {
            Signature::NtQueryAttributesFile => "ntdll.NtQueryAttributesFile",
            Signature::NtDeviceIoControlFile => "ntdll.NtDeviceIoControlFile",
            Signature::NtClose => "ntdll.NtClose",
            Signature::NtSetInformationFile => "ntdll.NtSetInformationFile",
            Signature::DeleteFileW => "kernel32.DeleteFileW",
            Signature::NtOpenFile => "ntdll.NtOpenFile",
            Signature::NtDeleteFile => "ntdll.NtDeleteFile",
            Signature::NtCreateFile => "ntdll.NtCreateFile",
            Signature::NtReadFile => "ntdll.NtReadFile",
            Signature::NtWriteFile => "ntdll.NtWriteFile",
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}
