//! Error types for the interception engine
//!
//! None of these ever reach the monitored process. They decide which
//! sentinel lands in a record and which status slot the record carries.

use sandtrap_common::status::{
    NtStatus, STATUS_ACCESS_VIOLATION, STATUS_FILE_TOO_LARGE, STATUS_INSUFFICIENT_RESOURCES,
    STATUS_OBJECT_NAME_COLLISION,
};

/// Caller memory could not be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    /// Address is null, outside the caller's range, unmapped, or wraps
    #[error("access violation reading {len} bytes at {address:#x}")]
    AccessViolation { address: usize, len: usize },

    /// Any other failure reported by the platform copy routine
    #[error("foreign read failed with status {0:#010x}")]
    Status(NtStatus),
}

impl Fault {
    /// Exception code this fault corresponds to
    pub fn code(&self) -> NtStatus {
        match self {
            Fault::AccessViolation { .. } => STATUS_ACCESS_VIOLATION,
            Fault::Status(code) => *code,
        }
    }
}

/// Failure while capturing a call parameter into kernel memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error(transparent)]
    Fault(#[from] Fault),

    #[error("no memory for a {0}-byte capture buffer")]
    Allocation(usize),
}

impl CaptureError {
    pub fn code(&self) -> NtStatus {
        match self {
            CaptureError::Fault(fault) => fault.code(),
            CaptureError::Allocation(_) => STATUS_INSUFFICIENT_RESOURCES,
        }
    }
}

/// A handle's object name could not be obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("name query failed with status {0:#010x}")]
    Query(NtStatus),

    #[error("object has no name")]
    Unnamed,

    #[error("no memory to hold the object name")]
    Allocation,
}

/// Evidence capture could not complete
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DumpError {
    #[error("source cannot be read: status {0:#010x}")]
    SourceUnreadable(NtStatus),

    #[error("quarantine cannot be written: status {0:#010x}")]
    QuarantineUnwritable(NtStatus),

    #[error("no free quarantine name after {attempts} attempts")]
    NameCollision { attempts: u32 },

    #[error("source exceeds the {limit}-byte evidence limit")]
    TooLarge { limit: u64 },

    #[error("no memory for evidence copy")]
    Allocation,
}

impl DumpError {
    pub fn code(&self) -> NtStatus {
        match self {
            DumpError::SourceUnreadable(code) | DumpError::QuarantineUnwritable(code) => *code,
            DumpError::NameCollision { .. } => STATUS_OBJECT_NAME_COLLISION,
            DumpError::TooLarge { .. } => STATUS_FILE_TOO_LARGE,
            DumpError::Allocation => STATUS_INSUFFICIENT_RESOURCES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn fault_codes_match_exception_codes() {
        let fault = Fault::AccessViolation { address: 0, len: 16 };
        assert_eq!(fault.code(), STATUS_ACCESS_VIOLATION);
        assert_eq!(CaptureError::from(fault).code(), STATUS_ACCESS_VIOLATION);
        assert_eq!(Fault::Status(-1).code(), -1);
        assert_eq!(
            CaptureError::Allocation(64).code(),
            STATUS_INSUFFICIENT_RESOURCES
        );
    }

    #[test]
    fn messages_render_hex_status() {
        let error = DumpError::SourceUnreadable(STATUS_ACCESS_VIOLATION);
        assert_eq!(error.to_string(), "source cannot be read: status 0xc0000005");
    }
}
