//! Engine configuration
//!
//! All limits are fixed for the lifetime of an [`Interceptor`](crate::Interceptor).

use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Default values
pub mod defaults {
    /// Maximum length of one rendered record, in bytes
    pub const MAX_RECORD_LEN: usize = 1024;
    /// Maximum number of captured buffer bytes rendered into a record
    pub const BUFFER_LOG_MAX: usize = 256;
    /// Largest object or file name accepted from caller memory, in bytes
    pub const MAX_NAME_BYTES: usize = 0xFFF0;
    /// Directory receiving evidence copies
    pub const QUARANTINE_DIR: &str = "\\??\\C:\\sandtrap\\quarantine";
    /// Largest file copied into quarantine
    pub const MAX_DUMP_BYTES: u64 = 64 * 1024 * 1024;
    /// Copy buffer size used while dumping
    pub const DUMP_CHUNK_LEN: usize = 4096;
    /// Attempts at finding a free quarantine name
    pub const MAX_NAME_ATTEMPTS: u32 = 16;

    /// Guest driver files, guest tools binaries and guest-addition paths
    /// probed by virtual machine detection code
    pub const ARTIFACT_SIGNATURES: &[&str] = &[
        "\\??\\C:\\Windows\\system32\\drivers\\VBoxMouse.sys",
        "\\??\\C:\\Windows\\system32\\drivers\\VBoxGuest.sys",
        "\\??\\C:\\Windows\\system32\\drivers\\VBoxSF.sys",
        "\\??\\C:\\Windows\\system32\\drivers\\VBoxVideo.sys",
        "\\??\\C:\\Windows\\system32\\VBoxControl.exe",
        "\\??\\C:\\Windows\\system32\\VBoxDisp.dll",
        "\\??\\C:\\Windows\\system32\\VBoxHook.dll",
        "\\??\\C:\\Windows\\system32\\VBoxMRXNP.dll",
        "\\??\\C:\\Windows\\system32\\VBoxOGL.dll",
        "\\??\\C:\\Windows\\system32\\VBoxOGLarrayspu.dll",
        "\\??\\C:\\Windows\\system32\\VBoxOGLcrutil.dll",
        "\\??\\C:\\Windows\\system32\\VBoxOGLerrorspu.dll",
        "\\??\\C:\\Windows\\system32\\VBoxOGLfeedbackspu.dll",
        "\\??\\C:\\Windows\\system32\\VBoxOGLpackspu.dll",
        "\\??\\C:\\Windows\\system32\\VBoxOGLpassthroughspu.dll",
        "\\??\\C:\\Windows\\system32\\VBoxService.exe",
        "\\??\\C:\\Windows\\system32\\VBoxTray.exe",
        "\\??\\C:\\Windows\\system32\\drivers\\vmmouse.sys",
        "\\??\\C:\\Windows\\system32\\drivers\\vmhgfs.sys",
        "\\??\\C:\\Program Files\\oracle\\virtualbox guest additions\\",
    ];
}

/// Tunables for one engine instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub max_record_len: usize,
    pub buffer_log_max: usize,
    pub max_name_bytes: usize,
    pub quarantine_dir: String,
    pub max_dump_bytes: u64,
    pub dump_chunk_len: usize,
    pub max_name_attempts: u32,
    pub artifact_signatures: Vec<String>,
    /// Answer artifact probes with "attributes unavailable"
    pub spoof_artifacts: bool,
    /// Copy files into quarantine before deletion
    pub capture_evidence: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_record_len: defaults::MAX_RECORD_LEN,
            buffer_log_max: defaults::BUFFER_LOG_MAX,
            max_name_bytes: defaults::MAX_NAME_BYTES,
            quarantine_dir: defaults::QUARANTINE_DIR.to_string(),
            max_dump_bytes: defaults::MAX_DUMP_BYTES,
            dump_chunk_len: defaults::DUMP_CHUNK_LEN,
            max_name_attempts: defaults::MAX_NAME_ATTEMPTS,
            artifact_signatures: defaults::ARTIFACT_SIGNATURES
                .iter()
                .map(|signature| signature.to_string())
                .collect(),
            spoof_artifacts: true,
            capture_evidence: true,
        }
    }
}

impl EngineConfig {
    pub fn with_quarantine_dir(mut self, dir: impl Into<String>) -> Self {
        self.quarantine_dir = dir.into();
        self
    }

    pub fn with_max_record_len(mut self, len: usize) -> Self {
        self.max_record_len = len;
        self
    }

    pub fn with_buffer_log_max(mut self, len: usize) -> Self {
        self.buffer_log_max = len;
        self
    }

    pub fn with_max_dump_bytes(mut self, limit: u64) -> Self {
        self.max_dump_bytes = limit;
        self
    }

    pub fn with_dump_chunk_len(mut self, len: usize) -> Self {
        self.dump_chunk_len = len.max(1);
        self
    }

    pub fn with_max_name_attempts(mut self, attempts: u32) -> Self {
        self.max_name_attempts = attempts.max(1);
        self
    }

    pub fn with_artifact_spoofing(mut self, enabled: bool) -> Self {
        self.spoof_artifacts = enabled;
        self
    }

    pub fn with_evidence_capture(mut self, enabled: bool) -> Self {
        self.capture_evidence = enabled;
        self
    }

    /// Add a path signature on top of the built-in list
    pub fn with_artifact_signature(mut self, signature: impl Into<String>) -> Self {
        self.artifact_signatures.push(signature.into());
        self
    }
}
