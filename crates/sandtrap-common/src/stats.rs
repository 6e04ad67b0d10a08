/// Engine statistics - shared between kernel and user mode
///
/// Evidence failures are counted here rather than reflected in any
/// caller-visible status.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterceptStats {
    /// Monitored calls a handler logged or rewrote; silent passthroughs
    /// (closes of unmarked handles, other information classes) are not counted
    pub intercepted: u64,
    /// Records handed to the log sink (including fallbacks)
    pub records_emitted: u64,
    /// Records replaced by the pre-formatted fallback
    pub fallback_records: u64,
    /// Parameter captures that faulted
    pub capture_faults: u64,
    /// Evidence copies written to quarantine
    pub evidence_captured: u64,
    /// Evidence copies that failed
    pub evidence_failed: u64,
    /// Query-attributes calls answered with a spoofed status
    pub artifacts_spoofed: u64,
    /// Deletions reported as successful without being performed
    pub deletions_suppressed: u64,
    /// Handles marked for deferred evidence capture
    pub handles_marked: u64,
}
