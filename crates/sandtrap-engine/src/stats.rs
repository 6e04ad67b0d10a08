//! Engine counters

use core::sync::atomic::{AtomicU64, Ordering};

use sandtrap_common::InterceptStats;

#[derive(Debug, Default)]
pub struct Counters {
    pub intercepted: AtomicU64,
    pub records_emitted: AtomicU64,
    pub fallback_records: AtomicU64,
    pub capture_faults: AtomicU64,
    pub evidence_captured: AtomicU64,
    pub evidence_failed: AtomicU64,
    pub artifacts_spoofed: AtomicU64,
    pub deletions_suppressed: AtomicU64,
    pub handles_marked: AtomicU64,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> InterceptStats {
        InterceptStats {
            intercepted: self.intercepted.load(Ordering::Relaxed),
            records_emitted: self.records_emitted.load(Ordering::Relaxed),
            fallback_records: self.fallback_records.load(Ordering::Relaxed),
            capture_faults: self.capture_faults.load(Ordering::Relaxed),
            evidence_captured: self.evidence_captured.load(Ordering::Relaxed),
            evidence_failed: self.evidence_failed.load(Ordering::Relaxed),
            artifacts_spoofed: self.artifacts_spoofed.load(Ordering::Relaxed),
            deletions_suppressed: self.deletions_suppressed.load(Ordering::Relaxed),
            handles_marked: self.handles_marked.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_bumps() {
        let counters = Counters::default();
        Counters::bump(&counters.intercepted);
        Counters::bump(&counters.intercepted);
        Counters::bump(&counters.evidence_failed);

        let stats = counters.snapshot();
        assert_eq!(stats.intercepted, 2);
        assert_eq!(stats.evidence_failed, 1);
        assert_eq!(stats.records_emitted, 0);
    }
}
