use sandtrap_common::status::STATUS_SUCCESS;
use sandtrap_common::wire::CLOSE;
use sandtrap_common::{Handle, NtStatus};

use super::{handle_value, text, Interceptor};
use crate::platform::Platform;
use crate::record::Outcome;
use crate::stats::Counters;

impl<P: Platform> Interceptor<P> {
    /// `NtClose`
    ///
    /// A handle marked at create time gets its file copied into
    /// quarantine while the handle still keeps the file alive. The mark
    /// is taken atomically, so only one of several racing closes does
    /// the capture. The real close always runs.
    pub fn nt_close(&self, handle: Handle) -> NtStatus {
        if let Some(pid) = self.monitored_process() {
            if self.registry.unmark(pid, handle) {
                log::debug!("Call NtClose on marked handle {:#x}", handle);
                Counters::bump(&self.counters.intercepted);

                let name = self.handle_name(handle);
                let dumped = name
                    .as_deref()
                    .and_then(|name| self.capture_evidence(pid, name));

                self.emit(
                    pid,
                    &CLOSE,
                    Outcome::Completed(STATUS_SUCCESS),
                    &[handle_value(handle), text(dumped.as_deref())],
                );
            }
        }

        self.platform.close(handle)
    }
}
