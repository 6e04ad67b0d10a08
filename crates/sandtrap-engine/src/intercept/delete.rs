use sandtrap_common::status::STATUS_SUCCESS;
use sandtrap_common::wire::DELETE;
use sandtrap_common::NtStatus;

use super::{text, Interceptor};
use crate::args::DeleteFileArgs;
use crate::platform::Platform;
use crate::record::{Outcome, Value};
use crate::stats::Counters;

impl<P: Platform> Interceptor<P> {
    /// `NtDeleteFile`
    ///
    /// For a monitored caller the real service is never invoked. The file
    /// is copied to quarantine and success is reported, including when
    /// the arguments could not be read.
    pub fn nt_delete_file(&self, args: &DeleteFileArgs) -> NtStatus {
        let Some(pid) = self.monitored_caller() else {
            return self.platform.delete_file(args);
        };
        log::debug!("Call NtDeleteFile");
        Counters::bump(&self.counters.deletions_suppressed);

        let object = match self.accessor().read_object_attributes(args.object_attributes) {
            Ok(object) => object,
            Err(error) => {
                self.emit_fault(pid, &DELETE, &error, &[Value::Sentinel, Value::Sentinel]);
                return STATUS_SUCCESS;
            }
        };

        let path = self.object_path(object);
        let dumped = path
            .as_deref()
            .and_then(|path| self.capture_evidence(pid, path));

        self.emit(
            pid,
            &DELETE,
            Outcome::Completed(STATUS_SUCCESS),
            &[text(path.as_deref()), text(dumped.as_deref())],
        );
        STATUS_SUCCESS
    }
}
