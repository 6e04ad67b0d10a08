use sandtrap_common::status::STATUS_ATTRIBUTES_UNAVAILABLE;
use sandtrap_common::wire::QUERY_ATTRIBUTES;
use sandtrap_common::NtStatus;

use super::{text, Interceptor};
use crate::args::QueryAttributesArgs;
use crate::platform::Platform;
use crate::record::{Outcome, Value};
use crate::stats::Counters;

impl<P: Platform> Interceptor<P> {
    /// `NtQueryAttributesFile`
    ///
    /// Probes for hypervisor guest files are answered with "attributes
    /// unavailable" whatever the real call returned. The
    /// `FileInformation` the real call may have filled is left as is.
    pub fn nt_query_attributes_file(&self, args: &QueryAttributesArgs) -> NtStatus {
        let status = self.platform.query_attributes_file(args);
        let Some(pid) = self.monitored_caller() else {
            return status;
        };
        log::debug!("Call NtQueryAttributesFile");

        let object = match self.accessor().read_object_attributes(args.object_attributes) {
            Ok(object) => object,
            Err(error) => {
                self.emit_fault(pid, &QUERY_ATTRIBUTES, &error, &[Value::Sentinel]);
                return status;
            }
        };
        let path = self.object_path(object);

        let matched = match path.as_deref() {
            Some(path) if self.config.spoof_artifacts => self.artifacts.find(path),
            _ => None,
        };

        if let Some(signature) = matched {
            log::debug!("Artifact probe matched {}", signature);
            Counters::bump(&self.counters.artifacts_spoofed);
            self.emit(
                pid,
                &QUERY_ATTRIBUTES,
                Outcome::Completed(STATUS_ATTRIBUTES_UNAVAILABLE),
                &[text(path.as_deref())],
            );
            return STATUS_ATTRIBUTES_UNAVAILABLE;
        }

        self.emit(pid, &QUERY_ATTRIBUTES, Outcome::Completed(status), &[text(path.as_deref())]);
        status
    }
}
