//! Interception Handlers
//!
//! One entry point per intercepted system service, each with the exact
//! argument list and return type of the service it replaces.
//!
//! # Shape of a handler
//! 1. Capability check, once: the caller must be a monitored process and
//!    its previous mode must be user mode. Otherwise the real service is
//!    called with the untouched arguments and its status returned as is.
//! 2. Capture: parameters are copied through the [`Accessor`]. A fault
//!    produces one error record and the real status is returned.
//! 3. Policy: spoofing, request rewriting, evidence capture.
//! 4. One record through the [`LogSink`](crate::platform::LogSink).
//!
//! Only three paths change what the caller observes: an artifact probe
//! answered with "attributes unavailable", and the two delete paths that
//! report success without deleting.

mod attributes;
mod close;
mod create;
mod delete;
mod device_control;
mod io;
mod open;
mod set_information;

pub use create::{rewrite_create, RewrittenCreate};

use alloc::string::String;

use sandtrap_common::wire::RecordLayout;
use sandtrap_common::{Handle, InterceptStats, ProcessId, ProcessorMode};

use crate::artifacts::ArtifactMatcher;
use crate::config::EngineConfig;
use crate::dump::Dumper;
use crate::error::CaptureError;
use crate::memory::{Accessor, ObjectName};
use crate::path;
use crate::platform::Platform;
use crate::record::{Outcome, RecordEncoder, Value};
use crate::registry::Registry;
use crate::stats::Counters;

/// The interception engine
pub struct Interceptor<P> {
    platform: P,
    registry: Registry,
    config: EngineConfig,
    artifacts: ArtifactMatcher,
    dumper: Dumper,
    encoder: RecordEncoder,
    counters: Counters,
}

impl<P: Platform> Interceptor<P> {
    pub fn new(platform: P, config: EngineConfig) -> Self {
        let artifacts = ArtifactMatcher::new(&config.artifact_signatures);
        let dumper = Dumper::new(&config);
        let encoder = RecordEncoder::new(config.max_record_len, config.buffer_log_max);

        Self {
            platform,
            registry: Registry::new(),
            config,
            artifacts,
            dumper,
            encoder,
            counters: Counters::default(),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Monitored processes and handles marked for capture
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> InterceptStats {
        self.counters.snapshot()
    }

    /// Process on whose behalf a handler may act, if any
    fn monitored_process(&self) -> Option<ProcessId> {
        if self.platform.previous_mode() == ProcessorMode::Kernel {
            return None;
        }
        let pid = self.platform.current_process_id();
        self.registry.is_monitored(pid).then_some(pid)
    }

    /// [`monitored_process`](Self::monitored_process) for handlers that
    /// always act on a monitored call, counted as intercepted
    fn monitored_caller(&self) -> Option<ProcessId> {
        let pid = self.monitored_process()?;
        Counters::bump(&self.counters.intercepted);
        Some(pid)
    }

    fn accessor(&self) -> Accessor<'_, P> {
        Accessor::new(&self.platform, self.config.max_name_bytes)
    }

    fn emit(&self, pid: ProcessId, layout: &RecordLayout, outcome: Outcome, values: &[Value<'_>]) {
        let record = self.encoder.encode(layout, outcome, values);
        if record.is_fallback() {
            log::error!("{}: record buffer unavailable, sending fallback", layout.signature);
            Counters::bump(&self.counters.fallback_records);
        }
        self.platform.emit_log(pid, layout.signature, record.as_str());
        Counters::bump(&self.counters.records_emitted);
    }

    /// Error record for a failed parameter capture
    fn emit_fault(
        &self,
        pid: ProcessId,
        layout: &RecordLayout,
        error: &CaptureError,
        values: &[Value<'_>],
    ) {
        log::warn!("{}: parameter capture failed: {}", layout.signature, error);
        Counters::bump(&self.counters.capture_faults);
        self.emit(pid, layout, Outcome::Faulted(error.code()), values);
    }

    /// Name of the object behind `handle`, `None` when it cannot be resolved
    fn handle_name(&self, handle: Handle) -> Option<String> {
        match self.platform.resolve_name(handle) {
            Ok(name) => Some(name),
            Err(error) => {
                log::warn!("Cannot resolve name of handle {:#x}: {}", handle, error);
                None
            }
        }
    }

    /// Full path of a captured `OBJECT_ATTRIBUTES`
    fn object_path(&self, object: ObjectName) -> Option<String> {
        let root = object.root;
        match path::reconstruct(&self.platform, root, object.name) {
            Ok(path) => Some(path),
            Err(error) => {
                log::warn!("Cannot rebuild path under root {:#x}: {}", root, error);
                None
            }
        }
    }

    /// Copy `source` into quarantine, returning the copy's path
    fn capture_evidence(&self, pid: ProcessId, source: &str) -> Option<String> {
        if !self.config.capture_evidence {
            return None;
        }
        match self.dumper.dump(&self.platform, pid, source) {
            Ok(destination) => {
                Counters::bump(&self.counters.evidence_captured);
                Some(destination)
            }
            Err(error) => {
                log::warn!("Evidence capture of {} failed: {}", source, error);
                Counters::bump(&self.counters.evidence_failed);
                None
            }
        }
    }
}

/// Text value, or the sentinel when it could not be resolved
fn text(value: Option<&str>) -> Value<'_> {
    value.map_or(Value::Sentinel, Value::Str)
}

fn handle_value(handle: Handle) -> Value<'static> {
    Value::Hex8(handle.0 as u64)
}
