//! Evidence Dump Subsystem
//!
//! Copies a file byte for byte into the quarantine directory before the
//! monitored process gets to destroy it.
//!
//! # Naming
//! `<quarantine_dir>\<pid>_<sequence>_<basename>`, where `sequence` is a
//! six-digit engine-wide counter. A name that already exists is skipped
//! by advancing the counter, up to `max_name_attempts` times.
//!
//! # Failure
//! Any failure after the destination was created discards the partial
//! copy. Callers log the sentinel in place of the destination and carry
//! on; a failed dump never changes an intercepted call's outcome.

use alloc::string::String;
use core::fmt::Write;
use core::sync::atomic::{AtomicU64, Ordering};

use sandtrap_common::status::STATUS_OBJECT_NAME_COLLISION;
use sandtrap_common::ProcessId;

use crate::config::EngineConfig;
use crate::error::DumpError;
use crate::memory::OwnedBuffer;
use crate::platform::EvidenceFs;

/// Basename used when the source path ends in a separator
const UNNAMED: &str = "unnamed";

#[derive(Debug)]
pub struct Dumper {
    quarantine_dir: String,
    max_dump_bytes: u64,
    chunk_len: usize,
    max_name_attempts: u32,
    sequence: AtomicU64,
}

impl Dumper {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            quarantine_dir: config.quarantine_dir.clone(),
            max_dump_bytes: config.max_dump_bytes,
            chunk_len: config.dump_chunk_len.max(1),
            max_name_attempts: config.max_name_attempts.max(1),
            sequence: AtomicU64::new(0),
        }
    }

    /// Copy `source_path` into quarantine and return the copy's path
    pub fn dump<F: EvidenceFs + ?Sized>(
        &self,
        fs: &F,
        pid: ProcessId,
        source_path: &str,
    ) -> Result<String, DumpError> {
        let mut source = fs
            .open_source(source_path)
            .map_err(DumpError::SourceUnreadable)?;
        let (mut sink, destination) = self.create_destination(fs, pid, basename(source_path))?;

        let mut chunk = match OwnedBuffer::zeroed(self.chunk_len) {
            Ok(chunk) => chunk,
            Err(_) => {
                fs.discard(sink);
                return Err(DumpError::Allocation);
            }
        };

        let mut copied: u64 = 0;
        loop {
            let read = match fs.read(&mut source, chunk.as_mut_slice()) {
                Ok(0) => break,
                Ok(read) => read.min(self.chunk_len),
                Err(status) => {
                    fs.discard(sink);
                    return Err(DumpError::SourceUnreadable(status));
                }
            };

            copied += read as u64;
            if copied > self.max_dump_bytes {
                fs.discard(sink);
                return Err(DumpError::TooLarge { limit: self.max_dump_bytes });
            }

            if let Err(status) = fs.write(&mut sink, &chunk[..read]) {
                fs.discard(sink);
                return Err(DumpError::QuarantineUnwritable(status));
            }
        }

        log::debug!("Dumped {} bytes of {} to {}", copied, source_path, destination);
        Ok(destination)
    }

    fn create_destination<F: EvidenceFs + ?Sized>(
        &self,
        fs: &F,
        pid: ProcessId,
        basename: &str,
    ) -> Result<(F::Sink, String), DumpError> {
        for _ in 0..self.max_name_attempts {
            let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
            let destination = self.destination_name(pid, sequence, basename)?;

            match fs.create_exclusive(&destination) {
                Ok(sink) => return Ok((sink, destination)),
                Err(STATUS_OBJECT_NAME_COLLISION) => continue,
                Err(status) => return Err(DumpError::QuarantineUnwritable(status)),
            }
        }
        Err(DumpError::NameCollision { attempts: self.max_name_attempts })
    }

    fn destination_name(
        &self,
        pid: ProcessId,
        sequence: u64,
        basename: &str,
    ) -> Result<String, DumpError> {
        let mut name = String::new();
        // directory, separator, pid, two underscores, sequence
        let capacity = self.quarantine_dir.len() + basename.len() + 48;
        name.try_reserve_exact(capacity)
            .map_err(|_| DumpError::Allocation)?;

        write!(name, "{}\\{}_{:06}_", self.quarantine_dir, pid, sequence)
            .map_err(|_| DumpError::Allocation)?;
        // `:` would address an alternate data stream of the copy
        name.extend(basename.chars().map(|c| if c == ':' { '_' } else { c }));
        Ok(name)
    }
}

/// Last component of an NT or DOS path
fn basename(path: &str) -> &str {
    match path.rsplit(['\\', '/']).next() {
        Some(name) if !name.is_empty() => name,
        _ => UNNAMED,
    }
}
