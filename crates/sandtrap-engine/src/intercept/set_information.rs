use sandtrap_common::flags::{info_class, FILE_DISPOSITION_DELETE};
use sandtrap_common::layout::file_rename_information;
use sandtrap_common::status::STATUS_SUCCESS;
use sandtrap_common::wire::{DISPOSITION_DELETE, RENAME};
use sandtrap_common::{Handle, NtStatus, ProcessId, UserPtr};

use super::{handle_value, text, Interceptor};
use crate::args::SetInformationArgs;
use crate::config::defaults::MAX_NAME_BYTES;
use crate::error::{CaptureError, Fault};
use crate::memory::{le_u32, le_usize, ObjectName};
use crate::platform::Platform;
use crate::record::{Outcome, Value};
use crate::stats::Counters;

impl<P: Platform> Interceptor<P> {
    /// `NtSetInformationFile`
    ///
    /// Disposition requests that enable deletion are answered with
    /// success and never forwarded: the file is copied to quarantine and
    /// stays on disk. Renames are forwarded and logged with both names.
    /// Every other information class passes straight through.
    pub fn nt_set_information_file(&self, args: &SetInformationArgs) -> NtStatus {
        let Some(pid) = self.monitored_process() else {
            return self.platform.set_information_file(args);
        };

        match args.information_class {
            info_class::FILE_DISPOSITION_INFORMATION
            | info_class::FILE_DISPOSITION_INFORMATION_EX => self.set_disposition(pid, args),
            info_class::FILE_RENAME_INFORMATION | info_class::FILE_RENAME_INFORMATION_EX => {
                Counters::bump(&self.counters.intercepted);
                self.rename(pid, args)
            }
            _ => self.platform.set_information_file(args),
        }
    }

    fn set_disposition(&self, pid: ProcessId, args: &SetInformationArgs) -> NtStatus {
        log::debug!("Call NtSetInformationFile (disposition)");
        let accessor = self.accessor();

        let delete = if args.information_class == info_class::FILE_DISPOSITION_INFORMATION {
            accessor
                .read_u8(args.file_information)
                .map(|delete_file| delete_file != 0)
        } else {
            accessor
                .read_u32(args.file_information)
                .map(|flags| flags & FILE_DISPOSITION_DELETE != 0)
        };

        if !matches!(delete, Ok(false)) {
            Counters::bump(&self.counters.intercepted);
        }

        match delete {
            Err(error) => {
                self.emit_fault(
                    pid,
                    &DISPOSITION_DELETE,
                    &error,
                    &[Value::Sentinel, Value::Sentinel],
                );
                self.platform.set_information_file(args)
            }
            Ok(false) => self.platform.set_information_file(args),
            Ok(true) => {
                let name = self.handle_name(args.file_handle);
                let dumped = name.as_deref().and_then(|name| {
                    // the caller's handle is gone before the copy is taken
                    let released = self.platform.release_handle(args.file_handle);
                    log::debug!("Released {:#x} early: {:#x}", args.file_handle, released);
                    // the value may be reused once released
                    if self.registry.unmark(pid, args.file_handle) {
                        log::debug!("Dropped mark on {:#x}", args.file_handle);
                    }
                    self.capture_evidence(pid, name)
                });

                Counters::bump(&self.counters.deletions_suppressed);
                self.emit(
                    pid,
                    &DISPOSITION_DELETE,
                    Outcome::Completed(STATUS_SUCCESS),
                    &[text(name.as_deref()), text(dumped.as_deref())],
                );
                STATUS_SUCCESS
            }
        }
    }

    fn rename(&self, pid: ProcessId, args: &SetInformationArgs) -> NtStatus {
        log::debug!("Call NtSetInformationFile (rename)");

        // resolved first: once the rename succeeds the handle names the target
        let original = self.handle_name(args.file_handle);
        let status = self.platform.set_information_file(args);

        let handle = handle_value(args.file_handle);
        let class = Value::Int(i64::from(args.information_class));

        let target = match self.read_rename_target(args.file_information) {
            Ok(target) => target,
            Err(error) => {
                self.emit_fault(
                    pid,
                    &RENAME,
                    &error,
                    &[handle, text(original.as_deref()), Value::Sentinel, class],
                );
                return status;
            }
        };

        let renamed = self.object_path(target);

        self.emit(
            pid,
            &RENAME,
            Outcome::Completed(status),
            &[handle, text(original.as_deref()), text(renamed.as_deref()), class],
        );
        status
    }

    /// Destination of a rename, from `FILE_RENAME_INFORMATION`
    fn read_rename_target(&self, info: UserPtr) -> Result<ObjectName, CaptureError> {
        let accessor = self.accessor();
        let header = accessor.read_foreign(info, file_rename_information::FILE_NAME)?;

        let root = Handle(le_usize(&header, file_rename_information::ROOT_DIRECTORY));
        let name_len = le_u32(&header, file_rename_information::FILE_NAME_LENGTH) as usize;

        let name_ptr = info
            .offset(file_rename_information::FILE_NAME)
            .ok_or(Fault::AccessViolation { address: info.0, len: name_len })?;
        let name = accessor.read_utf16(name_ptr, name_len.min(MAX_NAME_BYTES))?;

        Ok(ObjectName { root, name })
    }
}
