use sandtrap_common::status::STATUS_SUCCESS;
use sandtrap_common::wire::{RecordLayout, READ, WRITE};
use sandtrap_common::{NtStatus, ProcessId};

use super::{handle_value, Interceptor};
use crate::args::FileIoArgs;
use crate::error::CaptureError;
use crate::memory::OwnedBuffer;
use crate::platform::Platform;
use crate::record::{Outcome, Value};

impl<P: Platform> Interceptor<P> {
    /// `NtReadFile`
    pub fn nt_read_file(&self, args: &FileIoArgs) -> NtStatus {
        let status = self.platform.read_file(args);
        if let Some(pid) = self.monitored_caller() {
            log::debug!("Call NtReadFile");
            self.log_transfer(pid, &READ, args, status);
        }
        status
    }

    /// `NtWriteFile`
    pub fn nt_write_file(&self, args: &FileIoArgs) -> NtStatus {
        let status = self.platform.write_file(args);
        if let Some(pid) = self.monitored_caller() {
            log::debug!("Call NtWriteFile");
            self.log_transfer(pid, &WRITE, args, status);
        }
        status
    }

    /// Record the bytes a completed read or write moved
    ///
    /// Bytes are taken from `IoStatusBlock.Information` only when the
    /// call completed with `STATUS_SUCCESS`; pending or failed transfers
    /// log an empty buffer.
    fn log_transfer(
        &self,
        pid: ProcessId,
        layout: &RecordLayout,
        args: &FileIoArgs,
        status: NtStatus,
    ) {
        let handle = handle_value(args.file_handle);
        let length = Value::Int(i64::from(args.length));

        match self.capture_transfer(args, status) {
            Ok((data, offset)) => self.emit(
                pid,
                layout,
                Outcome::Completed(status),
                &[handle, length, Value::Bytes(&data), Value::Int(offset)],
            ),
            Err(error) => self.emit_fault(
                pid,
                layout,
                &error,
                &[handle, length, Value::Sentinel, Value::Sentinel],
            ),
        }
    }

    fn capture_transfer(
        &self,
        args: &FileIoArgs,
        status: NtStatus,
    ) -> Result<(OwnedBuffer, i64), CaptureError> {
        let accessor = self.accessor();

        let offset = if args.byte_offset.is_null() {
            0
        } else {
            accessor.read_i64(args.byte_offset)?
        };

        let transferred = if status == STATUS_SUCCESS {
            accessor.read_io_information(args.io_status_block)?
        } else {
            0
        };
        let len = transferred
            .min(args.length as usize)
            .min(self.config.buffer_log_max);
        let data = accessor.read_foreign(args.buffer, len)?;

        Ok((data, offset))
    }
}
