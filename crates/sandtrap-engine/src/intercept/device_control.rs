use sandtrap_common::status::STATUS_SUCCESS;
use sandtrap_common::wire::DEVICE_IO_CONTROL;
use sandtrap_common::NtStatus;

use super::{handle_value, Interceptor};
use crate::args::DeviceIoControlArgs;
use crate::platform::Platform;
use crate::record::{Outcome, Value};

impl<P: Platform> Interceptor<P> {
    /// `NtDeviceIoControlFile`
    ///
    /// Logs the control code and the input buffer. The output buffer is
    /// only meaningful once the request completed synchronously, so it is
    /// captured only on `STATUS_SUCCESS`, and only as many bytes as the
    /// driver reported in `IoStatusBlock.Information`.
    pub fn nt_device_io_control_file(&self, args: &DeviceIoControlArgs) -> NtStatus {
        let status = self.platform.device_io_control_file(args);
        let Some(pid) = self.monitored_caller() else {
            return status;
        };
        log::debug!("Call NtDeviceIoControlFile");

        let handle = handle_value(args.file_handle);
        let code = Value::Hex8(u64::from(args.io_control_code));
        let limit = self.config.buffer_log_max;
        let accessor = self.accessor();

        let input_len = (args.input_buffer_length as usize).min(limit);
        let input = match accessor.read_foreign(args.input_buffer, input_len) {
            Ok(input) => input,
            Err(error) => {
                self.emit_fault(
                    pid,
                    &DEVICE_IO_CONTROL,
                    &error,
                    &[Value::Sentinel, handle, code, Value::Sentinel],
                );
                return status;
            }
        };

        let output = if status == STATUS_SUCCESS {
            let captured = accessor
                .read_io_information(args.io_status_block)
                .and_then(|transferred| {
                    let len = transferred
                        .min(args.output_buffer_length as usize)
                        .min(limit);
                    accessor.read_foreign(args.output_buffer, len)
                });
            match captured {
                Ok(output) => Some(output),
                Err(error) => {
                    self.emit_fault(
                        pid,
                        &DEVICE_IO_CONTROL,
                        &error,
                        &[Value::Bytes(&input), handle, code, Value::Sentinel],
                    );
                    return status;
                }
            }
        } else {
            None
        };

        let output = output.as_deref().map_or(Value::Sentinel, Value::Bytes);
        self.emit(
            pid,
            &DEVICE_IO_CONTROL,
            Outcome::Completed(status),
            &[Value::Bytes(&input), handle, code, output],
        );
        status
    }
}
