use sandtrap_common::wire::OPEN;
use sandtrap_common::{NtStatus, ShareAccess};

use super::{handle_value, text, Interceptor};
use crate::args::OpenFileArgs;
use crate::platform::Platform;
use crate::record::{Outcome, Value};

impl<P: Platform> Interceptor<P> {
    /// `NtOpenFile`
    ///
    /// Read sharing is always added to the forwarded request so that
    /// evidence capture can later open the file alongside the caller. The
    /// record shows the share mode the caller asked for.
    pub fn nt_open_file(&self, args: &OpenFileArgs) -> NtStatus {
        let Some(pid) = self.monitored_caller() else {
            return self.platform.open_file(args);
        };
        log::debug!("Call NtOpenFile");

        let forwarded = OpenFileArgs {
            share_access: args.share_access | ShareAccess::READ,
            ..*args
        };
        let status = self.platform.open_file(&forwarded);

        let access = Value::Hex8(u64::from(args.desired_access.bits()));
        let options = Value::Hex(args.open_options.bits());
        let share = Value::Hex(args.share_access.bits());

        let accessor = self.accessor();
        let captured = accessor.read_handle(args.file_handle).and_then(|handle| {
            accessor
                .read_object_attributes(args.object_attributes)
                .map(|object| (handle, object))
        });

        let (handle, object) = match captured {
            Ok(captured) => captured,
            Err(error) => {
                self.emit_fault(
                    pid,
                    &OPEN,
                    &error,
                    &[Value::Sentinel, access, options, share, Value::Sentinel],
                );
                return status;
            }
        };
        let path = self.object_path(object);

        self.emit(
            pid,
            &OPEN,
            Outcome::Completed(status),
            &[handle_value(handle), access, options, share, text(path.as_deref())],
        );
        status
    }
}
