use sandtrap_common::wire::CREATE;
use sandtrap_common::{nt_success, AccessMask, CreateOptions, NtStatus, ShareAccess};

use super::{handle_value, text, Interceptor};
use crate::args::CreateFileArgs;
use crate::platform::Platform;
use crate::record::{Outcome, Value};
use crate::stats::Counters;

/// Request actually sent to the file system for a monitored create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewrittenCreate {
    pub desired_access: AccessMask,
    pub create_options: CreateOptions,
    pub share_access: ShareAccess,
    /// Delete-on-close was stripped; the resulting handle must be marked
    pub deferred_delete: bool,
}

/// Strip self-deletion from a create request
///
/// Delete-on-close together with delete access is removed, leaving
/// `FILE_READ_DATA` if stripping delete access leaves no right at all.
/// Other requests keep their access and options. Read sharing is added.
pub fn rewrite_create(
    desired_access: AccessMask,
    create_options: CreateOptions,
    share_access: ShareAccess,
) -> RewrittenCreate {
    let deferred_delete = create_options.contains(CreateOptions::DELETE_ON_CLOSE)
        && desired_access.contains(AccessMask::DELETE);

    let (access, options) = if deferred_delete {
        let access = desired_access - AccessMask::DELETE;
        (
            if access.is_empty() { AccessMask::FILE_READ_DATA } else { access },
            create_options - CreateOptions::DELETE_ON_CLOSE,
        )
    } else {
        (desired_access, create_options)
    };

    RewrittenCreate {
        desired_access: access,
        create_options: options,
        share_access: share_access | ShareAccess::READ,
        deferred_delete,
    }
}

impl<P: Platform> Interceptor<P> {
    /// `NtCreateFile`
    ///
    /// A create asking for both delete access and delete-on-close would
    /// let the file vanish behind our back; both are stripped and the new
    /// handle is marked so that its close captures the file instead. The
    /// record shows the request as the caller made it.
    pub fn nt_create_file(&self, args: &CreateFileArgs) -> NtStatus {
        let Some(pid) = self.monitored_caller() else {
            return self.platform.create_file(args);
        };
        log::debug!("Call NtCreateFile");

        let rewritten = rewrite_create(args.desired_access, args.create_options, args.share_access);
        let forwarded = CreateFileArgs {
            desired_access: rewritten.desired_access,
            create_options: rewritten.create_options,
            share_access: rewritten.share_access,
            ..*args
        };
        let status = self.platform.create_file(&forwarded);

        let access = Value::Hex8(u64::from(args.desired_access.bits()));
        let attributes = Value::Hex(args.file_attributes);
        let disposition = Value::Hex(args.create_disposition);
        let options = Value::Hex(args.create_options.bits());
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
                    &CREATE,
                    &error,
                    &[
                        Value::Sentinel,
                        access,
                        attributes,
                        disposition,
                        options,
                        share,
                        Value::Sentinel,
                    ],
                );
                return status;
            }
        };

        if rewritten.deferred_delete && nt_success(status) {
            log::debug!("Marking {:#x} for capture on close", handle);
            self.registry.mark_for_dump(pid, handle);
            Counters::bump(&self.counters.handles_marked);
        }

        let path = self.object_path(object);
        self.emit(
            pid,
            &CREATE,
            Outcome::Completed(status),
            &[
                handle_value(handle),
                access,
                attributes,
                disposition,
                options,
                share,
                text(path.as_deref()),
            ],
        );
        status
    }
}
