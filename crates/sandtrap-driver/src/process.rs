//! Process exit tracking
//!
//! Uses PsSetCreateProcessNotifyRoutineEx so that a monitored process that
//! exits is dropped from the registry together with its marked handles.
//! Process ids are recycled; without this a new, unrelated process could
//! inherit monitoring.
//!
//! Children of a monitored process are monitored as well, so a sample
//! cannot escape by spawning a helper to do its deleting.

use core::sync::atomic::{AtomicBool, Ordering};
use sandtrap_common::ProcessId;
use wdk::println;
use wdk_sys::{
    ntddk::PsSetCreateProcessNotifyRoutineEx, HANDLE, NTSTATUS, PEPROCESS,
    PPS_CREATE_NOTIFY_INFO, STATUS_SUCCESS,
};

use crate::DRIVER_NAME;

/// Flag indicating if the process callback is registered
static REGISTERED: AtomicBool = AtomicBool::new(false);

/// Register the process notification callback
///
/// # Safety
/// Must be called from PASSIVE_LEVEL (typically DriverEntry)
pub unsafe fn register() -> Result<(), NTSTATUS> {
    if REGISTERED.load(Ordering::SeqCst) {
        return Ok(());
    }

    let status = unsafe { PsSetCreateProcessNotifyRoutineEx(Some(process_notify_callback), 0) };

    if status != STATUS_SUCCESS {
        return Err(status);
    }

    REGISTERED.store(true, Ordering::SeqCst);
    println!("[{}] Process exit callback registered", DRIVER_NAME);
    Ok(())
}

/// Unregister the process notification callback
///
/// # Safety
/// Must be called from PASSIVE_LEVEL (typically DriverUnload)
pub unsafe fn unregister() {
    if !REGISTERED.load(Ordering::SeqCst) {
        return;
    }

    // TRUE removes the callback
    let status = unsafe { PsSetCreateProcessNotifyRoutineEx(Some(process_notify_callback), 1) };

    if status == STATUS_SUCCESS {
        REGISTERED.store(false, Ordering::SeqCst);
        println!("[{}] Process exit callback unregistered", DRIVER_NAME);
    }
}

/// Called by the kernel when a process is created or terminated
///
/// `create_info` is NULL on termination.
///
/// # Safety
/// Called at PASSIVE_LEVEL by the kernel
unsafe extern "C" fn process_notify_callback(
    _process: PEPROCESS,
    process_id: HANDLE,
    create_info: PPS_CREATE_NOTIFY_INFO,
) {
    let Some(engine) = crate::engine() else {
        return;
    };
    let pid = ProcessId(process_id as usize as u32);
    let registry = engine.registry();

    if create_info.is_null() {
        if registry.remove_process(pid) {
            log::info!("Monitored process {} exited", pid);
        }
        return;
    }

    let parent = ProcessId(unsafe { (*create_info).ParentProcessId } as usize as u32);
    if registry.is_monitored(parent) && registry.add_process(pid) {
        log::info!("Monitoring process {} (child of {})", pid, parent);
    }
}
