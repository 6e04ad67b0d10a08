//! Sandtrap - file-system interception driver
//!
//! Kernel host for the [`sandtrap_engine`] interception engine. The engine
//! holds every policy decision; this crate supplies the pieces that need
//! the kernel:
//!
//! - **Caller context**: current process id and previous processor mode
//! - **Caller memory**: range-checked `MmCopyMemory` reads that report bad
//!   addresses instead of raising
//! - **Object names**: `ZwQueryObject` name lookup, early `ZwClose`
//! - **Evidence files**: `ZwCreateFile`/`ZwReadFile`/`ZwWriteFile` copies
//!   into quarantine
//! - **Passthrough table**: the original service routines, handed over by
//!   the hook installer
//! - **Hook entry points**: one `extern "system"` function per intercepted
//!   service with the native signature
//!
//! # Exports
//! | Symbol | Purpose |
//! |---|---|
//! | `SandtrapInstall` | Hand over the original services and the log transport |
//! | `SandtrapHookTable` | Fetch the `hooked_*` entry points |
//! | `SandtrapMonitorProcess` | Start monitoring a process id |
//! | `SandtrapForgetProcess` | Stop monitoring a process id |
//! | `SandtrapQueryStats` | Copy the engine counters out |
//!
//! # Architecture
//! - Uses KMDF (Kernel-Mode Driver Framework) v1.33, non-PnP
//! - Built with Microsoft's windows-drivers-rs
//! - Compiled only for Windows targets; elsewhere the crate is empty

#![cfg(target_os = "windows")]
#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![allow(internal_features)]
#![feature(lang_items)]

extern crate alloc;

#[cfg(not(test))]
extern crate wdk_panic;

mod ffi;
mod hooks;
mod logger;
mod platform;
mod process;
mod utils;

use log::LevelFilter;
use sandtrap_common::{InterceptStats, ProcessId};
use sandtrap_engine::{EngineConfig, Interceptor};
use spin::Once;
use wdk::println;
use wdk_alloc::WdkAllocator;
use wdk_sys::{
    DRIVER_OBJECT, NTSTATUS, PCUNICODE_STRING, STATUS_INVALID_PARAMETER, STATUS_SUCCESS,
    STATUS_UNSUCCESSFUL, WDFDRIVER,
};

pub use platform::{KernelPlatform, LogTransport, ServiceTable};

/// Global allocator for kernel memory allocations
#[global_allocator]
static GLOBAL_ALLOCATOR: WdkAllocator = WdkAllocator;

/// Driver version information
pub const DRIVER_NAME: &str = "Sandtrap";
pub const DRIVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Feature flags for enabling/disabling driver capabilities
pub mod features {
    /// Copy files into quarantine before the monitored process deletes them
    pub const ENABLE_EVIDENCE_CAPTURE: bool = true;
    /// Answer hypervisor artifact probes with "attributes unavailable"
    pub const ENABLE_ARTIFACT_SPOOFING: bool = true;
    /// Forget processes (and their marked handles) when they exit
    pub const ENABLE_PROCESS_EXIT_TRACKING: bool = true;
}

/// Diagnostics verbosity; audit records are not affected
const LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// The engine, created once in `DriverEntry`
static ENGINE: Once<Interceptor<KernelPlatform>> = Once::new();

pub(crate) fn engine() -> Option<&'static Interceptor<KernelPlatform>> {
    ENGINE.get()
}

fn engine_config() -> EngineConfig {
    EngineConfig::default()
        .with_evidence_capture(features::ENABLE_EVIDENCE_CAPTURE)
        .with_artifact_spoofing(features::ENABLE_ARTIFACT_SPOOFING)
}

/// Driver entry point - called by Windows when the driver is loaded
///
/// # Safety
/// This function is called by the Windows kernel with valid pointers.
/// The caller ensures `driver_object` and `registry_path` are valid.
#[export_name = "DriverEntry"]
pub unsafe extern "system" fn driver_entry(
    driver_object: &mut DRIVER_OBJECT,
    registry_path: PCUNICODE_STRING,
) -> NTSTATUS {
    println!("[{}] v{} loading", DRIVER_NAME, DRIVER_VERSION);

    if logger::init(LOG_LEVEL).is_err() {
        println!("[{}] Warning: diagnostics logger already installed", DRIVER_NAME);
    }

    match unsafe { init_driver(driver_object, registry_path) } {
        Ok(()) => {
            println!("[{}] Driver initialized successfully", DRIVER_NAME);
            STATUS_SUCCESS
        }
        Err(status) => {
            println!("[{}] Driver initialization failed: {:#x}", DRIVER_NAME, status);
            status
        }
    }
}

/// Create the WDF driver object, the engine and the exit callback
///
/// # Safety
/// Caller must ensure driver_object and registry_path are valid pointers
unsafe fn init_driver(
    driver_object: &mut DRIVER_OBJECT,
    registry_path: PCUNICODE_STRING,
) -> Result<(), NTSTATUS> {
    use wdk_sys::{
        call_unsafe_wdf_function_binding, WDF_DRIVER_CONFIG, WDF_NO_HANDLE,
        WDF_NO_OBJECT_ATTRIBUTES, _WDF_DRIVER_INIT_FLAGS::WdfDriverInitNonPnpDriver,
    };

    let mut driver_config = WDF_DRIVER_CONFIG {
        Size: core::mem::size_of::<WDF_DRIVER_CONFIG>() as u32,
        EvtDriverDeviceAdd: None,
        EvtDriverUnload: Some(evt_driver_unload),
        DriverInitFlags: WdfDriverInitNonPnpDriver as u32,
        DriverPoolTag: utils::memory::POOL_TAG,
    };

    let status = unsafe {
        call_unsafe_wdf_function_binding!(
            WdfDriverCreate,
            driver_object as *mut _,
            registry_path,
            WDF_NO_OBJECT_ATTRIBUTES,
            &mut driver_config,
            WDF_NO_HANDLE as *mut WDFDRIVER
        )
    };

    if status != STATUS_SUCCESS {
        return Err(status);
    }

    let engine = ENGINE.call_once(|| Interceptor::new(KernelPlatform::new(), engine_config()));
    println!(
        "[{}] Engine ready: quarantine={}, spoofing={}, capture={}",
        DRIVER_NAME,
        engine.config().quarantine_dir,
        engine.config().spoof_artifacts,
        engine.config().capture_evidence
    );

    if features::ENABLE_PROCESS_EXIT_TRACKING {
        if let Err(e) = unsafe { process::register() } {
            println!("[{}] Warning: process exit callback failed: {:#x}", DRIVER_NAME, e);
        }
    }

    Ok(())
}

/// Driver unload callback - called when driver is being unloaded
///
/// The hook installer must have restored the original services before
/// this runs; nothing can call into the engine afterwards.
///
/// # Safety
/// Called by KMDF with a valid driver handle
unsafe extern "C" fn evt_driver_unload(_driver: WDFDRIVER) {
    println!("[{}] Driver unloading - cleaning up...", DRIVER_NAME);

    if features::ENABLE_PROCESS_EXIT_TRACKING {
        unsafe { process::unregister() };
    }

    if let Some(engine) = engine() {
        let stats = engine.stats();
        println!(
            "[{}] Intercepted {} calls, {} records, {} evidence copies ({} failed)",
            DRIVER_NAME,
            stats.intercepted,
            stats.records_emitted,
            stats.evidence_captured,
            stats.evidence_failed
        );
        engine.registry().clear();
    }

    println!("[{}] Driver unloaded successfully", DRIVER_NAME);
}

/// Hand the original service routines and the log transport to the engine
///
/// Called once by the hook installer, before it redirects any service to
/// the `hooked_*` entry points.
///
/// # Safety
/// `table` must point to a valid [`ServiceTable`] whose routines remain
/// callable until the driver unloads.
#[export_name = "SandtrapInstall"]
pub unsafe extern "C" fn install(
    table: *const ServiceTable,
    transport: Option<LogTransport>,
) -> NTSTATUS {
    if table.is_null() {
        return STATUS_INVALID_PARAMETER;
    }
    let Some(engine) = engine() else {
        return STATUS_UNSUCCESSFUL;
    };

    let table = unsafe { *table };
    match engine.platform().install(table, transport) {
        Ok(()) => {
            println!("[{}] Passthrough table installed", DRIVER_NAME);
            STATUS_SUCCESS
        }
        Err(status) => status,
    }
}

/// Copy the `hooked_*` entry points into `out`, in [`ServiceTable`] order
///
/// # Safety
/// `out` must be a valid, writable kernel pointer.
#[export_name = "SandtrapHookTable"]
pub unsafe extern "C" fn hook_table(out: *mut ServiceTable) -> NTSTATUS {
    if out.is_null() {
        return STATUS_INVALID_PARAMETER;
    }
    unsafe { out.write(hooks::hook_table()) };
    STATUS_SUCCESS
}

/// Start monitoring `pid`
#[export_name = "SandtrapMonitorProcess"]
pub extern "C" fn monitor_process(pid: u32) -> NTSTATUS {
    match engine() {
        Some(engine) => {
            if engine.registry().add_process(ProcessId(pid)) {
                log::info!("Monitoring process {}", pid);
            }
            STATUS_SUCCESS
        }
        None => STATUS_UNSUCCESSFUL,
    }
}

/// Stop monitoring `pid` and drop its marked handles
#[export_name = "SandtrapForgetProcess"]
pub extern "C" fn forget_process(pid: u32) -> NTSTATUS {
    match engine() {
        Some(engine) => {
            if engine.registry().remove_process(ProcessId(pid)) {
                log::info!("No longer monitoring process {}", pid);
            }
            STATUS_SUCCESS
        }
        None => STATUS_UNSUCCESSFUL,
    }
}

/// Copy the engine counters into `out`
///
/// # Safety
/// `out` must be a valid, writable kernel pointer.
#[export_name = "SandtrapQueryStats"]
pub unsafe extern "C" fn query_stats(out: *mut InterceptStats) -> NTSTATUS {
    if out.is_null() {
        return STATUS_INVALID_PARAMETER;
    }
    match engine() {
        Some(engine) => {
            unsafe { out.write(engine.stats()) };
            STATUS_SUCCESS
        }
        None => STATUS_UNSUCCESSFUL,
    }
}

#[cfg(not(test))]
#[lang = "eh_personality"]
extern "C" fn eh_personality() {}
