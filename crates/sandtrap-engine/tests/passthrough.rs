//! Calls from unmonitored processes and from kernel mode are not touched

mod common;

use common::{engine, Call, BYSTANDER, MONITORED};
use sandtrap_common::flags::info_class;
use sandtrap_common::status::STATUS_ACCESS_DENIED;
use sandtrap_common::{AccessMask, CreateOptions, Handle, ProcessorMode, ShareAccess, UserPtr};
use sandtrap_engine::{
    CreateFileArgs, DeleteFileArgs, DeviceIoControlArgs, FileIoArgs, Interceptor, OpenFileArgs,
    QueryAttributesArgs, SetInformationArgs,
};

use common::MockPlatform;

/// Run every entry point once with arguments the engine would otherwise
/// rewrite or suppress, returning the calls that reached the real services
fn drive_all(engine: &Interceptor<MockPlatform>) -> Vec<Call> {
    let platform = engine.platform();
    let slot = platform.mem().handle_slot();
    let oa = platform
        .mem()
        .object_attributes(Handle::NULL, "\\??\\C:\\Windows\\system32\\drivers\\VBoxGuest.sys");
    let delete_flag = platform.mem().alloc(&[1]);

    let io = FileIoArgs {
        file_handle: Handle(0x40),
        event: Handle::NULL,
        apc_routine: UserPtr::NULL,
        apc_context: UserPtr::NULL,
        io_status_block: UserPtr(0xbad),
        buffer: UserPtr(0xbad),
        length: 16,
        byte_offset: UserPtr::NULL,
        key: UserPtr::NULL,
    };

    let statuses = [
        engine.nt_query_attributes_file(&QueryAttributesArgs {
            object_attributes: oa,
            file_information: UserPtr(0xbad),
        }),
        engine.nt_device_io_control_file(&DeviceIoControlArgs {
            file_handle: Handle(0x40),
            event: Handle::NULL,
            apc_routine: UserPtr::NULL,
            apc_context: UserPtr::NULL,
            io_status_block: UserPtr(0xbad),
            io_control_code: 0x0022_2004,
            input_buffer: UserPtr(0xbad),
            input_buffer_length: 8,
            output_buffer: UserPtr::NULL,
            output_buffer_length: 0,
        }),
        engine.nt_close(Handle(0x40)),
        engine.nt_set_information_file(&SetInformationArgs {
            file_handle: Handle(0x40),
            io_status_block: UserPtr(0xbad),
            file_information: delete_flag,
            length: 1,
            information_class: info_class::FILE_DISPOSITION_INFORMATION,
        }),
        engine.nt_open_file(&OpenFileArgs {
            file_handle: slot,
            desired_access: AccessMask::DELETE,
            object_attributes: oa,
            io_status_block: UserPtr(0xbad),
            share_access: ShareAccess::empty(),
            open_options: CreateOptions::DELETE_ON_CLOSE,
        }),
        engine.nt_delete_file(&DeleteFileArgs { object_attributes: oa }),
        engine.nt_create_file(&CreateFileArgs {
            file_handle: slot,
            desired_access: AccessMask::DELETE,
            object_attributes: oa,
            io_status_block: UserPtr(0xbad),
            allocation_size: UserPtr::NULL,
            file_attributes: 0,
            share_access: ShareAccess::empty(),
            create_disposition: 1,
            create_options: CreateOptions::DELETE_ON_CLOSE,
            ea_buffer: UserPtr::NULL,
            ea_length: 0,
        }),
        engine.nt_read_file(&io),
        engine.nt_write_file(&io),
    ];

    // close always reports success in the mock; everything else echoes
    // the programmed status untouched
    for (index, status) in statuses.iter().enumerate() {
        if index != 2 {
            assert_eq!(*status, STATUS_ACCESS_DENIED, "entry point {index}");
        }
    }

    platform.calls()
}

fn assert_untouched(engine: &Interceptor<MockPlatform>) {
    let platform = engine.platform();
    platform.set_status(STATUS_ACCESS_DENIED);

    let calls = drive_all(engine);

    assert_eq!(calls.len(), 9);
    match &calls[4] {
        Call::Open(args) => assert_eq!(args.share_access, ShareAccess::empty()),
        call => panic!("unexpected call {call:?}"),
    }
    assert!(matches!(calls[5], Call::Delete(_)));
    match &calls[6] {
        Call::Create(args) => {
            assert_eq!(args.desired_access, AccessMask::DELETE);
            assert_eq!(args.create_options, CreateOptions::DELETE_ON_CLOSE);
            assert_eq!(args.share_access, ShareAccess::empty());
        }
        call => panic!("unexpected call {call:?}"),
    }

    assert!(platform.logs().is_empty());
    assert!(platform.quarantined().is_empty());
    assert!(platform.released.lock().unwrap().is_empty());
    assert_eq!(engine.registry().marked_count(), 0);
    assert_eq!(engine.stats().intercepted, 0);
}

#[test]
fn unmonitored_process_is_passed_through() {
    let engine = engine();
    engine.platform().set_caller(BYSTANDER, ProcessorMode::User);

    assert_untouched(&engine);
}

#[test]
fn kernel_mode_caller_is_passed_through() {
    let engine = engine();
    engine.platform().set_caller(MONITORED, ProcessorMode::Kernel);

    assert_untouched(&engine);
}

#[test]
fn removed_process_is_passed_through() {
    let engine = engine();
    engine.registry().remove_process(MONITORED);

    assert_untouched(&engine);
}

#[test]
fn monitored_process_is_intercepted() {
    let engine = engine();
    engine.platform().set_status(STATUS_ACCESS_DENIED);

    let platform = engine.platform();
    let oa = platform.mem().object_attributes(Handle::NULL, "\\??\\C:\\a.txt");
    engine.nt_delete_file(&DeleteFileArgs { object_attributes: oa });

    assert!(platform.calls().is_empty());
    assert_eq!(platform.logs().len(), 1);
    assert_eq!(engine.stats().intercepted, 1);
}
