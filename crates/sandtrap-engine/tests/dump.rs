//! Evidence copies into quarantine

mod common;

use common::{config, engine_with, MockPlatform, MONITORED, QUARANTINE};
use sandtrap_common::status::{STATUS_ACCESS_DENIED, STATUS_OBJECT_NAME_NOT_FOUND};
use sandtrap_common::wire::{self, ParsedRecord};
use sandtrap_common::{Handle, ProcessId};
use sandtrap_engine::dump::Dumper;
use sandtrap_engine::{DeleteFileArgs, DumpError};

#[test]
fn copies_file_in_chunks() {
    let platform = MockPlatform::default();
    let content: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    platform.add_file("\\??\\C:\\big.bin", &content);
    let dumper = Dumper::new(&config().with_dump_chunk_len(333));

    let destination = dumper.dump(&platform, MONITORED, "\\??\\C:\\big.bin").unwrap();

    assert_eq!(destination, format!("{QUARANTINE}\\4242_000000_big.bin"));
    assert_eq!(platform.file(&destination), Some(content));
}

#[test]
fn empty_file_is_copied() {
    let platform = MockPlatform::default();
    platform.add_file("\\??\\C:\\empty", b"");
    let dumper = Dumper::new(&config());

    let destination = dumper.dump(&platform, MONITORED, "\\??\\C:\\empty").unwrap();

    assert_eq!(platform.file(&destination), Some(Vec::new()));
}

#[test]
fn taken_names_are_skipped() {
    let platform = MockPlatform::default();
    platform.add_file("\\??\\C:\\a.exe", b"a");
    platform.add_file(&format!("{QUARANTINE}\\4242_000000_a.exe"), b"older");
    platform.add_file(&format!("{QUARANTINE}\\4242_000001_a.exe"), b"older");
    let dumper = Dumper::new(&config());

    let destination = dumper.dump(&platform, MONITORED, "\\??\\C:\\a.exe").unwrap();

    assert_eq!(destination, format!("{QUARANTINE}\\4242_000002_a.exe"));
    assert_eq!(platform.file(&destination).as_deref(), Some(&b"a"[..]));
}

#[test]
fn gives_up_after_max_attempts() {
    let platform = MockPlatform::default();
    platform.add_file("\\??\\C:\\a.exe", b"a");
    for sequence in 0..3 {
        platform.add_file(&format!("{QUARANTINE}\\4242_{sequence:06}_a.exe"), b"older");
    }
    let dumper = Dumper::new(&config().with_max_name_attempts(3));

    let error = dumper.dump(&platform, MONITORED, "\\??\\C:\\a.exe").unwrap_err();

    assert_eq!(error, DumpError::NameCollision { attempts: 3 });
    assert_eq!(platform.quarantined().len(), 3);
}

#[test]
fn oversized_file_leaves_nothing_behind() {
    let platform = MockPlatform::default();
    platform.add_file("\\??\\C:\\huge.iso", &[0u8; 4096]);
    let dumper = Dumper::new(&config().with_max_dump_bytes(1000).with_dump_chunk_len(256));

    let error = dumper.dump(&platform, MONITORED, "\\??\\C:\\huge.iso").unwrap_err();

    assert_eq!(error, DumpError::TooLarge { limit: 1000 });
    assert!(platform.quarantined().is_empty());
}

#[test]
fn missing_source_creates_nothing() {
    let platform = MockPlatform::default();
    let dumper = Dumper::new(&config());

    let error = dumper.dump(&platform, MONITORED, "\\??\\C:\\gone.exe").unwrap_err();

    assert_eq!(error, DumpError::SourceUnreadable(STATUS_OBJECT_NAME_NOT_FOUND));
    assert!(platform.quarantined().is_empty());
}

#[test]
fn unwritable_quarantine_is_reported() {
    let platform = MockPlatform::default();
    platform.add_file("\\??\\C:\\a.exe", b"a");
    *platform.quarantine_failure.lock().unwrap() = Some(STATUS_ACCESS_DENIED);
    let dumper = Dumper::new(&config());

    let error = dumper.dump(&platform, MONITORED, "\\??\\C:\\a.exe").unwrap_err();

    assert_eq!(error, DumpError::QuarantineUnwritable(STATUS_ACCESS_DENIED));
}

#[test]
fn sequence_is_shared_across_processes() {
    let platform = MockPlatform::default();
    platform.add_file("\\Device\\X\\one", b"1");
    let dumper = Dumper::new(&config());

    let first = dumper.dump(&platform, ProcessId(7), "\\Device\\X\\one").unwrap();
    let second = dumper.dump(&platform, ProcessId(8), "\\Device\\X\\one").unwrap();

    assert_eq!(first, format!("{QUARANTINE}\\7_000000_one"));
    assert_eq!(second, format!("{QUARANTINE}\\8_000001_one"));
}

#[test]
fn failed_capture_logs_sentinel_and_counts() {
    let engine = engine_with(config());
    let platform = engine.platform();
    platform.add_file("\\??\\C:\\a.exe", b"a");
    *platform.quarantine_failure.lock().unwrap() = Some(STATUS_ACCESS_DENIED);
    let oa = platform.mem().object_attributes(Handle::NULL, "\\??\\C:\\a.exe");

    engine.nt_delete_file(&DeleteFileArgs { object_attributes: oa });

    let logs = platform.logs();
    let record = ParsedRecord::parse(&logs[0].record).unwrap();
    assert!(record.success);
    assert_eq!(record.get("FileName"), Some("\\??\\C:\\a.exe"));
    assert_eq!(record.get("FileToDump"), Some(wire::SENTINEL));
    assert_eq!(engine.stats().evidence_failed, 1);
    assert_eq!(engine.stats().evidence_captured, 0);
}

#[test]
fn disabled_capture_skips_quarantine() {
    let engine = engine_with(config().with_evidence_capture(false));
    let platform = engine.platform();
    platform.add_file("\\??\\C:\\a.exe", b"a");
    let oa = platform.mem().object_attributes(Handle::NULL, "\\??\\C:\\a.exe");

    engine.nt_delete_file(&DeleteFileArgs { object_attributes: oa });

    assert!(platform.quarantined().is_empty());
    assert_eq!(engine.stats().evidence_failed, 0);
    assert!(platform.calls().is_empty());
}
