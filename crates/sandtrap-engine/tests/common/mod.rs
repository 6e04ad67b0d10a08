//! In-memory platform for driving the engine in tests
//!
//! - `UserSpace`: a fake caller address space with a bump allocator and
//!   builders for the NT structures the handlers read
//! - `MockPlatform`: recorded passthrough calls, programmable statuses,
//!   a handle name table, a fake file system for evidence, captured logs

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use sandtrap_common::status::{
    STATUS_OBJECT_NAME_COLLISION, STATUS_OBJECT_NAME_NOT_FOUND, STATUS_SUCCESS,
};
use sandtrap_common::{Handle, NtStatus, ProcessId, ProcessorMode, Signature, UserPtr};
use sandtrap_engine::{
    CallerContext, CreateFileArgs, DeleteFileArgs, DeviceIoControlArgs, EngineConfig,
    EvidenceFs, Fault, FileIoArgs, FilePassthrough, ForeignMemory, Interceptor, LogSink,
    NameError, ObjectNames, OpenFileArgs, QueryAttributesArgs, SetInformationArgs,
};

pub const MONITORED: ProcessId = ProcessId(4242);
pub const BYSTANDER: ProcessId = ProcessId(1000);
pub const QUARANTINE: &str = "\\??\\Q:\\quarantine";

/// Gap left unmapped after every allocation
const GUARD: usize = 0x100;

#[derive(Debug, Default)]
pub struct UserSpace {
    regions: BTreeMap<usize, Vec<u8>>,
    next: usize,
}

impl UserSpace {
    pub fn new() -> Self {
        Self { regions: BTreeMap::new(), next: 0x1_0000 }
    }

    pub fn alloc(&mut self, bytes: &[u8]) -> UserPtr {
        let address = self.next;
        self.regions.insert(address, bytes.to_vec());
        self.next += (bytes.len().max(1) + GUARD + 0xf) & !0xf;
        UserPtr(address)
    }

    fn locate(&self, address: usize, len: usize) -> Option<(usize, usize)> {
        let (base, bytes) = self.regions.range(..=address).next_back()?;
        let start = address - base;
        let end = start.checked_add(len)?;
        (end <= bytes.len()).then_some((*base, start))
    }

    pub fn read(&self, address: usize, dest: &mut [u8]) -> bool {
        match self.locate(address, dest.len()) {
            Some((base, start)) => {
                dest.copy_from_slice(&self.regions[&base][start..start + dest.len()]);
                true
            }
            None => false,
        }
    }

    pub fn write(&mut self, ptr: UserPtr, data: &[u8]) -> bool {
        match self.locate(ptr.0, data.len()) {
            Some((base, start)) => {
                let region = self.regions.get_mut(&base).unwrap();
                region[start..start + data.len()].copy_from_slice(data);
                true
            }
            None => false,
        }
    }

    pub fn utf16(&mut self, text: &str) -> UserPtr {
        let raw: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        self.alloc(&raw)
    }

    pub fn unicode_string(&mut self, text: &str) -> UserPtr {
        let buffer = self.utf16(text);
        let length = (text.encode_utf16().count() * 2) as u16;
        self.unicode_string_raw(length, buffer)
    }

    pub fn unicode_string_raw(&mut self, length: u16, buffer: UserPtr) -> UserPtr {
        let mut header = vec![0u8; 16];
        header[0..2].copy_from_slice(&length.to_le_bytes());
        header[2..4].copy_from_slice(&length.to_le_bytes());
        header[8..16].copy_from_slice(&(buffer.0 as u64).to_le_bytes());
        self.alloc(&header)
    }

    pub fn object_attributes_raw(&mut self, root: Handle, name: UserPtr) -> UserPtr {
        let mut attributes = vec![0u8; 48];
        attributes[0..4].copy_from_slice(&48u32.to_le_bytes());
        attributes[8..16].copy_from_slice(&(root.0 as u64).to_le_bytes());
        attributes[16..24].copy_from_slice(&(name.0 as u64).to_le_bytes());
        self.alloc(&attributes)
    }

    pub fn object_attributes(&mut self, root: Handle, name: &str) -> UserPtr {
        let name = self.unicode_string(name);
        self.object_attributes_raw(root, name)
    }

    pub fn io_status_block(&mut self, status: NtStatus, information: usize) -> UserPtr {
        let mut block = vec![0u8; 16];
        block[0..4].copy_from_slice(&status.to_le_bytes());
        block[8..16].copy_from_slice(&(information as u64).to_le_bytes());
        self.alloc(&block)
    }

    pub fn handle_slot(&mut self) -> UserPtr {
        self.alloc(&[0u8; 8])
    }

    pub fn large_integer(&mut self, value: i64) -> UserPtr {
        self.alloc(&value.to_le_bytes())
    }

    pub fn rename_information(&mut self, root: Handle, name: &str) -> UserPtr {
        let raw: Vec<u8> = name.encode_utf16().flat_map(u16::to_le_bytes).collect();
        let mut info = vec![0u8; 20];
        info[8..16].copy_from_slice(&(root.0 as u64).to_le_bytes());
        info[16..20].copy_from_slice(&(raw.len() as u32).to_le_bytes());
        info.extend_from_slice(&raw);
        self.alloc(&info)
    }

    pub fn read_handle(&self, ptr: UserPtr) -> Handle {
        let mut raw = [0u8; 8];
        assert!(self.read(ptr.0, &mut raw));
        Handle(u64::from_le_bytes(raw) as usize)
    }
}

/// One forwarded call, with the arguments the real service received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    QueryAttributes(QueryAttributesArgs),
    DeviceIoControl(DeviceIoControlArgs),
    Close(Handle),
    SetInformation(SetInformationArgs),
    Open(OpenFileArgs),
    Delete(DeleteFileArgs),
    Create(CreateFileArgs),
    Read(FileIoArgs),
    Write(FileIoArgs),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub pid: ProcessId,
    pub signature: Signature,
    pub record: String,
}

#[derive(Debug)]
pub struct MockPlatform {
    pub pid: Mutex<ProcessId>,
    pub mode: Mutex<ProcessorMode>,
    pub memory: Mutex<UserSpace>,
    pub names: Mutex<HashMap<Handle, String>>,
    pub files: Mutex<BTreeMap<String, Vec<u8>>>,
    pub logs: Mutex<Vec<LogEntry>>,
    pub calls: Mutex<Vec<Call>>,
    pub released: Mutex<Vec<Handle>>,
    /// Status every passthrough returns
    pub status: Mutex<NtStatus>,
    /// Handle written to `*FileHandle` by a successful create/open
    pub next_handle: Mutex<Handle>,
    /// Forced failure for quarantine file creation
    pub quarantine_failure: Mutex<Option<NtStatus>>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self {
            pid: Mutex::new(MONITORED),
            mode: Mutex::new(ProcessorMode::User),
            memory: Mutex::new(UserSpace::new()),
            names: Mutex::new(HashMap::new()),
            files: Mutex::new(BTreeMap::new()),
            logs: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            released: Mutex::new(Vec::new()),
            status: Mutex::new(STATUS_SUCCESS),
            next_handle: Mutex::new(Handle(0x40)),
            quarantine_failure: Mutex::new(None),
        }
    }
}

impl MockPlatform {
    pub fn mem(&self) -> std::sync::MutexGuard<'_, UserSpace> {
        self.memory.lock().unwrap()
    }

    pub fn name_handle(&self, handle: Handle, name: &str) {
        self.names.lock().unwrap().insert(handle, name.to_string());
    }

    pub fn add_file(&self, path: &str, content: &[u8]) {
        self.files.lock().unwrap().insert(path.to_string(), content.to_vec());
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn quarantined(&self) -> Vec<(String, Vec<u8>)> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .filter(|(path, _)| path.starts_with(QUARANTINE))
            .map(|(path, data)| (path.clone(), data.clone()))
            .collect()
    }

    pub fn set_status(&self, status: NtStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn set_caller(&self, pid: ProcessId, mode: ProcessorMode) {
        *self.pid.lock().unwrap() = pid;
        *self.mode.lock().unwrap() = mode;
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.logs.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn forward(&self, call: Call) -> NtStatus {
        self.calls.lock().unwrap().push(call);
        *self.status.lock().unwrap()
    }

    fn write_new_handle(&self, slot: UserPtr, status: NtStatus) {
        if status == STATUS_SUCCESS {
            let handle = *self.next_handle.lock().unwrap();
            self.mem().write(slot, &(handle.0 as u64).to_le_bytes());
        }
    }
}

impl CallerContext for MockPlatform {
    fn current_process_id(&self) -> ProcessId {
        *self.pid.lock().unwrap()
    }

    fn previous_mode(&self) -> ProcessorMode {
        *self.mode.lock().unwrap()
    }
}

impl ForeignMemory for MockPlatform {
    fn copy_foreign(&self, address: usize, dest: &mut [u8]) -> Result<(), Fault> {
        if self.mem().read(address, dest) {
            Ok(())
        } else {
            Err(Fault::AccessViolation { address, len: dest.len() })
        }
    }
}

impl ObjectNames for MockPlatform {
    fn resolve_name(&self, handle: Handle) -> Result<String, NameError> {
        self.names
            .lock()
            .unwrap()
            .get(&handle)
            .cloned()
            .ok_or(NameError::Query(sandtrap_common::status::STATUS_INVALID_HANDLE))
    }

    fn release_handle(&self, handle: Handle) -> NtStatus {
        self.released.lock().unwrap().push(handle);
        STATUS_SUCCESS
    }
}

impl LogSink for MockPlatform {
    fn emit_log(&self, pid: ProcessId, signature: Signature, record: &str) {
        self.logs.lock().unwrap().push(LogEntry { pid, signature, record: record.to_string() });
    }
}

impl FilePassthrough for MockPlatform {
    fn query_attributes_file(&self, args: &QueryAttributesArgs) -> NtStatus {
        self.forward(Call::QueryAttributes(*args))
    }

    fn device_io_control_file(&self, args: &DeviceIoControlArgs) -> NtStatus {
        self.forward(Call::DeviceIoControl(*args))
    }

    fn close(&self, handle: Handle) -> NtStatus {
        self.calls.lock().unwrap().push(Call::Close(handle));
        STATUS_SUCCESS
    }

    fn set_information_file(&self, args: &SetInformationArgs) -> NtStatus {
        self.forward(Call::SetInformation(*args))
    }

    fn open_file(&self, args: &OpenFileArgs) -> NtStatus {
        let status = self.forward(Call::Open(*args));
        self.write_new_handle(args.file_handle, status);
        status
    }

    fn delete_file(&self, args: &DeleteFileArgs) -> NtStatus {
        self.forward(Call::Delete(*args))
    }

    fn create_file(&self, args: &CreateFileArgs) -> NtStatus {
        let status = self.forward(Call::Create(*args));
        self.write_new_handle(args.file_handle, status);
        status
    }

    fn read_file(&self, args: &FileIoArgs) -> NtStatus {
        self.forward(Call::Read(*args))
    }

    fn write_file(&self, args: &FileIoArgs) -> NtStatus {
        self.forward(Call::Write(*args))
    }
}

#[derive(Debug)]
pub struct Source {
    data: Vec<u8>,
    position: usize,
}

#[derive(Debug)]
pub struct Sink {
    path: String,
}

impl EvidenceFs for MockPlatform {
    type Source = Source;
    type Sink = Sink;

    fn open_source(&self, path: &str) -> Result<Source, NtStatus> {
        self.file(path)
            .map(|data| Source { data, position: 0 })
            .ok_or(STATUS_OBJECT_NAME_NOT_FOUND)
    }

    fn create_exclusive(&self, path: &str) -> Result<Sink, NtStatus> {
        if let Some(status) = *self.quarantine_failure.lock().unwrap() {
            return Err(status);
        }
        let mut files = self.files.lock().unwrap();
        if files.contains_key(path) {
            return Err(STATUS_OBJECT_NAME_COLLISION);
        }
        files.insert(path.to_string(), Vec::new());
        Ok(Sink { path: path.to_string() })
    }

    fn read(&self, source: &mut Source, buf: &mut [u8]) -> Result<usize, NtStatus> {
        let remaining = &source.data[source.position..];
        let len = remaining.len().min(buf.len());
        buf[..len].copy_from_slice(&remaining[..len]);
        source.position += len;
        Ok(len)
    }

    fn write(&self, sink: &mut Sink, data: &[u8]) -> Result<(), NtStatus> {
        self.files
            .lock()
            .unwrap()
            .get_mut(&sink.path)
            .map(|file| file.extend_from_slice(data))
            .ok_or(STATUS_OBJECT_NAME_NOT_FOUND)
    }

    fn discard(&self, sink: Sink) {
        self.files.lock().unwrap().remove(&sink.path);
    }
}

pub fn config() -> EngineConfig {
    EngineConfig::default().with_quarantine_dir(QUARANTINE)
}

/// Engine over a fresh mock with `MONITORED` registered
pub fn engine() -> Interceptor<MockPlatform> {
    engine_with(config())
}

pub fn engine_with(config: EngineConfig) -> Interceptor<MockPlatform> {
    let engine = Interceptor::new(MockPlatform::default(), config);
    engine.registry().add_process(MONITORED);
    engine
}
