//! Bounded User-Memory Accessor
//!
//! Every byte the engine takes from a monitored process comes through
//! [`Accessor`]. A read is one fallible operation: range check, owned
//! allocation, fault-tolerant copy. Structures are decoded from the copy
//! at fixed offsets (see [`sandtrap_common::layout`]) so nested pointers
//! are read one hop at a time, each hop checked again.
//!
//! # Buffers
//! Captured data lives in an [`OwnedBuffer`], which is wiped and freed
//! when dropped. A failed read never hands a partial buffer to the caller.

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Deref;
use core::ptr;
use core::sync::atomic::{compiler_fence, Ordering};

use sandtrap_common::layout::{self, io_status_block, object_attributes, unicode_string};
use sandtrap_common::{Handle, UserPtr};

use crate::error::{CaptureError, Fault};
use crate::platform::ForeignMemory;

/// Kernel-owned copy of caller memory
///
/// Zeroed before release, since captures may contain anything the
/// monitored process had in memory.
#[derive(Debug, Default)]
pub struct OwnedBuffer {
    bytes: Vec<u8>,
}

impl OwnedBuffer {
    /// Zero-filled buffer of exactly `len` bytes
    pub fn zeroed(len: usize) -> Result<Self, CaptureError> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(len)
            .map_err(|_| CaptureError::Allocation(len))?;
        bytes.resize(len, 0);
        Ok(Self { bytes })
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Deref for OwnedBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for OwnedBuffer {
    fn drop(&mut self) {
        secure_zero(&mut self.bytes);
    }
}

/// Memory zeroing that survives optimization
pub fn secure_zero(buffer: &mut [u8]) {
    for byte in buffer.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference
        unsafe { ptr::write_volatile(byte, 0) };
    }
    compiler_fence(Ordering::SeqCst);
}

/// `OBJECT_ATTRIBUTES` as far as the engine cares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectName {
    /// `RootDirectory`, null when the name is absolute
    pub root: Handle,
    /// `ObjectName`, relative to `root` when a root is given
    pub name: String,
}

/// Checked reader over a [`ForeignMemory`] implementation
pub struct Accessor<'a, M: ?Sized> {
    memory: &'a M,
    max_name_bytes: usize,
}

impl<'a, M: ForeignMemory + ?Sized> Accessor<'a, M> {
    pub fn new(memory: &'a M, max_name_bytes: usize) -> Self {
        Self { memory, max_name_bytes }
    }

    /// Copy `len` bytes at `ptr` into a new kernel buffer
    ///
    /// A zero-length read succeeds without touching caller memory. A null
    /// pointer or a range that wraps the address space is an access
    /// violation.
    pub fn read_foreign(&self, ptr: UserPtr, len: usize) -> Result<OwnedBuffer, CaptureError> {
        if len == 0 {
            return Ok(OwnedBuffer::default());
        }
        if ptr.is_null() || ptr.offset(len).is_none() {
            return Err(Fault::AccessViolation { address: ptr.0, len }.into());
        }

        let mut buffer = OwnedBuffer::zeroed(len)?;
        self.memory.copy_foreign(ptr.0, buffer.as_mut_slice())?;
        Ok(buffer)
    }

    fn read_array<const N: usize>(&self, ptr: UserPtr) -> Result<[u8; N], CaptureError> {
        if ptr.is_null() || ptr.offset(N).is_none() {
            return Err(Fault::AccessViolation { address: ptr.0, len: N }.into());
        }
        let mut raw = [0u8; N];
        self.memory.copy_foreign(ptr.0, &mut raw)?;
        Ok(raw)
    }

    pub fn read_u8(&self, ptr: UserPtr) -> Result<u8, CaptureError> {
        let [byte] = self.read_array::<1>(ptr)?;
        Ok(byte)
    }

    pub fn read_u32(&self, ptr: UserPtr) -> Result<u32, CaptureError> {
        Ok(u32::from_le_bytes(self.read_array(ptr)?))
    }

    pub fn read_usize(&self, ptr: UserPtr) -> Result<usize, CaptureError> {
        Ok(u64::from_le_bytes(self.read_array(ptr)?) as usize)
    }

    /// `LARGE_INTEGER`
    pub fn read_i64(&self, ptr: UserPtr) -> Result<i64, CaptureError> {
        Ok(i64::from_le_bytes(self.read_array::<{ layout::LARGE_INTEGER_SIZE }>(ptr)?))
    }

    /// Value stored behind a `PHANDLE`
    pub fn read_handle(&self, ptr: UserPtr) -> Result<Handle, CaptureError> {
        Ok(Handle(
            u64::from_le_bytes(self.read_array::<{ layout::HANDLE_SIZE }>(ptr)?) as usize,
        ))
    }

    /// `IO_STATUS_BLOCK.Information`
    pub fn read_io_information(&self, iosb: UserPtr) -> Result<usize, CaptureError> {
        let block = self.read_array::<{ io_status_block::SIZE }>(iosb)?;
        Ok(le_usize(&block, io_status_block::INFORMATION))
    }

    /// UTF-16 text of `byte_len` bytes at `buffer`, capped at the name limit
    pub fn read_utf16(&self, buffer: UserPtr, byte_len: usize) -> Result<String, CaptureError> {
        let byte_len = byte_len.min(self.max_name_bytes) & !1;
        let raw = self.read_foreign(buffer, byte_len)?;
        decode_utf16_lossy(&raw)
    }

    /// Text of the `UNICODE_STRING` at `ptr`
    pub fn read_unicode_string(&self, ptr: UserPtr) -> Result<String, CaptureError> {
        let header = self.read_array::<{ unicode_string::SIZE }>(ptr)?;
        let length = le_u16(&header, unicode_string::LENGTH) as usize;
        let buffer = UserPtr(le_usize(&header, unicode_string::BUFFER));
        self.read_utf16(buffer, length)
    }

    /// Root directory and name of the `OBJECT_ATTRIBUTES` at `ptr`
    pub fn read_object_attributes(&self, ptr: UserPtr) -> Result<ObjectName, CaptureError> {
        let attributes = self.read_array::<{ object_attributes::SIZE }>(ptr)?;
        let root = Handle(le_usize(&attributes, object_attributes::ROOT_DIRECTORY));
        let name_ptr = UserPtr(le_usize(&attributes, object_attributes::OBJECT_NAME));
        let name = self.read_unicode_string(name_ptr)?;
        Ok(ObjectName { root, name })
    }
}

fn le_u16(bytes: &[u8], offset: usize) -> u16 {
    let mut raw = [0u8; 2];
    raw.copy_from_slice(&bytes[offset..offset + 2]);
    u16::from_le_bytes(raw)
}

pub(crate) fn le_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(raw)
}

pub(crate) fn le_usize(bytes: &[u8], offset: usize) -> usize {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(raw) as usize
}

/// Decode little-endian UTF-16, replacing unpaired surrogates
pub(crate) fn decode_utf16_lossy(raw: &[u8]) -> Result<String, CaptureError> {
    let units = raw
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));

    // Worst case is three UTF-8 bytes per UTF-16 unit
    let capacity = (raw.len() / 2) * 3;
    let mut text = String::new();
    text.try_reserve(capacity)
        .map_err(|_| CaptureError::Allocation(capacity))?;

    for decoded in char::decode_utf16(units) {
        text.push(decoded.unwrap_or(char::REPLACEMENT_CHARACTER));
    }
    Ok(text)
}
