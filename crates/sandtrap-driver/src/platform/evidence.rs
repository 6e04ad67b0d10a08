//! Evidence file access
//!
//! Kernel handles (`OBJ_KERNEL_HANDLE`) opened with synchronous I/O, so
//! reads and writes advance the file position on their own. These `Zw*`
//! calls arrive at the system services with a kernel previous mode and are
//! never intercepted themselves.

use alloc::vec::Vec;
use core::mem::{size_of, zeroed};
use core::ptr;

use sandtrap_common::NtStatus;
use sandtrap_engine::EvidenceFs;
use wdk_sys::{
    ntddk::{ZwClose, ZwCreateFile, ZwReadFile, ZwSetInformationFile, ZwWriteFile},
    _FILE_INFORMATION_CLASS::FileDispositionInformation,
    DELETE, FILE_ATTRIBUTE_NORMAL, FILE_CREATE, FILE_DISPOSITION_INFORMATION,
    FILE_NON_DIRECTORY_FILE, FILE_OPEN, FILE_SHARE_DELETE, FILE_SHARE_READ, FILE_SHARE_WRITE,
    FILE_SYNCHRONOUS_IO_NONALERT, GENERIC_READ, GENERIC_WRITE, HANDLE, IO_STATUS_BLOCK,
    OBJECT_ATTRIBUTES, OBJ_CASE_INSENSITIVE, OBJ_KERNEL_HANDLE, STATUS_END_OF_FILE,
    STATUS_NAME_TOO_LONG, STATUS_NO_MEMORY, SYNCHRONIZE, UNICODE_STRING,
};

use super::KernelPlatform;

/// Open kernel file handle, closed on drop
pub struct KernelFile {
    handle: HANDLE,
}

// SAFETY: a kernel handle is valid in any thread of the system process
// and of the process that opened it
unsafe impl Send for KernelFile {}

impl Drop for KernelFile {
    fn drop(&mut self) {
        unsafe { ZwClose(self.handle) };
    }
}

struct OpenRequest {
    access: u32,
    share: u32,
    disposition: u32,
}

impl KernelFile {
    fn open(path: &str, request: OpenRequest) -> Result<Self, NtStatus> {
        let mut wide: Vec<u16> = Vec::new();
        wide.try_reserve_exact(path.len()).map_err(|_| STATUS_NO_MEMORY)?;
        wide.extend(path.encode_utf16());

        let byte_len = wide
            .len()
            .checked_mul(2)
            .filter(|len| *len <= u16::MAX as usize)
            .ok_or(STATUS_NAME_TOO_LONG)? as u16;

        let mut name = UNICODE_STRING {
            Length: byte_len,
            MaximumLength: byte_len,
            Buffer: wide.as_mut_ptr(),
        };
        let mut attributes = OBJECT_ATTRIBUTES {
            Length: size_of::<OBJECT_ATTRIBUTES>() as u32,
            RootDirectory: ptr::null_mut(),
            ObjectName: &mut name,
            Attributes: OBJ_CASE_INSENSITIVE | OBJ_KERNEL_HANDLE,
            SecurityDescriptor: ptr::null_mut(),
            SecurityQualityOfService: ptr::null_mut(),
        };

        let mut handle: HANDLE = ptr::null_mut();
        let mut io_status: IO_STATUS_BLOCK = unsafe { zeroed() };
        let status = unsafe {
            ZwCreateFile(
                &mut handle,
                request.access | SYNCHRONIZE,
                &mut attributes,
                &mut io_status,
                ptr::null_mut(),
                FILE_ATTRIBUTE_NORMAL,
                request.share,
                request.disposition,
                FILE_NON_DIRECTORY_FILE | FILE_SYNCHRONOUS_IO_NONALERT,
                ptr::null_mut(),
                0,
            )
        };

        if status < 0 {
            return Err(status);
        }
        Ok(Self { handle })
    }
}

impl EvidenceFs for KernelPlatform {
    type Source = KernelFile;
    type Sink = KernelFile;

    /// Shares everything: the monitored process still holds the file open
    fn open_source(&self, path: &str) -> Result<KernelFile, NtStatus> {
        KernelFile::open(
            path,
            OpenRequest {
                access: GENERIC_READ,
                share: FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE,
                disposition: FILE_OPEN,
            },
        )
    }

    fn create_exclusive(&self, path: &str) -> Result<KernelFile, NtStatus> {
        KernelFile::open(
            path,
            OpenRequest {
                access: GENERIC_WRITE | DELETE,
                share: 0,
                disposition: FILE_CREATE,
            },
        )
    }

    fn read(&self, source: &mut KernelFile, buf: &mut [u8]) -> Result<usize, NtStatus> {
        let mut io_status: IO_STATUS_BLOCK = unsafe { zeroed() };
        let status = unsafe {
            ZwReadFile(
                source.handle,
                ptr::null_mut(),
                None,
                ptr::null_mut(),
                &mut io_status,
                buf.as_mut_ptr().cast(),
                buf.len() as u32,
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };

        match status {
            STATUS_END_OF_FILE => Ok(0),
            status if status < 0 => Err(status),
            _ => Ok(io_status.Information as usize),
        }
    }

    fn write(&self, sink: &mut KernelFile, data: &[u8]) -> Result<(), NtStatus> {
        let mut io_status: IO_STATUS_BLOCK = unsafe { zeroed() };
        let status = unsafe {
            ZwWriteFile(
                sink.handle,
                ptr::null_mut(),
                None,
                ptr::null_mut(),
                &mut io_status,
                data.as_ptr() as *mut _,
                data.len() as u32,
                ptr::null_mut(),
                ptr::null_mut(),
            )
        };

        if status < 0 {
            return Err(status);
        }
        Ok(())
    }

    fn discard(&self, sink: KernelFile) {
        let mut info = FILE_DISPOSITION_INFORMATION { DeleteFile: 1 };
        let mut io_status: IO_STATUS_BLOCK = unsafe { zeroed() };
        let status = unsafe {
            ZwSetInformationFile(
                sink.handle,
                &mut io_status,
                (&mut info as *mut FILE_DISPOSITION_INFORMATION).cast(),
                size_of::<FILE_DISPOSITION_INFORMATION>() as u32,
                FileDispositionInformation,
            )
        };
        if status < 0 {
            log::warn!("Partial evidence copy could not be deleted: {:#x}", status);
        }
        // the delete takes effect when `sink` closes here
    }
}
