//! Kernel pool allocations
//!
//! Scratch buffers handed to kernel routines that fill a caller-sized
//! buffer, such as the object name query. Memory is zeroed on allocation
//! and again before it is returned to the pool.

use core::ptr;
use wdk::println;
use wdk_sys::{
    ntddk::{ExAllocatePool2, ExFreePoolWithTag},
    POOL_FLAG_PAGED, PVOID,
};

use crate::DRIVER_NAME;

/// Pool tag for our allocations (must be 4 chars)
/// 'STRP' = Sandtrap
pub const POOL_TAG: u32 = u32::from_le_bytes(*b"STRP");

/// Owned paged-pool buffer
///
/// Paged pool: only usable below `DISPATCH_LEVEL`, which holds for every
/// intercepted service.
pub struct PoolAllocation {
    ptr: PVOID,
    size: usize,
}

impl PoolAllocation {
    /// Allocate `size` zeroed bytes
    ///
    /// # Safety
    /// IRQL < DISPATCH_LEVEL
    pub unsafe fn new(size: usize) -> Option<Self> {
        if size == 0 {
            return None;
        }

        let ptr = unsafe { ExAllocatePool2(POOL_FLAG_PAGED as u64, size as u64, POOL_TAG) };

        if ptr.is_null() {
            println!("[{}] Pool allocation failed: size={}", DRIVER_NAME, size);
            return None;
        }

        // Zero the memory for security
        unsafe {
            ptr::write_bytes(ptr as *mut u8, 0, size);
        }

        Some(Self { ptr, size })
    }

    /// Get raw pointer to the allocation
    pub fn as_mut_ptr(&mut self) -> PVOID {
        self.ptr
    }

    /// Get the size of the allocation
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Drop for PoolAllocation {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            // Zero memory before freeing (security)
            unsafe {
                ptr::write_bytes(self.ptr as *mut u8, 0, self.size);
                ExFreePoolWithTag(self.ptr, POOL_TAG);
            }
        }
    }
}
