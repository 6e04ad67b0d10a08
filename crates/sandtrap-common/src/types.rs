//! Identifier newtypes crossing the interception boundary

use core::fmt;

/// Process identifier as returned by `PsGetCurrentProcessId`
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ProcessId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kernel object handle value
///
/// Handle values are only meaningful inside the process that owns them.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Handle(pub usize);

impl Handle {
    pub const NULL: Handle = Handle(0);

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::LowerHex for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Address in the caller's (untrusted) address space
///
/// Never dereferenced directly: every read goes through the engine's
/// bounded accessor.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UserPtr(pub usize);

impl UserPtr {
    pub const NULL: UserPtr = UserPtr(0);

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Address `offset` bytes further, `None` on wrap-around
    pub const fn offset(self, offset: usize) -> Option<UserPtr> {
        match self.0.checked_add(offset) {
            Some(address) => Some(UserPtr(address)),
            None => None,
        }
    }
}

/// Previous processor mode of the thread making the call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorMode {
    /// Call originated in kernel mode (trusted, never intercepted)
    Kernel,
    /// Call originated from a user-mode thread
    User,
}
