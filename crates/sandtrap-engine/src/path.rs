//! Full-path reconstruction for names relative to a root directory handle

use alloc::string::String;

use sandtrap_common::Handle;

use crate::error::NameError;
use crate::platform::ObjectNames;

/// Separator placed between a root directory's name and the relative name
pub const SEPARATOR: char = '\\';

/// Join a resolved root name and a relative name
///
/// The result is exactly `root` + `\` + `relative`, with no separator
/// collapsing, so the log shows what the caller actually passed.
pub fn join(root: &str, relative: &str) -> Result<String, NameError> {
    let mut path = String::new();
    path.try_reserve_exact(root.len() + SEPARATOR.len_utf8() + relative.len())
        .map_err(|_| NameError::Allocation)?;
    path.push_str(root);
    path.push(SEPARATOR);
    path.push_str(relative);
    Ok(path)
}

/// Full path named by an `OBJECT_ATTRIBUTES` pair
///
/// Without a root the relative name already is the full path.
pub fn reconstruct<N: ObjectNames + ?Sized>(
    names: &N,
    root: Handle,
    relative: String,
) -> Result<String, NameError> {
    if root.is_null() {
        return Ok(relative);
    }
    let root_name = names.resolve_name(root)?;
    join(&root_name, &relative)
}
