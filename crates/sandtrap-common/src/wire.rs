//! Record grammar shared by the encoder and the collector
//!
//! One record per intercepted call:
//!
//! ```text
//! <success:0|1>,<status:int>,<type-tags>,<name>-><value>{,<name>-><value>}*
//! ```
//!
//! Field order is fixed per layout and consumers parse positionally.
//! Values never contain a raw `,` or control character: the encoder writes
//! those as `\xNN`.

use alloc::vec::Vec;

use crate::signature::Signature;

/// Placeholder for any value that could not be resolved
pub const SENTINEL: &str = "ERROR";

/// Separator between a field name and its value
pub const NAME_VALUE_SEPARATOR: &str = "->";

/// Fixed shape of the records emitted for one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    pub signature: Signature,
    /// Field names in wire order
    pub fields: &'static [&'static str],
    /// One type tag per field, in order
    pub tags: &'static str,
    /// Pre-formatted record emitted when no record buffer can be obtained
    pub fallback: &'static str,
}

impl RecordLayout {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub const QUERY_ATTRIBUTES: RecordLayout = RecordLayout {
    signature: Signature::NtQueryAttributesFile,
    fields: &["FilePath"],
    tags: "s",
    fallback: "0,-1,s,FilePath->ERROR",
};

pub const DEVICE_IO_CONTROL: RecordLayout = RecordLayout {
    signature: Signature::NtDeviceIoControlFile,
    fields: &["InputBuffer", "FileHandle", "ControlCode", "OutputBuffer"],
    tags: "ssss",
    fallback: "0,-1,ssss,InputBuffer->ERROR,FileHandle->ERROR,ControlCode->ERROR,OutputBuffer->ERROR",
};

pub const CLOSE: RecordLayout = RecordLayout {
    signature: Signature::NtClose,
    fields: &["FileHandle", "FileToDump"],
    tags: "ss",
    fallback: "0,-1,ss,FileHandle->ERROR,FileToDump->ERROR",
};

pub const DISPOSITION_DELETE: RecordLayout = RecordLayout {
    signature: Signature::DeleteFileW,
    fields: &["FilePath", "FileToDump"],
    tags: "ss",
    fallback: "0,-1,ss,FilePath->ERROR,FileToDump->ERROR",
};

pub const RENAME: RecordLayout = RecordLayout {
    signature: Signature::NtSetInformationFile,
    fields: &["FileHandle", "OriginalName", "RenamedName", "FileInformationClass"],
    tags: "ssss",
    fallback: "0,-1,ssss,FileHandle->ERROR,OriginalName->ERROR,RenamedName->ERROR,FileInformationClass->ERROR",
};

pub const OPEN: RecordLayout = RecordLayout {
    signature: Signature::NtOpenFile,
    fields: &["FileHandle", "DesiredAccess", "OpenOptions", "ShareAccess", "FilePath"],
    tags: "sssss",
    fallback: "0,-1,sssss,FileHandle->ERROR,DesiredAccess->ERROR,OpenOptions->ERROR,ShareAccess->ERROR,FilePath->ERROR",
};

pub const DELETE: RecordLayout = RecordLayout {
    signature: Signature::NtDeleteFile,
    fields: &["FileName", "FileToDump"],
    tags: "ss",
    fallback: "0,-1,ss,FileName->ERROR,FileToDump->ERROR",
};

pub const CREATE: RecordLayout = RecordLayout {
    signature: Signature::NtCreateFile,
    fields: &[
        "FileHandle",
        "DesiredAccess",
        "FileAttributes",
        "CreateDisposition",
        "CreateOptions",
        "ShareAccess",
        "FilePath",
    ],
    tags: "sssssss",
    fallback: "0,-1,sssssss,FileHandle->ERROR,DesiredAccess->ERROR,FileAttributes->ERROR,CreateDisposition->ERROR,CreateOptions->ERROR,ShareAccess->ERROR,FilePath->ERROR",
};

pub const READ: RecordLayout = RecordLayout {
    signature: Signature::NtReadFile,
    fields: &["FileHandle", "length", "buffer", "offset"],
    tags: "ssss",
    fallback: "0,-1,ssss,FileHandle->ERROR,length->ERROR,buffer->ERROR,offset->ERROR",
};

pub const WRITE: RecordLayout = RecordLayout {
    signature: Signature::NtWriteFile,
    fields: &["FileHandle", "length", "buffer", "offset"],
    tags: "ssss",
    fallback: "0,-1,ssss,FileHandle->ERROR,length->ERROR,buffer->ERROR,offset->ERROR",
};

/// Every layout the engine can emit
pub const ALL_LAYOUTS: [&RecordLayout; 10] = [
    &QUERY_ATTRIBUTES,
    &DEVICE_IO_CONTROL,
    &CLOSE,
    &DISPOSITION_DELETE,
    &RENAME,
    &OPEN,
    &DELETE,
    &CREATE,
    &READ,
    &WRITE,
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("record is empty")]
    Empty,

    #[error("success flag must be 0 or 1")]
    BadSuccessFlag,

    #[error("status is not an integer")]
    BadStatus,

    #[error("record is missing its type tags")]
    MissingTags,

    #[error("{tags} type tags for {fields} fields")]
    TagCountMismatch { tags: usize, fields: usize },

    #[error("field {index} has no name/value separator")]
    MissingSeparator { index: usize },
}

/// Borrowed view of one decoded record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord<'a> {
    pub success: bool,
    pub status: i32,
    pub tags: &'a str,
    pub fields: Vec<(&'a str, &'a str)>,
}

impl<'a> ParsedRecord<'a> {
    pub fn parse(line: &'a str) -> Result<Self, ParseError> {
        if line.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut parts = line.split(',');

        let success = match parts.next() {
            Some("1") => true,
            Some("0") => false,
            _ => return Err(ParseError::BadSuccessFlag),
        };

        let status = parts
            .next()
            .and_then(|raw| raw.parse::<i32>().ok())
            .ok_or(ParseError::BadStatus)?;

        let tags = parts.next().ok_or(ParseError::MissingTags)?;

        let mut fields = Vec::new();
        for (index, part) in parts.enumerate() {
            let (name, value) = part
                .split_once(NAME_VALUE_SEPARATOR)
                .ok_or(ParseError::MissingSeparator { index })?;
            fields.push((name, value));
        }

        if tags.chars().count() != fields.len() {
            return Err(ParseError::TagCountMismatch {
                tags: tags.chars().count(),
                fields: fields.len(),
            });
        }

        Ok(Self { success, status, tags, fields })
    }

    /// Value of the first field called `name`
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| *value)
    }

    /// True when the field names appear exactly in the layout's order
    pub fn matches_layout(&self, layout: &RecordLayout) -> bool {
        self.tags == layout.tags
            && self.fields.len() == layout.fields.len()
            && self
                .fields
                .iter()
                .zip(layout.fields)
                .all(|((name, _), expected)| name == expected)
    }
}

/// Decode `\xNN` escapes back into raw bytes
///
/// Malformed escapes are kept literally.
pub fn unescape(value: &str) -> Vec<u8> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() && bytes[i + 1] == b'x' {
            let decoded = core::str::from_utf8(&bytes[i + 2..i + 4])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = decoded {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    out
}
