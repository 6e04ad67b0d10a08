//! Log Record Encoder
//!
//! Renders one audit record per intercepted call in the grammar defined by
//! [`sandtrap_common::wire`]. This is the only place record text is built.
//!
//! # Bounds
//! The record buffer is reserved once, up front, at the configured
//! maximum. Before a value is written the encoder sets aside room for
//! every remaining field in its sentinel form, so a long value can only
//! eat into its own share and the field order always survives. Numbers
//! that do not fit are replaced by the sentinel; text is cut on a whole
//! character or escape sequence.
//!
//! If the buffer cannot be reserved, or the layout cannot fit even with
//! sentinels everywhere, the layout's pre-formatted fallback is used.

use alloc::string::String;
use core::fmt::{self, Write};

use sandtrap_common::wire::{RecordLayout, NAME_VALUE_SEPARATOR, SENTINEL};
use sandtrap_common::{nt_success, NtStatus};

/// One field value, before escaping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'a> {
    /// Text, control characters and `,` escaped
    Str(&'a str),
    /// `0x%08x`: handles, access masks, control codes
    Hex8(u64),
    /// `0x%x`: options, attributes, share modes, dispositions
    Hex(u32),
    /// Decimal: lengths, offsets, information classes
    Int(i64),
    /// Captured data, at most `buffer_log_max` bytes of it
    Bytes(&'a [u8]),
    /// Value could not be resolved
    Sentinel,
}

/// What the record's status slot reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Status of the real call, or of the fabricated one
    Completed(NtStatus),
    /// Parameter capture failed with this exception code
    Faulted(NtStatus),
}

impl Outcome {
    fn header(self) -> (bool, NtStatus) {
        match self {
            Outcome::Completed(status) if nt_success(status) => (true, 0),
            Outcome::Completed(status) => (false, status),
            Outcome::Faulted(code) => (false, code),
        }
    }
}

/// A rendered record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Formatted(String),
    /// No buffer could be obtained; the layout's static record
    Fallback(&'static str),
}

impl Record {
    pub fn as_str(&self) -> &str {
        match self {
            Record::Formatted(text) => text.as_str(),
            Record::Fallback(text) => *text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Record::Fallback(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RecordEncoder {
    max_len: usize,
    buffer_log_max: usize,
}

impl RecordEncoder {
    pub fn new(max_len: usize, buffer_log_max: usize) -> Self {
        Self { max_len, buffer_log_max }
    }

    /// Render `values` in `layout` order
    ///
    /// Missing values render as the sentinel and surplus values are
    /// ignored, so the field list always matches the layout.
    pub fn encode(&self, layout: &RecordLayout, outcome: Outcome, values: &[Value<'_>]) -> Record {
        let (success, status) = outcome.header();

        let mut header = Digits::new();
        // Digits holds any i32, the write cannot fail
        let _ = write!(header, "{},{},", u8::from(success), status);

        let field_costs = layout.fields.iter().map(|name| sentinel_cost(name));
        let skeleton = header.as_str().len() + layout.tags.len() + field_costs.sum::<usize>();
        if skeleton > self.max_len {
            return Record::Fallback(layout.fallback);
        }

        let mut out = String::new();
        if out.try_reserve_exact(self.max_len).is_err() {
            return Record::Fallback(layout.fallback);
        }

        out.push_str(header.as_str());
        out.push_str(layout.tags);

        let mut reserved: usize = layout.fields.iter().map(|name| sentinel_cost(name)).sum();
        for (index, name) in layout.fields.iter().enumerate() {
            reserved -= sentinel_cost(name);
            out.push(',');
            out.push_str(name);
            out.push_str(NAME_VALUE_SEPARATOR);

            let budget = self.max_len - out.len() - reserved;
            let value = values.get(index).copied().unwrap_or(Value::Sentinel);
            self.render_value(&mut out, value, budget);
        }

        Record::Formatted(out)
    }

    fn render_value(&self, out: &mut String, value: Value<'_>, budget: usize) {
        match value {
            Value::Str(text) => push_escaped_str(out, text, budget),
            Value::Bytes(bytes) => {
                let shown = &bytes[..bytes.len().min(self.buffer_log_max)];
                push_escaped_bytes(out, shown, budget);
            }
            Value::Hex8(number) => push_number(out, format_args!("{number:#010x}"), budget),
            Value::Hex(number) => push_number(out, format_args!("{number:#x}"), budget),
            Value::Int(number) => push_number(out, format_args!("{number}"), budget),
            Value::Sentinel => out.push_str(SENTINEL),
        }
    }
}

/// `,name->ERROR`
fn sentinel_cost(name: &str) -> usize {
    1 + name.len() + NAME_VALUE_SEPARATOR.len() + SENTINEL.len()
}

fn push_number(out: &mut String, args: fmt::Arguments<'_>, budget: usize) {
    let mut digits = Digits::new();
    if digits.write_fmt(args).is_ok() && digits.as_str().len() <= budget {
        out.push_str(digits.as_str());
    } else {
        out.push_str(SENTINEL);
    }
}

/// `\` is escaped only where it would read as the start of `\xNN`
fn push_escaped_str(out: &mut String, text: &str, budget: usize) {
    let mut used = 0;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let escape = c.is_control() || c == ',' || (c == '\\' && chars.peek() == Some(&'x'));
        let cost = if escape { 4 } else { c.len_utf8() };
        if used + cost > budget {
            break;
        }
        if escape {
            push_hex_escape(out, c as u32 as u8);
        } else {
            out.push(c);
        }
        used += cost;
    }
}

fn push_escaped_bytes(out: &mut String, bytes: &[u8], budget: usize) {
    let mut used = 0;
    for &byte in bytes {
        let verbatim = (0x20..0x7f).contains(&byte) && byte != b',' && byte != b'\\';
        let cost = if verbatim { 1 } else { 4 };
        if used + cost > budget {
            break;
        }
        if verbatim {
            out.push(char::from(byte));
        } else {
            push_hex_escape(out, byte);
        }
        used += cost;
    }
}

fn push_hex_escape(out: &mut String, byte: u8) {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    out.push('\\');
    out.push('x');
    out.push(char::from(HEX[usize::from(byte >> 4)]));
    out.push(char::from(HEX[usize::from(byte & 0xf)]));
}

/// Stack buffer for one formatted number
struct Digits {
    buf: [u8; 24],
    len: usize,
}

impl Digits {
    fn new() -> Self {
        Self { buf: [0; 24], len: 0 }
    }

    fn as_str(&self) -> &str {
        // only ASCII is ever written through `write_str`
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }
}

impl Write for Digits {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len.checked_add(s.len()).ok_or(fmt::Error)?;
        let slot = self.buf.get_mut(self.len..end).ok_or(fmt::Error)?;
        slot.copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandtrap_common::status::{STATUS_ACCESS_VIOLATION, STATUS_OBJECT_NAME_NOT_FOUND};
    use sandtrap_common::wire::{CREATE, OPEN, QUERY_ATTRIBUTES, READ};

    fn encoder() -> RecordEncoder {
        RecordEncoder::new(1024, 256)
    }

    #[test]
    fn renders_open_record() {
        let record = encoder().encode(
            &OPEN,
            Outcome::Completed(0),
            &[
                Value::Hex8(0x40),
                Value::Hex8(0x0012_0089),
                Value::Hex(0x60),
                Value::Hex(0x1),
                Value::Str("\\Device\\Foo\\bar.txt"),
            ],
        );

        assert_eq!(
            record.as_str(),
            "1,0,sssss,FileHandle->0x00000040,DesiredAccess->0x00120089,\
             OpenOptions->0x60,ShareAccess->0x1,FilePath->\\Device\\Foo\\bar.txt"
        );
    }

    #[test]
    fn failure_carries_signed_status() {
        let record = encoder().encode(
            &QUERY_ATTRIBUTES,
            Outcome::Completed(STATUS_OBJECT_NAME_NOT_FOUND),
            &[Value::Str("x")],
        );
        assert_eq!(record.as_str(), "0,-1073741772,s,FilePath->x");
    }

    #[test]
    fn fault_uses_exception_code() {
        let record = encoder().encode(
            &QUERY_ATTRIBUTES,
            Outcome::Faulted(STATUS_ACCESS_VIOLATION),
            &[Value::Sentinel],
        );
        assert_eq!(record.as_str(), "0,-1073741819,s,FilePath->ERROR");
    }

    #[test]
    fn missing_values_become_sentinels() {
        let record = encoder().encode(&READ, Outcome::Completed(0), &[Value::Hex8(4)]);
        assert_eq!(
            record.as_str(),
            "1,0,ssss,FileHandle->0x00000004,length->ERROR,buffer->ERROR,offset->ERROR"
        );
    }

    #[test]
    fn escapes_separators_and_controls() {
        let record = encoder().encode(
            &QUERY_ATTRIBUTES,
            Outcome::Completed(0),
            &[Value::Str("a,b\nc\u{7f}")],
        );
        assert_eq!(record.as_str(), "1,0,s,FilePath->a\\x2cb\\x0ac\\x7f");
    }

    #[test]
    fn backslash_before_x_survives_unescape() {
        let path = "\\??\\C:\\x41dir\\\\xfile";
        let record = encoder().encode(&QUERY_ATTRIBUTES, Outcome::Completed(0), &[Value::Str(path)]);

        assert_eq!(
            record.as_str(),
            "1,0,s,FilePath->\\??\\C:\\x5cx41dir\\\\x5cxfile"
        );
        let parsed = sandtrap_common::wire::ParsedRecord::parse(record.as_str()).unwrap();
        let decoded = sandtrap_common::wire::unescape(parsed.get("FilePath").unwrap());
        assert_eq!(decoded, path.as_bytes());
    }

    #[test]
    fn bytes_render_printable_ascii() {
        let record = encoder().encode(
            &READ,
            Outcome::Completed(0),
            &[
                Value::Hex8(4),
                Value::Int(5),
                Value::Bytes(b"MZ\x90,\\"),
                Value::Int(0),
            ],
        );
        assert_eq!(
            record.as_str(),
            "1,0,ssss,FileHandle->0x00000004,length->5,buffer->MZ\\x90\\x2c\\x5c,offset->0"
        );
    }

    #[test]
    fn buffer_capture_is_capped() {
        let data = [b'A'; 64];
        let record = RecordEncoder::new(1024, 8).encode(
            &READ,
            Outcome::Completed(0),
            &[Value::Hex8(4), Value::Int(64), Value::Bytes(&data), Value::Int(0)],
        );
        assert!(record.as_str().contains("buffer->AAAAAAAA,offset"));
    }

    #[test]
    fn long_value_is_truncated_but_later_fields_survive() {
        let path = "\\Device\\HarddiskVolume2\\".repeat(20);
        let encoder = RecordEncoder::new(200, 256);
        let record = encoder.encode(
            &CREATE,
            Outcome::Completed(0),
            &[
                Value::Hex8(0x40),
                Value::Hex8(0x1),
                Value::Hex(0x80),
                Value::Hex(0x1),
                Value::Hex(0x60),
                Value::Hex(0x1),
                Value::Str(&path),
            ],
        );

        let text = record.as_str();
        assert!(!record.is_fallback());
        assert!(text.len() <= 200);
        assert!(text.starts_with("1,0,sssssss,FileHandle->0x00000040,"));
        assert!(text.contains(",FilePath->\\Device"));
    }

    #[test]
    fn tiny_limit_uses_fallback() {
        let record = RecordEncoder::new(16, 256).encode(&OPEN, Outcome::Completed(0), &[]);
        assert!(record.is_fallback());
        assert_eq!(record.as_str(), OPEN.fallback);
    }

    #[test]
    fn number_that_does_not_fit_becomes_sentinel() {
        let mut out = String::new();
        push_number(&mut out, format_args!("{:#010x}", 0x1234_5678u64), 5);
        assert_eq!(out, SENTINEL);
    }
}
