//! RESP2 codec
//!
//! Encoding of commands and parsing of replies for the store's wire protocol.
//!
//! ## Wire Format
//!
//! ### Request
//! ```text
//! *<argc>\r\n
//! $<len>\r\n<arg bytes>\r\n     (repeated argc times)
//! ```
//!
//! ### Reply (first byte selects the type)
//! ```text
//! +OK\r\n                 simple string
//! -ERR message\r\n        error
//! :42\r\n                 integer
//! $5\r\nhello\r\n         bulk string ($-1 is nil)
//! *2\r\n...               array (*-1 is nil)
//! ```

use std::io::{BufRead, Read, Write};

use bytes::Bytes;

use crate::error::{FunctionError, Result};

/// Maximum bulk string size accepted from the store (512 MB)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum length of a reply header or status line, CRLF excluded (64 KB)
pub const MAX_LINE_SIZE: usize = 64 * 1024;

/// Maximum nesting depth accepted for arrays
pub const MAX_DEPTH: usize = 32;

/// A parsed reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// `+OK` style status reply
    Simple(String),

    /// `-ERR ...` error reply
    Error(String),

    /// `:123` integer reply
    Integer(i64),

    /// `$...` bulk string
    Bulk(Bytes),

    /// `*...` array
    Array(Vec<RespValue>),

    /// `$-1` or `*-1`
    Nil,
}

impl RespValue {
    /// Short type name, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            RespValue::Simple(_) => "simple string",
            RespValue::Error(_) => "error",
            RespValue::Integer(_) => "integer",
            RespValue::Bulk(_) => "bulk string",
            RespValue::Array(_) => "array",
            RespValue::Nil => "nil",
        }
    }

    /// Text content of a simple or bulk string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RespValue::Simple(s) => Some(s),
            RespValue::Bulk(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a command as an array of bulk strings into `out`
pub fn encode_command<A: AsRef<[u8]>>(args: &[A], out: &mut Vec<u8>) {
    push_header(out, b'*', args.len());
    for arg in args {
        let arg = arg.as_ref();
        push_header(out, b'$', arg.len());
        out.extend_from_slice(arg);
        out.extend_from_slice(b"\r\n");
    }
}

/// Encode a reply into `out`
///
/// Used by test servers and tooling that need to speak the store's side.
pub fn encode_reply(value: &RespValue, out: &mut Vec<u8>) {
    match value {
        RespValue::Simple(s) => {
            out.push(b'+');
            out.extend_from_slice(s.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        RespValue::Error(s) => {
            out.push(b'-');
            out.extend_from_slice(s.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        RespValue::Integer(n) => {
            out.push(b':');
            out.extend_from_slice(n.to_string().as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        RespValue::Bulk(data) => {
            push_header(out, b'$', data.len());
            out.extend_from_slice(data);
            out.extend_from_slice(b"\r\n");
        }
        RespValue::Array(items) => {
            push_header(out, b'*', items.len());
            for item in items {
                encode_reply(item, out);
            }
        }
        RespValue::Nil => out.extend_from_slice(b"$-1\r\n"),
    }
}

/// Write an encoded command to a stream
pub fn write_command<W: Write, A: AsRef<[u8]>>(writer: &mut W, args: &[A]) -> Result<()> {
    let mut buf = Vec::new();
    encode_command(args, &mut buf);
    writer.write_all(&buf)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Parsing
// =============================================================================

/// Read one complete reply from a buffered stream
///
/// Blocks until the reply is complete or the stream fails.
pub fn read_reply<R: BufRead>(reader: &mut R, line_buf: &mut Vec<u8>) -> Result<RespValue> {
    read_value(reader, line_buf, 0)
}

fn read_value<R: BufRead>(reader: &mut R, line_buf: &mut Vec<u8>, depth: usize) -> Result<RespValue> {
    if depth > MAX_DEPTH {
        return Err(FunctionError::Protocol(format!(
            "Reply nested deeper than {} levels",
            MAX_DEPTH
        )));
    }

    read_line(reader, line_buf)?;
    let Some((&marker, rest)) = line_buf.split_first() else {
        return Err(FunctionError::Protocol("Empty reply line".to_string()));
    };

    match marker {
        b'+' => Ok(RespValue::Simple(text(rest)?)),
        b'-' => Ok(RespValue::Error(text(rest)?)),
        b':' => Ok(RespValue::Integer(parse_i64(rest)?)),
        b'$' => {
            let len = parse_i64(rest)?;
            read_bulk(reader, len)
        }
        b'*' => {
            let len = parse_i64(rest)?;
            if len < 0 {
                return Ok(RespValue::Nil);
            }
            let mut items = Vec::with_capacity((len as usize).min(1024));
            for _ in 0..len {
                items.push(read_value(reader, line_buf, depth + 1)?);
            }
            Ok(RespValue::Array(items))
        }
        other => Err(FunctionError::Protocol(format!(
            "Unknown reply type byte: 0x{:02x}",
            other
        ))),
    }
}

fn read_bulk<R: BufRead>(reader: &mut R, len: i64) -> Result<RespValue> {
    if len < 0 {
        return Ok(RespValue::Nil);
    }
    let len = len as usize;
    if len > MAX_BULK_SIZE {
        return Err(FunctionError::Protocol(format!(
            "Bulk string too large: {} bytes (max {})",
            len, MAX_BULK_SIZE
        )));
    }

    let mut data = vec![0u8; len];
    reader.read_exact(&mut data)?;

    let mut crlf = [0u8; 2];
    reader.read_exact(&mut crlf)?;
    if crlf != *b"\r\n" {
        return Err(FunctionError::Protocol(
            "Bulk string not terminated by CRLF".to_string(),
        ));
    }

    Ok(RespValue::Bulk(Bytes::from(data)))
}

fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> Result<()> {
    buf.clear();
    let limit = (MAX_LINE_SIZE + 2) as u64;
    let read = reader.by_ref().take(limit).read_until(b'\n', buf)?;
    if read == 0 {
        return Err(FunctionError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed by store",
        )));
    }
    if !buf.ends_with(b"\r\n") {
        if buf.len() as u64 >= limit {
            return Err(FunctionError::Protocol(format!(
                "Reply line longer than {} bytes",
                MAX_LINE_SIZE
            )));
        }
        return Err(FunctionError::Protocol(
            "Reply line not terminated by CRLF".to_string(),
        ));
    }
    buf.truncate(buf.len() - 2);
    Ok(())
}

fn text(data: &[u8]) -> Result<String> {
    String::from_utf8(data.to_vec())
        .map_err(|_| FunctionError::Protocol("Status line is not valid UTF-8".to_string()))
}

fn parse_i64(data: &[u8]) -> Result<i64> {
    std::str::from_utf8(data)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            FunctionError::Protocol(format!(
                "Invalid integer in reply: {:?}",
                String::from_utf8_lossy(data)
            ))
        })
}

fn push_header(out: &mut Vec<u8>, marker: u8, len: usize) {
    out.push(marker);
    out.extend_from_slice(len.to_string().as_bytes());
    out.extend_from_slice(b"\r\n");
}
