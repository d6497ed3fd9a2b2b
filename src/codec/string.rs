//! Plain text codec
//!
//! Scalars are written as their text form so scripts can read them with
//! `tonumber`/string functions. Lists and nil have no text form.

use bytes::Bytes;

use crate::error::{FunctionError, Result};
use super::{Codec, Value};

/// UTF-8 text codec
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Codec for StringCodec {
    fn name(&self) -> &'static str {
        "string"
    }

    fn encode(&self, value: &Value) -> Result<Bytes> {
        match value {
            Value::Str(s) => Ok(Bytes::copy_from_slice(s.as_bytes())),
            Value::Bytes(b) => Ok(Bytes::copy_from_slice(b)),
            Value::Int(n) => Ok(Bytes::from(n.to_string())),
            Value::Float(n) => Ok(Bytes::from(n.to_string())),
            Value::Bool(b) => Ok(Bytes::from(b.to_string())),
            Value::Nil | Value::List(_) => Err(FunctionError::Encoding(format!(
                "string codec cannot encode a {} value",
                value.kind()
            ))),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        // Non UTF-8 payloads are handed back untouched
        match std::str::from_utf8(bytes) {
            Ok(s) => Ok(Value::Str(s.to_string())),
            Err(_) => Ok(Value::Bytes(bytes.to_vec())),
        }
    }
}
