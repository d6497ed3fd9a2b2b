//! Argument encoder
//!
//! Flattens a call into the argument sequence `FCALL`/`FCALL_RO` expect:
//!
//! ```text
//! ┌──────────┬─────────┬────────────────────┬──────────────────────┐
//! │   name   │ numkeys │ key1 .. keyN (raw) │ value1 .. valueM     │
//! │          │  (= N)  │                    │ (codec encoded)      │
//! └──────────┴─────────┴────────────────────┴──────────────────────┘
//! ```

use bytes::Bytes;

use crate::codec::{Codec, Value};
use crate::error::{FunctionError, Result};

/// Encoded arguments of one function call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArgs {
    args: Vec<Bytes>,
    key_count: usize,
}

impl CallArgs {
    /// Full argument sequence, ready for the transport
    pub fn as_slice(&self) -> &[Bytes] {
        &self.args
    }

    pub fn into_vec(self) -> Vec<Bytes> {
        self.args
    }

    pub fn function_name(&self) -> &[u8] {
        &self.args[0]
    }

    pub fn key_count(&self) -> usize {
        self.key_count
    }

    pub fn keys(&self) -> &[Bytes] {
        &self.args[2..2 + self.key_count]
    }

    pub fn values(&self) -> &[Bytes] {
        &self.args[2 + self.key_count..]
    }
}

/// Reject names that cannot be sent as a single token
pub fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FunctionError::Validation(format!("{} name is empty", kind)));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(FunctionError::Validation(format!(
            "{} name {:?} contains whitespace",
            kind, name
        )));
    }
    Ok(())
}

/// Encode a call's arguments
///
/// Keys are sent as raw bytes; values go through `codec`. Fails before
/// anything is sent if the name is invalid or a value cannot be encoded.
pub fn encode_call_args<K: AsRef<[u8]>>(
    function: &str,
    keys: &[K],
    values: &[Value],
    codec: &dyn Codec,
) -> Result<CallArgs> {
    validate_name("Function", function)?;

    let mut args = Vec::with_capacity(2 + keys.len() + values.len());
    args.push(Bytes::copy_from_slice(function.as_bytes()));
    args.push(Bytes::from(keys.len().to_string()));
    args.extend(keys.iter().map(|key| Bytes::copy_from_slice(key.as_ref())));
    for value in values {
        args.push(codec.encode(value)?);
    }

    Ok(CallArgs {
        args,
        key_count: keys.len(),
    })
}
