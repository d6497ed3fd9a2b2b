//! Bincode codec
//!
//! Compact binary encoding of any [`Value`]. Scripts treat the payload as an
//! opaque string and hand it back unchanged.

use bytes::Bytes;

use crate::error::{FunctionError, Result};
use super::{Codec, Value};

/// Binary codec backed by bincode
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn name(&self) -> &'static str {
        "bincode"
    }

    fn encode(&self, value: &Value) -> Result<Bytes> {
        bincode::serialize(value)
            .map(Bytes::from)
            .map_err(|e| FunctionError::Encoding(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value> {
        bincode::deserialize(bytes).map_err(|e| FunctionError::Decoding(e.to_string()))
    }
}
