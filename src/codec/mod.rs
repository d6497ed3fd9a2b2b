//! Codec Module
//!
//! Pluggable value serialization for function arguments and results.
//!
//! Keys are always sent as raw bytes. Values go through a [`Codec`]; the
//! function façade holds two of them (plain values and map values) and picks
//! one from the declared return type.
//!
//! ## Provided Codecs
//! - [`StringCodec`]: scalars as UTF-8 text, readable from Lua as strings
//! - [`BincodeCodec`]: any [`Value`] as compact bincode

mod value;
mod string;
mod bincode;

use std::fmt::Debug;

use bytes::Bytes;

use crate::error::Result;

pub use value::Value;
pub use string::StringCodec;
pub use self::bincode::BincodeCodec;

/// Encode/decode pair for opaque values
pub trait Codec: Send + Sync + Debug {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Serialize a value into the bytes sent as a function argument
    fn encode(&self, value: &Value) -> Result<Bytes>;

    /// Deserialize a bulk reply produced by a function
    fn decode(&self, bytes: &[u8]) -> Result<Value>;
}
