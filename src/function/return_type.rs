//! Return-type registry
//!
//! The wire protocol does not say how a function's reply should be read, so
//! the caller declares it. Each [`ReturnType`] is bound to:
//! - the read-only command descriptor used for READ calls
//! - the codec slot (plain value or map value)
//! - the decoder applied to the raw reply
//!
//! All three are `match`es over the enum, so adding a variant without
//! wiring it up does not compile.

use std::fmt;
use std::str::FromStr;

use crate::codec::{Codec, Value};
use crate::error::{FunctionError, Result};
use crate::protocol::command::{
    FCALL_BOOLEAN_SAFE, FCALL_LIST, FCALL_LONG, FCALL_MAP_VALUE, FCALL_MAP_VALUE_LIST,
    FCALL_OBJECT, FCALL_STRING,
};
use crate::protocol::{CommandDescriptor, RespValue};

/// Declared shape of a function's result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnType {
    /// Truthy/falsy scalar. Nil reads as false.
    Boolean,
    /// Integer scalar
    Long,
    /// Array of values decoded with the value codec
    List,
    /// Plain text
    String,
    /// Single value decoded with the value codec
    Value,
    /// Single value decoded with the map-value codec
    MapValue,
    /// Array of values decoded with the map-value codec
    MapValueList,
}

impl ReturnType {
    /// Every variant, in declaration order
    pub const ALL: [ReturnType; 7] = [
        ReturnType::Boolean,
        ReturnType::Long,
        ReturnType::List,
        ReturnType::String,
        ReturnType::Value,
        ReturnType::MapValue,
        ReturnType::MapValueList,
    ];

    /// Read-only command bound to this type
    pub fn command(self) -> &'static CommandDescriptor {
        match self {
            ReturnType::Boolean => &FCALL_BOOLEAN_SAFE,
            ReturnType::Long => &FCALL_LONG,
            ReturnType::List => &FCALL_LIST,
            ReturnType::String => &FCALL_STRING,
            ReturnType::Value => &FCALL_OBJECT,
            ReturnType::MapValue => &FCALL_MAP_VALUE,
            ReturnType::MapValueList => &FCALL_MAP_VALUE_LIST,
        }
    }

    /// True for the types whose payloads come from map-typed storage
    pub fn uses_map_value_codec(self) -> bool {
        matches!(self, ReturnType::MapValue | ReturnType::MapValueList)
    }

    /// Pick the codec slot for this type
    pub fn codec<'a>(self, value: &'a dyn Codec, map_value: &'a dyn Codec) -> &'a dyn Codec {
        if self.uses_map_value_codec() {
            map_value
        } else {
            value
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ReturnType::Boolean => "BOOLEAN",
            ReturnType::Long => "LONG",
            ReturnType::List => "LIST",
            ReturnType::String => "STRING",
            ReturnType::Value => "VALUE",
            ReturnType::MapValue => "MAPVALUE",
            ReturnType::MapValueList => "MAPVALUELIST",
        }
    }

    /// Decode a raw reply into this type's result
    ///
    /// `codec` must be the slot returned by [`ReturnType::codec`].
    pub fn decode(self, reply: RespValue, codec: &dyn Codec) -> Result<FunctionResult> {
        if let RespValue::Error(message) = reply {
            return Err(FunctionError::from_call(message));
        }

        match self {
            ReturnType::Boolean => decode_boolean(reply).map(FunctionResult::Boolean),
            ReturnType::Long => decode_long(reply).map(FunctionResult::Long),
            ReturnType::String => decode_string(reply).map(FunctionResult::String),
            ReturnType::List => decode_list(reply, codec).map(FunctionResult::List),
            ReturnType::Value => decode_single(reply, codec).map(FunctionResult::Value),
            ReturnType::MapValue => decode_single(reply, codec).map(FunctionResult::MapValue),
            ReturnType::MapValueList => {
                decode_list(reply, codec).map(FunctionResult::MapValueList)
            }
        }
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReturnType {
    type Err = FunctionError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.replace(['_', '-'], "").to_ascii_uppercase();
        ReturnType::ALL
            .into_iter()
            .find(|rt| rt.name() == wanted)
            .ok_or_else(|| FunctionError::Validation(format!("Unknown return type: {}", s)))
    }
}

// =============================================================================
// Decoders
// =============================================================================

fn decode_boolean(reply: RespValue) -> Result<bool> {
    match reply {
        RespValue::Nil => Ok(false),
        RespValue::Integer(n) => Ok(n == 1),
        RespValue::Simple(_) | RespValue::Bulk(_) => Ok(reply.as_text() == Some("OK")),
        other => Err(unexpected(ReturnType::Boolean, &other)),
    }
}

fn decode_long(reply: RespValue) -> Result<Option<i64>> {
    match reply {
        RespValue::Nil => Ok(None),
        RespValue::Integer(n) => Ok(Some(n)),
        RespValue::Simple(_) | RespValue::Bulk(_) => reply
            .as_text()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map(Some)
            .ok_or_else(|| FunctionError::Decoding(format!("Not an integer: {:?}", reply))),
        other => Err(unexpected(ReturnType::Long, &other)),
    }
}

fn decode_string(reply: RespValue) -> Result<Option<String>> {
    match reply {
        RespValue::Nil => Ok(None),
        RespValue::Simple(s) => Ok(Some(s)),
        RespValue::Integer(n) => Ok(Some(n.to_string())),
        RespValue::Bulk(data) => String::from_utf8(data.to_vec())
            .map(Some)
            .map_err(|e| FunctionError::Decoding(format!("String result is not UTF-8: {}", e))),
        other => Err(unexpected(ReturnType::String, &other)),
    }
}

fn decode_single(reply: RespValue, codec: &dyn Codec) -> Result<Option<Value>> {
    match reply {
        RespValue::Nil => Ok(None),
        other => decode_element(other, codec).map(Some),
    }
}

fn decode_list(reply: RespValue, codec: &dyn Codec) -> Result<Vec<Value>> {
    match reply {
        RespValue::Nil => Ok(Vec::new()),
        RespValue::Array(items) => items
            .into_iter()
            .map(|item| decode_element(item, codec))
            .collect(),
        other => Err(FunctionError::UnexpectedResponse(format!(
            "expected an array for a list result, got {}",
            other.kind()
        ))),
    }
}

/// Decode one reply element into a value
fn decode_element(reply: RespValue, codec: &dyn Codec) -> Result<Value> {
    match reply {
        RespValue::Nil => Ok(Value::Nil),
        RespValue::Integer(n) => Ok(Value::Int(n)),
        RespValue::Simple(s) => Ok(Value::Str(s)),
        RespValue::Bulk(data) => codec.decode(&data),
        RespValue::Array(items) => items
            .into_iter()
            .map(|item| decode_element(item, codec))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        // An error nested in a result was produced by the script itself
        RespValue::Error(message) => Err(FunctionError::Remote(message)),
    }
}

fn unexpected(return_type: ReturnType, reply: &RespValue) -> FunctionError {
    FunctionError::UnexpectedResponse(format!(
        "{} result cannot be read from {}",
        return_type,
        reply.kind()
    ))
}

// =============================================================================
// Typed Result
// =============================================================================

/// Decoded result of a function call, one variant per [`ReturnType`]
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionResult {
    Boolean(bool),
    Long(Option<i64>),
    List(Vec<Value>),
    String(Option<String>),
    Value(Option<Value>),
    MapValue(Option<Value>),
    MapValueList(Vec<Value>),
}

impl FunctionResult {
    /// The return type that produced this result
    pub fn return_type(&self) -> ReturnType {
        match self {
            FunctionResult::Boolean(_) => ReturnType::Boolean,
            FunctionResult::Long(_) => ReturnType::Long,
            FunctionResult::List(_) => ReturnType::List,
            FunctionResult::String(_) => ReturnType::String,
            FunctionResult::Value(_) => ReturnType::Value,
            FunctionResult::MapValue(_) => ReturnType::MapValue,
            FunctionResult::MapValueList(_) => ReturnType::MapValueList,
        }
    }

    pub fn into_bool(self) -> Result<bool> {
        match self {
            FunctionResult::Boolean(b) => Ok(b),
            other => Err(other.mismatch(ReturnType::Boolean)),
        }
    }

    pub fn into_long(self) -> Result<Option<i64>> {
        match self {
            FunctionResult::Long(n) => Ok(n),
            other => Err(other.mismatch(ReturnType::Long)),
        }
    }

    pub fn into_string(self) -> Result<Option<String>> {
        match self {
            FunctionResult::String(s) => Ok(s),
            other => Err(other.mismatch(ReturnType::String)),
        }
    }

    /// Single value from a VALUE or MAPVALUE call
    pub fn into_value(self) -> Result<Option<Value>> {
        match self {
            FunctionResult::Value(v) | FunctionResult::MapValue(v) => Ok(v),
            other => Err(other.mismatch(ReturnType::Value)),
        }
    }

    /// Values from a LIST or MAPVALUELIST call
    pub fn into_list(self) -> Result<Vec<Value>> {
        match self {
            FunctionResult::List(items) | FunctionResult::MapValueList(items) => Ok(items),
            other => Err(other.mismatch(ReturnType::List)),
        }
    }

    fn mismatch(&self, wanted: ReturnType) -> FunctionError {
        FunctionError::UnexpectedResponse(format!(
            "expected a {} result, got {}",
            wanted,
            self.return_type()
        ))
    }
}
