//! Library management models
//!
//! Client-side views of the store's function namespace, built from the
//! replies of `FUNCTION LIST` and `FUNCTION STATS`. Nothing here is cached.

use std::time::Duration;

use crate::error::{FunctionError, Result};
use crate::protocol::RespValue;

/// A loaded library and the functions it exports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionLibrary {
    /// Unique name in the store's function namespace
    pub name: String,

    /// Engine that runs the library (e.g. "LUA")
    pub engine: String,

    pub functions: Vec<FunctionInfo>,
}

impl FunctionLibrary {
    /// Names of the exported functions, in server order
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|f| f.name.as_str())
    }
}

/// One exported function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    pub name: String,
    pub description: Option<String>,
    /// Registration flags such as `no-writes`
    pub flags: Vec<String>,
}

impl FunctionInfo {
    /// True if the function was registered as read-only
    pub fn is_read_only(&self) -> bool {
        self.flags.iter().any(|f| f == "no-writes")
    }
}

/// Snapshot of the function engine state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionStats {
    /// Function executing right now, if any
    pub running: Option<RunningFunction>,
    pub engines: Vec<EngineStats>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningFunction {
    pub name: String,
    /// Full command line of the running call
    pub command: Vec<String>,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStats {
    pub engine: String,
    pub libraries_count: u64,
    pub functions_count: u64,
}

/// Result of `FUNCTION KILL`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    Killed,
    /// No function was executing
    NothingToKill,
}

/// How `FUNCTION RESTORE` treats libraries already present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestorePolicy {
    /// Append, fail on name collision
    #[default]
    Append,
    /// Append, overwrite on collision
    Replace,
    /// Delete everything first
    Flush,
}

impl RestorePolicy {
    pub fn as_arg(self) -> &'static str {
        match self {
            RestorePolicy::Append => "APPEND",
            RestorePolicy::Replace => "REPLACE",
            RestorePolicy::Flush => "FLUSH",
        }
    }
}

// =============================================================================
// Reply Parsing
// =============================================================================

/// Parse a `FUNCTION LIST` reply
pub fn parse_libraries(reply: RespValue) -> Result<Vec<FunctionLibrary>> {
    match reply {
        RespValue::Nil => Ok(Vec::new()),
        RespValue::Array(items) => items.into_iter().map(parse_library).collect(),
        other => Err(shape("FUNCTION LIST", "array", &other)),
    }
}

fn parse_library(reply: RespValue) -> Result<FunctionLibrary> {
    let mut name = None;
    let mut engine = None;
    let mut functions = Vec::new();

    for (field, value) in fields(reply, "library entry")? {
        match field.as_str() {
            "library_name" => name = Some(text(value, "library_name")?),
            "engine" => engine = Some(text(value, "engine")?),
            "functions" => {
                functions = array(value, "functions")?
                    .into_iter()
                    .map(parse_function)
                    .collect::<Result<_>>()?
            }
            // library_code and fields added by newer servers
            _ => {}
        }
    }

    Ok(FunctionLibrary {
        name: name.ok_or_else(|| missing("library_name"))?,
        engine: engine.unwrap_or_default(),
        functions,
    })
}

fn parse_function(reply: RespValue) -> Result<FunctionInfo> {
    let mut name = None;
    let mut description = None;
    let mut flags = Vec::new();

    for (field, value) in fields(reply, "function entry")? {
        match field.as_str() {
            "name" => name = Some(text(value, "name")?),
            "description" => {
                description = match value {
                    RespValue::Nil => None,
                    other => Some(text(other, "description")?),
                }
            }
            "flags" => {
                flags = array(value, "flags")?
                    .into_iter()
                    .map(|flag| text(flag, "flag"))
                    .collect::<Result<_>>()?
            }
            _ => {}
        }
    }

    Ok(FunctionInfo {
        name: name.ok_or_else(|| missing("name"))?,
        description,
        flags,
    })
}

/// Parse a `FUNCTION STATS` reply
pub fn parse_stats(reply: RespValue) -> Result<FunctionStats> {
    let mut stats = FunctionStats::default();

    for (field, value) in fields(reply, "FUNCTION STATS")? {
        match field.as_str() {
            "running_script" => {
                stats.running = match value {
                    RespValue::Nil => None,
                    other => Some(parse_running(other)?),
                }
            }
            "engines" => {
                for (engine, counters) in fields(value, "engines")? {
                    stats.engines.push(parse_engine(engine, counters)?);
                }
            }
            _ => {}
        }
    }

    Ok(stats)
}

fn parse_running(reply: RespValue) -> Result<RunningFunction> {
    let mut name = None;
    let mut command = Vec::new();
    let mut duration = Duration::ZERO;

    for (field, value) in fields(reply, "running_script")? {
        match field.as_str() {
            "name" => name = Some(text(value, "name")?),
            "command" => {
                command = array(value, "command")?
                    .into_iter()
                    .map(|arg| match arg {
                        RespValue::Bulk(data) => Ok(String::from_utf8_lossy(&data).into_owned()),
                        other => text(other, "command"),
                    })
                    .collect::<Result<_>>()?
            }
            "duration_ms" => duration = Duration::from_millis(integer(value, "duration_ms")?),
            _ => {}
        }
    }

    Ok(RunningFunction {
        name: name.ok_or_else(|| missing("name"))?,
        command,
        duration,
    })
}

fn parse_engine(engine: String, reply: RespValue) -> Result<EngineStats> {
    let mut stats = EngineStats {
        engine,
        libraries_count: 0,
        functions_count: 0,
    };

    for (field, value) in fields(reply, "engine counters")? {
        match field.as_str() {
            "libraries_count" => stats.libraries_count = integer(value, "libraries_count")?,
            "functions_count" => stats.functions_count = integer(value, "functions_count")?,
            _ => {}
        }
    }

    Ok(stats)
}

// =============================================================================
// Helpers
// =============================================================================

/// Split a flat `[field, value, field, value, ...]` array into pairs
fn fields(reply: RespValue, what: &str) -> Result<Vec<(String, RespValue)>> {
    let items = array(reply, what)?;
    if items.len() % 2 != 0 {
        return Err(FunctionError::UnexpectedResponse(format!(
            "{} has an odd number of elements",
            what
        )));
    }

    let mut pairs = Vec::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(field), Some(value)) = (iter.next(), iter.next()) {
        pairs.push((text(field, what)?, value));
    }
    Ok(pairs)
}

fn array(reply: RespValue, what: &str) -> Result<Vec<RespValue>> {
    match reply {
        RespValue::Array(items) => Ok(items),
        RespValue::Nil => Ok(Vec::new()),
        other => Err(shape(what, "array", &other)),
    }
}

fn text(reply: RespValue, what: &str) -> Result<String> {
    match reply {
        RespValue::Simple(s) => Ok(s),
        RespValue::Bulk(data) => String::from_utf8(data.to_vec())
            .map_err(|_| FunctionError::Decoding(format!("{} is not valid UTF-8", what))),
        other => Err(shape(what, "string", &other)),
    }
}

fn integer(reply: RespValue, what: &str) -> Result<u64> {
    match reply {
        RespValue::Integer(n) if n >= 0 => Ok(n as u64),
        other => Err(shape(what, "non-negative integer", &other)),
    }
}

fn shape(what: &str, expected: &str, got: &RespValue) -> FunctionError {
    FunctionError::UnexpectedResponse(format!(
        "{}: expected {}, got {}",
        what,
        expected,
        got.kind()
    ))
}

fn missing(field: &str) -> FunctionError {
    FunctionError::UnexpectedResponse(format!("missing field {}", field))
}
