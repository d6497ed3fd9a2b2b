//! Execution mode

use std::fmt;
use std::str::FromStr;

use crate::error::FunctionError;

/// Declares whether a call may modify data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// The function only reads. Sent as `FCALL_RO`, so it may be served by a
    /// replica and can be stopped with `FUNCTION KILL`.
    Read,

    /// The function may write. Sent as `FCALL` to the primary.
    Write,
}

impl ExecutionMode {
    pub fn is_read_only(self) -> bool {
        self == ExecutionMode::Read
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Read => f.write_str("read"),
            ExecutionMode::Write => f.write_str("write"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = FunctionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "read" => Ok(ExecutionMode::Read),
            "write" => Ok(ExecutionMode::Write),
            other => Err(FunctionError::Validation(format!(
                "Unknown execution mode: {}",
                other
            ))),
        }
    }
}
