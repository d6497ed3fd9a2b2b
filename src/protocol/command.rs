//! Command descriptors
//!
//! Static descriptions of every wire command this crate sends. A descriptor
//! says what goes on the wire and whether the command may be served by a
//! read replica; it does not carry arguments.

use std::fmt;

/// A wire command the store understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandDescriptor {
    /// Unique identifier, also used in logs
    pub label: &'static str,

    /// Command name sent first on the wire
    pub name: &'static str,

    /// Subcommand sent right after the name (e.g. LOAD for FUNCTION LOAD)
    pub subcommand: Option<&'static str>,

    /// True if the command never mutates data and may be routed to a replica
    pub read_only: bool,
}

impl CommandDescriptor {
    const fn new(
        label: &'static str,
        name: &'static str,
        subcommand: Option<&'static str>,
        read_only: bool,
    ) -> Self {
        Self {
            label,
            name,
            subcommand,
            read_only,
        }
    }

    /// True for `FCALL` and `FCALL_RO`
    pub fn is_call(&self) -> bool {
        self.name == "FCALL" || self.name == "FCALL_RO"
    }

    /// Leading words of the command line
    pub fn prefix(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.name).chain(self.subcommand)
    }
}

impl fmt::Display for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subcommand {
            Some(sub) => write!(f, "{} {}", self.name, sub),
            None => f.write_str(self.name),
        }
    }
}

// =============================================================================
// Library Management
// =============================================================================

pub static FUNCTION_LOAD: CommandDescriptor =
    CommandDescriptor::new("FUNCTION_LOAD", "FUNCTION", Some("LOAD"), false);

pub static FUNCTION_DELETE: CommandDescriptor =
    CommandDescriptor::new("FUNCTION_DELETE", "FUNCTION", Some("DELETE"), false);

pub static FUNCTION_FLUSH: CommandDescriptor =
    CommandDescriptor::new("FUNCTION_FLUSH", "FUNCTION", Some("FLUSH"), false);

pub static FUNCTION_LIST: CommandDescriptor =
    CommandDescriptor::new("FUNCTION_LIST", "FUNCTION", Some("LIST"), true);

pub static FUNCTION_DUMP: CommandDescriptor =
    CommandDescriptor::new("FUNCTION_DUMP", "FUNCTION", Some("DUMP"), true);

pub static FUNCTION_RESTORE: CommandDescriptor =
    CommandDescriptor::new("FUNCTION_RESTORE", "FUNCTION", Some("RESTORE"), false);

// STATS and KILL act on one node's engine; the façade sends them to every node
pub static FUNCTION_STATS: CommandDescriptor =
    CommandDescriptor::new("FUNCTION_STATS", "FUNCTION", Some("STATS"), false);

pub static FUNCTION_KILL: CommandDescriptor =
    CommandDescriptor::new("FUNCTION_KILL", "FUNCTION", Some("KILL"), false);

// =============================================================================
// Function Calls
// =============================================================================

/// Mutating call, used for every WRITE invocation
pub static FCALL: CommandDescriptor = CommandDescriptor::new("FCALL", "FCALL", None, false);

pub static FCALL_BOOLEAN_SAFE: CommandDescriptor =
    CommandDescriptor::new("FCALL_BOOLEAN_SAFE", "FCALL_RO", None, true);

pub static FCALL_LONG: CommandDescriptor =
    CommandDescriptor::new("FCALL_LONG", "FCALL_RO", None, true);

pub static FCALL_LIST: CommandDescriptor =
    CommandDescriptor::new("FCALL_LIST", "FCALL_RO", None, true);

pub static FCALL_STRING: CommandDescriptor =
    CommandDescriptor::new("FCALL_STRING", "FCALL_RO", None, true);

pub static FCALL_OBJECT: CommandDescriptor =
    CommandDescriptor::new("FCALL_OBJECT", "FCALL_RO", None, true);

pub static FCALL_MAP_VALUE: CommandDescriptor =
    CommandDescriptor::new("FCALL_MAP_VALUE", "FCALL_RO", None, true);

pub static FCALL_MAP_VALUE_LIST: CommandDescriptor =
    CommandDescriptor::new("FCALL_MAP_VALUE_LIST", "FCALL_RO", None, true);
