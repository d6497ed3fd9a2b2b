//! Protocol Module
//!
//! Defines the wire protocol spoken with the store.
//!
//! ## Layers
//! - [`command`]: static descriptors naming each command and its routing class
//! - `resp`: RESP2 framing of requests and replies
//!
//! ### Function Commands
//! - `FUNCTION LOAD | DELETE | FLUSH | LIST | DUMP | RESTORE | STATS | KILL`
//! - `FCALL name numkeys key... arg...`      (may write, primary only)
//! - `FCALL_RO name numkeys key... arg...`   (read-only, replica eligible)

pub mod command;
mod resp;

pub use command::CommandDescriptor;
pub use resp::{
    encode_command, encode_reply, read_reply, write_command, RespValue, MAX_BULK_SIZE,
    MAX_LINE_SIZE,
};
