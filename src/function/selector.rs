//! Command selector
//!
//! Maps (execution mode, operation) to the wire command to send.

use crate::protocol::command::{
    FCALL, FUNCTION_DELETE, FUNCTION_DUMP, FUNCTION_FLUSH, FUNCTION_KILL, FUNCTION_LIST,
    FUNCTION_LOAD, FUNCTION_RESTORE, FUNCTION_STATS,
};
use crate::protocol::CommandDescriptor;

use super::{ExecutionMode, ReturnType};

/// Fixed library management commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagementOp {
    Load,
    Delete,
    Flush,
    List,
    Dump,
    Restore,
    Stats,
    Kill,
}

/// What the caller wants to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Call(ReturnType),
    Management(ManagementOp),
}

/// Select the command descriptor for an operation
///
/// Management commands are fixed and ignore the mode.
pub fn select_command(mode: ExecutionMode, kind: OperationKind) -> &'static CommandDescriptor {
    match kind {
        OperationKind::Call(return_type) => select_call(mode, return_type),
        OperationKind::Management(op) => management_command(op),
    }
}

/// READ calls use the descriptor bound to the return type, WRITE calls all
/// share the generic mutating `FCALL`.
pub fn select_call(mode: ExecutionMode, return_type: ReturnType) -> &'static CommandDescriptor {
    match mode {
        ExecutionMode::Read => return_type.command(),
        ExecutionMode::Write => &FCALL,
    }
}

pub fn management_command(op: ManagementOp) -> &'static CommandDescriptor {
    match op {
        ManagementOp::Load => &FUNCTION_LOAD,
        ManagementOp::Delete => &FUNCTION_DELETE,
        ManagementOp::Flush => &FUNCTION_FLUSH,
        ManagementOp::List => &FUNCTION_LIST,
        ManagementOp::Dump => &FUNCTION_DUMP,
        ManagementOp::Restore => &FUNCTION_RESTORE,
        ManagementOp::Stats => &FUNCTION_STATS,
        ManagementOp::Kill => &FUNCTION_KILL,
    }
}
