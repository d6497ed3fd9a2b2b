//! Function façade
//!
//! Public entry point for library management and typed function calls.
//!
//! ## Call Path
//! ```text
//! call(routing_key, mode, name, return_type, keys, values)
//!   │
//!   ├─ select_call(mode, return_type)        → FCALL or FCALL_RO variant
//!   ├─ encode_call_args(name, keys, values)  → [name, N, keys.., values..]
//!   ├─ routing = routing_key | keys[0] | none
//!   ├─ Transport::execute                    → raw reply
//!   └─ return_type.decode(reply)             → FunctionResult
//! ```
//!
//! ## Concurrency
//! `Functions` holds only `Arc`s to immutable collaborators. Clone it freely
//! and call it from any number of threads; each call is an independent
//! exchange and nothing is retried here.

use std::sync::Arc;

use bytes::Bytes;

use crate::codec::{Codec, Value};
use crate::config::FunctionsConfig;
use crate::error::{FunctionError, Result};
use crate::network::Transport;
use crate::protocol::{CommandDescriptor, RespValue};

use super::args::{encode_call_args, validate_name};
use super::library::{parse_libraries, parse_stats};
use super::selector::{management_command, select_call, ManagementOp};
use super::{
    ExecutionMode, FunctionLibrary, FunctionResult, FunctionStats, KillOutcome, RestorePolicy,
    ReturnType,
};

/// Engine named in the shebang line of loaded libraries
const LIBRARY_ENGINE: &str = "lua";

/// One function invocation, owned
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    /// Used only to pick a node; never sent as an argument
    pub routing_key: Option<Bytes>,
    pub mode: ExecutionMode,
    pub function: String,
    pub return_type: ReturnType,
    /// Keys available to the function through KEYS
    pub keys: Vec<Bytes>,
    /// Values available to the function through ARGV
    pub values: Vec<Value>,
}

impl InvocationRequest {
    /// Request with no keys and no values
    pub fn new(mode: ExecutionMode, function: impl Into<String>, return_type: ReturnType) -> Self {
        Self {
            routing_key: None,
            mode,
            function: function.into(),
            return_type,
            keys: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn routing_key(mut self, key: impl Into<Bytes>) -> Self {
        self.routing_key = Some(key.into());
        self
    }

    pub fn key(mut self, key: impl Into<Bytes>) -> Self {
        self.keys.push(key.into());
        self
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }
}

/// Client for the store's function namespace
#[derive(Clone)]
pub struct Functions {
    transport: Arc<dyn Transport>,
    codec: Arc<dyn Codec>,
    map_value_codec: Arc<dyn Codec>,
}

impl Functions {
    pub fn new(config: FunctionsConfig) -> Self {
        tracing::debug!(
            "Functions client ready (codec={}, map_value_codec={})",
            config.codec.name(),
            config.map_value_codec.name()
        );
        Self {
            transport: config.transport,
            codec: config.codec,
            map_value_codec: config.map_value_codec,
        }
    }

    // =========================================================================
    // Library Management
    // =========================================================================

    /// Load a library. Fails with `LibraryExists` if the name is taken.
    pub fn load(&self, library: &str, code: &str) -> Result<()> {
        self.load_library(library, code, false)
    }

    /// Load a library, replacing any library with the same name
    pub fn load_and_replace(&self, library: &str, code: &str) -> Result<()> {
        self.load_library(library, code, true)
    }

    fn load_library(&self, library: &str, code: &str, replace: bool) -> Result<()> {
        validate_name("Library", library)?;

        let source = format!("#!{} name={}\n{}", LIBRARY_ENGINE, library, code);
        let mut args = Vec::with_capacity(2);
        if replace {
            args.push(Bytes::from_static(b"REPLACE"));
        }
        args.push(Bytes::from(source));

        let reply = self.management(ManagementOp::Load, &args)?;
        expect_accepted(reply)?;
        tracing::info!("Loaded function library {} (replace={})", library, replace);
        Ok(())
    }

    /// Delete a library. Fails with `LibraryNotFound` if it does not exist.
    pub fn delete(&self, library: &str) -> Result<()> {
        validate_name("Library", library)?;
        let reply = self.management(
            ManagementOp::Delete,
            &[Bytes::copy_from_slice(library.as_bytes())],
        )?;
        expect_accepted(reply)
    }

    /// Delete every library
    pub fn flush(&self) -> Result<()> {
        let reply = self.management(ManagementOp::Flush, &[])?;
        expect_accepted(reply)
    }

    /// All loaded libraries
    pub fn list(&self) -> Result<Vec<FunctionLibrary>> {
        let reply = self.management(ManagementOp::List, &[])?;
        parse_libraries(reply)
    }

    /// Libraries whose name matches a glob pattern (`?`, `*`, `[...]`)
    pub fn list_matching(&self, pattern: &str) -> Result<Vec<FunctionLibrary>> {
        let args = [
            Bytes::from_static(b"LIBRARYNAME"),
            Bytes::copy_from_slice(pattern.as_bytes()),
        ];
        let reply = self.management(ManagementOp::List, &args)?;
        parse_libraries(reply)
    }

    /// Serialized state of every library
    pub fn dump(&self) -> Result<Bytes> {
        match self.management(ManagementOp::Dump, &[])? {
            RespValue::Bulk(payload) => Ok(payload),
            other => Err(FunctionError::UnexpectedResponse(format!(
                "FUNCTION DUMP returned {}",
                other.kind()
            ))),
        }
    }

    /// Restore a [`dump`](Self::dump), failing on name collisions
    pub fn restore(&self, payload: &[u8]) -> Result<()> {
        self.restore_with(payload, RestorePolicy::Append)
    }

    /// Restore a dump, overwriting colliding libraries
    pub fn restore_and_replace(&self, payload: &[u8]) -> Result<()> {
        self.restore_with(payload, RestorePolicy::Replace)
    }

    /// Delete every library, then restore a dump
    pub fn restore_after_flush(&self, payload: &[u8]) -> Result<()> {
        self.restore_with(payload, RestorePolicy::Flush)
    }

    pub fn restore_with(&self, payload: &[u8], policy: RestorePolicy) -> Result<()> {
        if payload.is_empty() {
            return Err(FunctionError::Validation(
                "Restore payload is empty".to_string(),
            ));
        }

        let args = [
            Bytes::copy_from_slice(payload),
            Bytes::from_static(policy.as_arg().as_bytes()),
        ];
        let reply = self.management(ManagementOp::Restore, &args)?;
        expect_accepted(reply)?;
        tracing::info!("Restored function libraries ({:?})", policy);
        Ok(())
    }

    /// Engine state snapshot
    ///
    /// Asked of every node: the engine counters come from the primary, the
    /// running function from whichever node is executing one. A replica
    /// that cannot answer is skipped; the primary's failure is returned.
    pub fn stats(&self) -> Result<FunctionStats> {
        let mut replies = self.broadcast(ManagementOp::Stats).into_iter();
        let mut stats = match replies.next() {
            Some(reply) => parse_stats(reply?)?,
            None => FunctionStats::default(),
        };

        for reply in replies {
            match reply.and_then(parse_stats) {
                Ok(node) => {
                    if stats.running.is_none() {
                        stats.running = node.running;
                    }
                }
                Err(e) => tracing::warn!("Skipping node in FUNCTION STATS: {}", e),
            }
        }
        Ok(stats)
    }

    /// Stop the read-only function currently executing on any node
    ///
    /// `Killed` if some node stopped a function, `NothingToKill` if every
    /// node answered that it was idle. Otherwise the first failure is
    /// returned, e.g. `Unkillable` for a function that already wrote.
    pub fn kill(&self) -> Result<KillOutcome> {
        let mut killed = false;
        let mut failure = None;

        for reply in self.broadcast(ManagementOp::Kill) {
            match reply.and_then(expect_accepted) {
                Ok(()) => killed = true,
                Err(FunctionError::NotBusy(message)) => {
                    tracing::debug!("Nothing to kill: {}", message);
                }
                Err(e) => {
                    tracing::debug!("FUNCTION KILL failed on a node: {}", e);
                    failure.get_or_insert(e);
                }
            }
        }

        match failure {
            _ if killed => Ok(KillOutcome::Killed),
            Some(e) => Err(e),
            None => Ok(KillOutcome::NothingToKill),
        }
    }

    fn management(&self, op: ManagementOp, args: &[Bytes]) -> Result<RespValue> {
        self.dispatch(management_command(op), args, None)
    }

    /// Send an argument-less management command to every node
    fn broadcast(&self, op: ManagementOp) -> Vec<Result<RespValue>> {
        let command = management_command(op);
        self.transport
            .execute_all(command, &[])
            .into_iter()
            .map(|reply| match reply? {
                RespValue::Error(message) => Err(FunctionError::from_server(command, message)),
                reply => Ok(reply),
            })
            .collect()
    }

    // =========================================================================
    // Function Calls
    // =========================================================================

    /// Call a function
    ///
    /// `routing_key` only selects the node; when absent the first of `keys`
    /// is used instead. `keys` reach the function as KEYS, `values` as ARGV.
    pub fn call<K: AsRef<[u8]>>(
        &self,
        routing_key: Option<&[u8]>,
        mode: ExecutionMode,
        function: &str,
        return_type: ReturnType,
        keys: &[K],
        values: &[Value],
    ) -> Result<FunctionResult> {
        let command = select_call(mode, return_type);
        let codec = return_type.codec(&*self.codec, &*self.map_value_codec);
        let args = encode_call_args(function, keys, values, codec)?;

        let routing = routing_key.or_else(|| keys.first().map(|key| key.as_ref()));

        tracing::debug!(
            "Calling {} ({}, {}) with {} keys and {} values",
            function,
            mode,
            return_type,
            args.key_count(),
            args.values().len()
        );

        let reply = self.dispatch(command, args.as_slice(), routing)?;
        return_type.decode(reply, codec)
    }

    /// Call a function that takes no keys and no values
    pub fn call_simple(
        &self,
        mode: ExecutionMode,
        function: &str,
        return_type: ReturnType,
    ) -> Result<FunctionResult> {
        self.call::<&[u8]>(None, mode, function, return_type, &[], &[])
    }

    /// Execute an owned request
    pub fn invoke(&self, request: &InvocationRequest) -> Result<FunctionResult> {
        self.call(
            request.routing_key.as_deref(),
            request.mode,
            &request.function,
            request.return_type,
            &request.keys,
            &request.values,
        )
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn dispatch(
        &self,
        command: &CommandDescriptor,
        args: &[Bytes],
        routing: Option<&[u8]>,
    ) -> Result<RespValue> {
        tracing::trace!("Dispatching {} with {} args", command.label, args.len());

        match self.transport.execute(command, args, routing)? {
            RespValue::Error(message) => {
                let err = FunctionError::from_server(command, message);
                tracing::debug!("{} rejected: {}", command, err);
                Err(err)
            }
            reply => Ok(reply),
        }
    }
}

/// Management replies are `+OK`, or the library name for `FUNCTION LOAD`
fn expect_accepted(reply: RespValue) -> Result<()> {
    match reply {
        RespValue::Simple(_) | RespValue::Bulk(_) => Ok(()),
        other => Err(FunctionError::UnexpectedResponse(format!(
            "expected an acknowledgement, got {}",
            other.kind()
        ))),
    }
}
