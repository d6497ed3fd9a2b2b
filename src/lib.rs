//! # atlasfn
//!
//! A typed client for server-side functions on a Redis-compatible store:
//! - Library lifecycle: load, replace, delete, flush, list, dump, restore
//! - Control: engine stats, killing a running read-only function
//! - Typed calls: READ/WRITE mode plus a declared return type
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Functions / AsyncFunctions                      │
//! │        (management + call, blocking or future)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Selector   │          │  Arg Encoder│──── Codec (value / map value)
//!   │ FCALL / _RO │          │             │
//!   └──────┬──────┘          └──────┬──────┘
//!          └────────────┬───────────┘
//!                       ▼
//!               ┌───────────────┐
//!               │   Transport   │  (TcpTransport: RESP2, pool, replicas)
//!               └───────┬───────┘
//!                       ▼
//!               ┌───────────────┐
//!               │  ReturnType   │  decoder → FunctionResult
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod protocol;
pub mod network;
pub mod function;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FunctionError, Result};
pub use config::{Config, FunctionsConfig};
pub use codec::{BincodeCodec, Codec, StringCodec, Value};
pub use network::{TcpTransport, Transport};
pub use function::{
    AsyncFunctions, ExecutionMode, FunctionFuture, FunctionLibrary, FunctionResult,
    FunctionStats, Functions, InvocationRequest, KillOutcome, RestorePolicy, ReturnType,
};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of atlasfn
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
