//! Function Module
//!
//! Typed client for server-side function libraries.
//!
//! ## Components
//! - [`ReturnType`]: declared result shape, bound to a read-only command and a decoder
//! - [`selector`]: picks `FCALL` / per-type `FCALL_RO` / `FUNCTION *` descriptors
//! - [`args`]: flattens keys and values into the call's argument list
//! - [`Functions`]: blocking façade for management and calls
//! - [`AsyncFunctions`]: the same operations as futures

pub mod args;
pub mod selector;
mod mode;
mod return_type;
mod library;
mod facade;
mod async_api;

pub use mode::ExecutionMode;
pub use return_type::{FunctionResult, ReturnType};
pub use library::{
    parse_libraries, parse_stats, EngineStats, FunctionInfo, FunctionLibrary, FunctionStats,
    KillOutcome, RestorePolicy, RunningFunction,
};
pub use facade::{Functions, InvocationRequest};
pub use async_api::{AsyncFunctions, FunctionFuture};
