//! Network Module
//!
//! Transport to the store.
//!
//! ## Architecture
//! - [`Transport`] trait: the only thing the function façade depends on
//! - [`TcpTransport`]: RESP2 over TCP, primary plus optional replicas
//! - One [`ConnectionPool`] per node, lazily filled

mod connection;
mod pool;
mod transport;

pub use connection::Connection;
pub use pool::{ConnectionPool, PooledConnection};
pub use transport::{TcpTransport, Transport};
