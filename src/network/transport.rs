//! Transport
//!
//! The seam between the function façade and the network.
//!
//! The façade hands over a command descriptor, the already-encoded argument
//! list and an optional routing hint; the transport decides which node serves
//! the request, performs the exchange and returns the raw reply. Error replies
//! from the store come back as `Ok(RespValue::Error(_))`; `Err` is reserved
//! for failures to complete the exchange.

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;

use crate::config::Config;
use crate::error::{FunctionError, Result};
use crate::protocol::{CommandDescriptor, RespValue};

use super::ConnectionPool;

/// Sends commands to the store
pub trait Transport: Send + Sync {
    /// Execute one command and return its reply
    ///
    /// `routing` is only used to pick a node and is never transmitted.
    fn execute(
        &self,
        command: &CommandDescriptor,
        args: &[Bytes],
        routing: Option<&[u8]>,
    ) -> Result<RespValue>;

    /// Execute one command on every node, primary first
    ///
    /// Used for commands that act on a node's own function engine. Each
    /// node's outcome is reported separately, in node order. Single-node
    /// transports keep the default.
    fn execute_all(&self, command: &CommandDescriptor, args: &[Bytes]) -> Vec<Result<RespValue>> {
        vec![self.execute(command, args, None)]
    }
}

/// RESP2 over TCP with one primary and optional read replicas
///
/// - Mutating commands always go to the primary.
/// - `execute_all` reaches the primary and then every replica in order.
/// - Read-only commands go to a replica when any are configured: the one
///   selected by CRC32 of the routing key, or the next in round robin order
///   when there is no key.
/// - No retries; a failed exchange is reported as is.
pub struct TcpTransport {
    primary: ConnectionPool,
    replicas: Vec<ConnectionPool>,
    next_replica: AtomicUsize,
}

impl TcpTransport {
    /// Build a transport from config. Connections are opened lazily.
    pub fn new(config: Config) -> Result<Self> {
        if config.max_total == 0 {
            return Err(FunctionError::Config(
                "max_total must be at least 1".to_string(),
            ));
        }

        let primary = ConnectionPool::new(resolve(&config.addr)?, config.clone());

        let replicas = config
            .replica_addrs
            .iter()
            .map(|addr| Ok(ConnectionPool::new(resolve(addr)?, config.clone())))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            primary,
            replicas,
            next_replica: AtomicUsize::new(0),
        })
    }

    /// Address of the primary node
    pub fn primary_addr(&self) -> SocketAddr {
        self.primary.addr()
    }

    fn select_pool(&self, command: &CommandDescriptor, routing: Option<&[u8]>) -> &ConnectionPool {
        if !command.read_only || self.replicas.is_empty() {
            return &self.primary;
        }

        let index = match routing {
            Some(key) => crc32fast::hash(key) as usize % self.replicas.len(),
            None => self.next_replica.fetch_add(1, Ordering::Relaxed) % self.replicas.len(),
        };
        &self.replicas[index]
    }
}

impl Transport for TcpTransport {
    fn execute(
        &self,
        command: &CommandDescriptor,
        args: &[Bytes],
        routing: Option<&[u8]>,
    ) -> Result<RespValue> {
        let pool = self.select_pool(command, routing);
        tracing::trace!(
            "Routing {} to {} (read_only={})",
            command.label,
            pool.addr(),
            command.read_only
        );
        send(pool, command, args)
    }

    fn execute_all(&self, command: &CommandDescriptor, args: &[Bytes]) -> Vec<Result<RespValue>> {
        std::iter::once(&self.primary)
            .chain(&self.replicas)
            .map(|pool| {
                tracing::trace!("Sending {} to {}", command.label, pool.addr());
                send(pool, command, args)
            })
            .collect()
    }
}

fn send(pool: &ConnectionPool, command: &CommandDescriptor, args: &[Bytes]) -> Result<RespValue> {
    let mut line: Vec<&[u8]> = Vec::with_capacity(2 + args.len());
    for word in command.prefix() {
        line.push(word.as_bytes());
    }
    line.extend(args.iter().map(|arg| &arg[..]));

    let mut conn = pool.acquire()?;
    conn.exec(line.as_slice())
}

fn resolve(addr: &str) -> Result<SocketAddr> {
    addr.to_socket_addrs()
        .map_err(|e| FunctionError::Config(format!("Invalid address {}: {}", addr, e)))?
        .next()
        .ok_or_else(|| FunctionError::Config(format!("Address {} did not resolve", addr)))
}
