//! Connection Pool
//!
//! Bounded pool of reusable connections to one node.
//!
//! ## Concurrency:
//! - `state`: parking_lot Mutex, held only while moving idle connections
//! - Exceeding `max_total` fails immediately instead of queueing

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{FunctionError, Result};
use crate::protocol::RespValue;

use super::Connection;

struct PoolState {
    idle: VecDeque<Connection>,
    total: usize,
}

struct PoolInner {
    addr: SocketAddr,
    config: Config,
    state: Mutex<PoolState>,
}

/// Connection pool for a single node
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Create an empty pool; connections are opened on demand
    pub fn new(addr: SocketAddr, config: Config) -> Self {
        let state = PoolState {
            idle: VecDeque::with_capacity(config.max_idle),
            total: 0,
        };
        Self {
            inner: Arc::new(PoolInner {
                addr,
                config,
                state: Mutex::new(state),
            }),
        }
    }

    /// Node address served by this pool
    pub fn addr(&self) -> SocketAddr {
        self.inner.addr
    }

    /// Number of idle connections currently held
    pub fn idle_count(&self) -> usize {
        self.inner.state.lock().idle.len()
    }

    /// Acquire a connection, opening a new one if none is idle
    pub fn acquire(&self) -> Result<PooledConnection> {
        let idle = self.inner.state.lock().idle.pop_front();
        if let Some(conn) = idle {
            return Ok(PooledConnection::new(self.clone(), conn));
        }

        if !self.try_reserve() {
            return Err(FunctionError::Network(format!(
                "Connection pool for {} exhausted ({} connections)",
                self.inner.addr, self.inner.config.max_total
            )));
        }

        match Connection::open(self.inner.addr, &self.inner.config) {
            Ok(conn) => Ok(PooledConnection::new(self.clone(), conn)),
            Err(e) => {
                self.release_slot();
                Err(e)
            }
        }
    }

    fn try_reserve(&self) -> bool {
        let mut state = self.inner.state.lock();
        if state.total >= self.inner.config.max_total {
            return false;
        }
        state.total += 1;
        true
    }

    fn release_slot(&self) {
        let mut state = self.inner.state.lock();
        state.total = state.total.saturating_sub(1);
    }

    fn give_back(&self, conn: Connection) {
        let mut state = self.inner.state.lock();
        if state.idle.len() < self.inner.config.max_idle {
            state.idle.push_back(conn);
        } else {
            state.total = state.total.saturating_sub(1);
        }
    }
}

/// Connection borrowed from the pool, returned on drop
pub struct PooledConnection {
    pool: ConnectionPool,
    conn: Option<Connection>,
    healthy: bool,
}

impl PooledConnection {
    fn new(pool: ConnectionPool, conn: Connection) -> Self {
        Self {
            pool,
            conn: Some(conn),
            healthy: true,
        }
    }

    /// Execute one command on the borrowed connection
    pub fn exec<A: AsRef<[u8]>>(&mut self, args: &[A]) -> Result<RespValue> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| FunctionError::Network("Connection already released".to_string()))?;

        let reply = conn.exec(args);
        if let Err(ref e) = reply {
            // The stream state is unknown after a failed exchange
            tracing::warn!("Discarding connection to {}: {}", conn.peer_addr(), e);
            self.healthy = false;
        }
        reply
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };

        if self.healthy {
            self.pool.give_back(conn);
        } else {
            self.pool.release_slot();
        }
    }
}
