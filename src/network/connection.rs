//! Connection
//!
//! One TCP connection to a store node.

use std::io::{BufReader, Write};
use std::net::{SocketAddr, TcpStream};

use crate::config::Config;
use crate::error::Result;
use crate::protocol::{encode_command, read_reply, RespValue};

/// A single TCP connection with reusable buffers
pub struct Connection {
    /// TCP stream reader (buffered for efficiency); writes go to the inner stream
    reader: BufReader<TcpStream>,

    /// Reply line scratch buffer
    line_buf: Vec<u8>,

    /// Request encoding buffer
    write_buf: Vec<u8>,

    /// Peer address for logging
    peer_addr: SocketAddr,
}

impl Connection {
    /// Connect to `addr` and apply the configured timeouts
    pub fn open(addr: SocketAddr, config: &Config) -> Result<Self> {
        let stream = match config.connect_timeout() {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout)?,
            None => TcpStream::connect(addr)?,
        };

        stream.set_read_timeout(config.read_timeout())?;
        stream.set_write_timeout(config.write_timeout())?;

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        tracing::debug!("Connected to {}", addr);

        Ok(Self {
            reader: BufReader::new(stream),
            line_buf: Vec::with_capacity(128),
            write_buf: Vec::with_capacity(256),
            peer_addr: addr,
        })
    }

    /// Send one command and wait for its reply
    pub fn exec<A: AsRef<[u8]>>(&mut self, args: &[A]) -> Result<RespValue> {
        self.write_buf.clear();
        encode_command(args, &mut self.write_buf);

        let stream = self.reader.get_mut();
        stream.write_all(&self.write_buf)?;
        stream.flush()?;

        read_reply(&mut self.reader, &mut self.line_buf)
    }

    /// Get the peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }
}
