//! Inbound position socket.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Duration;

use super::TransportStats;
use crate::error::{NetError, NetResult};
use crate::peers::{PeerIdentity, SharedPositionStore};
use crate::protocol::{PositionCodec, PositionSample};
use crate::MAX_DATAGRAM_SIZE;

/// Outcome of one receive call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Reception {
    /// A well-formed position from a peer.
    Sample {
        /// Source endpoint.
        from: PeerIdentity,
        /// Decoded position.
        sample: PositionSample,
    },
    /// A datagram of the wrong size. Dropped.
    Malformed {
        /// Source endpoint.
        from: PeerIdentity,
        /// Size of the datagram (capped at the buffer size).
        len: usize,
    },
    /// Nothing arrived: timeout, would-block, or a transient OS error.
    Idle,
}

impl Reception {
    /// True for [`Reception::Sample`].
    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Sample { .. })
    }
}

/// The single listening socket of a peer.
///
/// Blocking by default. Use [`set_read_timeout`](Self::set_read_timeout) to
/// bound each `receive`, or [`set_nonblocking`](Self::set_nonblocking) to
/// poll.
pub struct PositionReceiver {
    socket: UdpSocket,
    local_addr: SocketAddr,
    recv_buffer: [u8; MAX_DATAGRAM_SIZE],
    stats: TransportStats,
}

impl PositionReceiver {
    /// Binds `0.0.0.0:port`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Bind`] if the port is taken or not permitted.
    pub fn bind(port: u16) -> NetResult<Self> {
        Self::bind_addr(SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port)))
    }

    /// Binds a specific local address.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Bind`] if the address cannot be bound.
    pub fn bind_addr(addr: SocketAddr) -> NetResult<Self> {
        let bind_error = |source| NetError::Bind {
            port: addr.port(),
            source,
        };
        let socket = UdpSocket::bind(addr).map_err(bind_error)?;
        let local_addr = socket.local_addr().map_err(bind_error)?;

        tracing::info!(%local_addr, "position receiver bound");

        Ok(Self {
            socket,
            local_addr,
            recv_buffer: [0u8; MAX_DATAGRAM_SIZE],
            stats: TransportStats::default(),
        })
    }

    /// Returns the bound address.
    #[inline]
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Bounds how long `receive` may block. `None` blocks indefinitely.
    ///
    /// # Errors
    ///
    /// Returns the OS error, for instance for a zero duration.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.socket.set_read_timeout(timeout)
    }

    /// Switches between blocking and polling receives.
    ///
    /// # Errors
    ///
    /// Returns the OS error.
    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        self.socket.set_nonblocking(nonblocking)
    }

    /// Receives one datagram.
    ///
    /// Never fails: problems come back as [`Reception::Malformed`] or
    /// [`Reception::Idle`].
    pub fn receive(&mut self) -> Reception {
        match self.socket.recv_from(&mut self.recv_buffer) {
            Ok((len, addr)) => {
                self.stats.packets_received += 1;
                self.stats.bytes_received += len as u64;

                let from = PeerIdentity(addr);
                match PositionCodec::decode(&self.recv_buffer[..len]) {
                    Some(sample) => Reception::Sample { from, sample },
                    None => {
                        self.stats.malformed += 1;
                        tracing::debug!(peer = %from, len, "dropping malformed position datagram");
                        Reception::Malformed { from, len }
                    }
                }
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Reception::Idle
            }
            Err(e) => {
                // ICMP port-unreachable for an earlier send shows up here on some platforms.
                self.stats.recv_errors += 1;
                tracing::debug!(error = %e, "position receive failed");
                Reception::Idle
            }
        }
    }

    /// Applies up to `max` pending datagrams to `store` without waiting.
    ///
    /// Meant for a non-blocking socket polled from the frame loop. Stops at
    /// the first idle receive. Returns the number of samples applied.
    pub fn drain_into(&mut self, store: &SharedPositionStore, max: usize) -> usize {
        let mut applied = 0;
        for _ in 0..max {
            match self.receive() {
                Reception::Sample { from, sample } => {
                    store.apply_from(from, sample);
                    applied += 1;
                }
                Reception::Malformed { .. } => {}
                Reception::Idle => break,
            }
        }
        applied
    }

    /// Returns statistics.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> &TransportStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback_receiver() -> PositionReceiver {
        PositionReceiver::bind_addr("127.0.0.1:0".parse().unwrap()).unwrap()
    }

    #[test]
    fn test_bind_conflict() {
        let first = loopback_receiver();
        let err = PositionReceiver::bind_addr(first.local_addr()).err().unwrap();
        match err {
            NetError::Bind { port, .. } => assert_eq!(port, first.local_addr().port()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_receive_valid_and_malformed() {
        let mut receiver = loopback_receiver();
        receiver.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        let target = receiver.local_addr();

        sender.send_to(&[1, 2, 3], target).unwrap();
        sender
            .send_to(&PositionCodec::encode(&PositionSample::new(1.0, 2.0)), target)
            .unwrap();

        let from = PeerIdentity(sender.local_addr().unwrap());
        assert_eq!(receiver.receive(), Reception::Malformed { from, len: 3 });
        let good = receiver.receive();
        assert!(good.is_valid());
        assert_eq!(good, Reception::Sample { from, sample: PositionSample::new(1.0, 2.0) });

        let stats = receiver.stats();
        assert_eq!(stats.packets_received, 2);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.bytes_received, 19);
    }

    #[test]
    fn test_timeout_is_idle() {
        let mut receiver = loopback_receiver();
        receiver.set_read_timeout(Some(Duration::from_millis(20))).unwrap();
        assert_eq!(receiver.receive(), Reception::Idle);
        assert!(!receiver.receive().is_valid());
    }

    #[test]
    fn test_nonblocking_drain_on_empty_socket() {
        let mut receiver = loopback_receiver();
        receiver.set_nonblocking(true).unwrap();
        let store = SharedPositionStore::new(2);
        assert_eq!(receiver.drain_into(&store, 2), 0);
        assert_eq!(store.update_count(), 0);
    }
}
