//! Outbound position sockets, one per remote peer.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::error::{NetError, NetResult};
use crate::protocol::{PositionCodec, PositionSample};

/// Send-side statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SenderStats {
    /// Datagrams handed to the OS.
    pub packets_sent: u64,
    /// Sends the OS refused.
    pub send_errors: u64,
}

impl std::ops::AddAssign for SenderStats {
    fn add_assign(&mut self, rhs: Self) {
        self.packets_sent += rhs.packets_sent;
        self.send_errors += rhs.send_errors;
    }
}

/// A UDP socket connected to one remote peer.
///
/// `send` takes `&self`, so a sender can be shared between the frame loop and
/// a background send task without a lock.
#[derive(Debug)]
pub struct PositionSender {
    socket: UdpSocket,
    remote: SocketAddr,
    packets_sent: AtomicU64,
    send_errors: AtomicU64,
    /// Set after a failed send, cleared by the next successful one.
    failing: AtomicBool,
}

impl PositionSender {
    /// Opens an ephemeral local socket and connects it to `remote`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Connect`] if the socket cannot be created or
    /// connected.
    pub fn connect(remote: SocketAddr) -> NetResult<Self> {
        let connect_error = |source| NetError::Connect { remote, source };

        let local: SocketAddr = if remote.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).map_err(connect_error)?;
        socket.connect(remote).map_err(connect_error)?;

        tracing::debug!(%remote, "position sender connected");

        Ok(Self {
            socket,
            remote,
            packets_sent: AtomicU64::new(0),
            send_errors: AtomicU64::new(0),
            failing: AtomicBool::new(false),
        })
    }

    /// Sends one position. Returns false if the OS refused it.
    ///
    /// Failures are never fatal: an unreachable peer just misses updates
    /// until it comes back.
    pub fn send(&self, sample: &PositionSample) -> bool {
        let payload = PositionCodec::encode(sample);
        match self.socket.send(&payload) {
            Ok(_) => {
                self.packets_sent.fetch_add(1, Ordering::Relaxed);
                if self.failing.swap(false, Ordering::Relaxed) {
                    tracing::info!(remote = %self.remote, "position sends recovered");
                }
                true
            }
            Err(e) => {
                self.send_errors.fetch_add(1, Ordering::Relaxed);
                if self.failing.swap(true, Ordering::Relaxed) {
                    tracing::debug!(remote = %self.remote, error = %e, "position send failed");
                } else {
                    tracing::warn!(remote = %self.remote, error = %e, "position send failed");
                }
                false
            }
        }
    }

    /// The peer this sender targets.
    #[inline]
    #[must_use]
    pub const fn remote(&self) -> SocketAddr {
        self.remote
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> SenderStats {
        SenderStats {
            packets_sent: self.packets_sent.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
        }
    }
}

/// One sender per configured peer.
#[derive(Debug, Default)]
pub struct PeerFanout {
    senders: Vec<PositionSender>,
}

impl PeerFanout {
    /// Connects a sender to every address, in order.
    ///
    /// # Errors
    ///
    /// Fails on the first address that cannot be connected.
    pub fn connect_all(remotes: &[SocketAddr]) -> NetResult<Self> {
        let senders = remotes
            .iter()
            .map(|&remote| PositionSender::connect(remote))
            .collect::<NetResult<Vec<_>>>()?;
        tracing::info!(peers = senders.len(), "position fanout ready");
        Ok(Self { senders })
    }

    /// Sends the sample to every peer. Returns how many sends succeeded.
    pub fn send_all(&self, sample: &PositionSample) -> usize {
        self.senders.iter().filter(|s| s.send(sample)).count()
    }

    /// Number of peers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    /// True if there is no one to send to.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Counters summed over every peer.
    #[must_use]
    pub fn stats(&self) -> SenderStats {
        let mut total = SenderStats::default();
        for sender in &self.senders {
            total += sender.stats();
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_send_reaches_remote() {
        let remote = UdpSocket::bind("127.0.0.1:0").unwrap();
        remote.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

        let sender = PositionSender::connect(remote.local_addr().unwrap()).unwrap();
        assert!(sender.send(&PositionSample::new(7.5, -1.25)));

        let mut buf = [0u8; 64];
        let (len, _) = remote.recv_from(&mut buf).unwrap();
        assert_eq!(PositionCodec::decode(&buf[..len]), Some(PositionSample::new(7.5, -1.25)));
        assert_eq!(sender.stats().packets_sent, 1);
        assert_eq!(sender.remote(), remote.local_addr().unwrap());
    }

    #[test]
    fn test_fanout_sends_to_each_peer() {
        let a = UdpSocket::bind("127.0.0.1:0").unwrap();
        let b = UdpSocket::bind("127.0.0.1:0").unwrap();
        for s in [&a, &b] {
            s.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        }

        let fanout =
            PeerFanout::connect_all(&[a.local_addr().unwrap(), b.local_addr().unwrap()]).unwrap();
        assert_eq!(fanout.len(), 2);
        assert_eq!(fanout.send_all(&PositionSample::new(1.0, 1.0)), 2);

        let mut buf = [0u8; 64];
        for s in [&a, &b] {
            let (len, _) = s.recv_from(&mut buf).unwrap();
            assert_eq!(len, crate::PAYLOAD_SIZE);
        }
        assert_eq!(fanout.stats().packets_sent, 2);
    }

    #[test]
    fn test_empty_fanout() {
        let fanout = PeerFanout::default();
        assert!(fanout.is_empty());
        assert_eq!(fanout.send_all(&PositionSample::new(0.0, 0.0)), 0);
        assert_eq!(fanout.stats(), SenderStats::default());
    }
}
