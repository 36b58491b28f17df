use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};

use crate::error::ReplayError;

/// Default endpoint: the well-known local broadcast group, send-only.
pub const DEFAULT_PROVIDER: &str = "udpm://239.255.76.67:7667?ttl=0";

/// Sync word opening every datagram ("LP01").
const DATAGRAM_MAGIC: u32 = 0x4C50_3031;

/// Longest channel name the wire header can carry.
const MAX_CHANNEL: usize = 255;

/// Largest payload a single UDP datagram can carry.
const MAX_DATAGRAM: usize = 65_507;

/// Send side of the pub/sub bus. The driver hands over eligible records
/// one at a time, in capture order.
pub trait Publisher {
    /// Fire-and-forget send. A failure aborts the session.
    fn publish(&mut self, channel: &str, payload: &[u8]) -> Result<(), ReplayError>;
}

/// Parsed `udpm://GROUP:PORT?ttl=N` endpoint string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    pub group: Ipv4Addr,
    pub port: u16,
    pub ttl: u32,
}

impl Provider {
    /// Parse an endpoint string. A malformed string aborts at session
    /// start; there is no retry.
    pub fn parse(s: &str) -> Result<Self, ReplayError> {
        let rest = s
            .strip_prefix("udpm://")
            .ok_or_else(|| ReplayError::open(s, "provider must start with udpm://"))?;
        let (addr, query) = match rest.split_once('?') {
            Some((addr, query)) => (addr, Some(query)),
            None => (rest, None),
        };

        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| ReplayError::open(s, "provider must name GROUP:PORT"))?;
        let group: Ipv4Addr = host
            .parse()
            .map_err(|_| ReplayError::open(s, format!("bad multicast group '{host}'")))?;
        if !group.is_multicast() {
            return Err(ReplayError::open(
                s,
                format!("'{host}' is not a multicast group"),
            ));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| ReplayError::open(s, format!("bad port '{port}'")))?;

        let mut ttl = 0u32;
        if let Some(query) = query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                match pair.split_once('=') {
                    Some(("ttl", value)) => {
                        ttl = value.parse().map_err(|_| {
                            ReplayError::open(s, format!("bad ttl '{value}'"))
                        })?;
                    }
                    // Sending is all this publisher does; accept the flag.
                    Some(("transmit_only", _)) => {}
                    _ => {
                        return Err(ReplayError::open(
                            s,
                            format!("unknown provider option '{pair}'"),
                        ));
                    }
                }
            }
        }

        Ok(Self { group, port, ttl })
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "udpm://{}:{}?ttl={}", self.group, self.port, self.ttl)
    }
}

/// Send-only UDP multicast publisher.
///
/// Datagram layout (big-endian): sync word, sequence number,
/// NUL-terminated channel name, payload.
pub struct UdpPublisher {
    socket: UdpSocket,
    dest: SocketAddrV4,
    seq: u32,
    buf: Vec<u8>,
}

impl UdpPublisher {
    pub fn connect(provider: &Provider) -> Result<Self, ReplayError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .map_err(|e| ReplayError::open(provider.to_string(), e))?;
        socket
            .set_multicast_ttl_v4(provider.ttl)
            .map_err(|e| ReplayError::open(provider.to_string(), e))?;
        tracing::debug!(provider = %provider, "publisher socket ready");
        Ok(Self {
            socket,
            dest: SocketAddrV4::new(provider.group, provider.port),
            seq: 0,
            buf: Vec::with_capacity(1024),
        })
    }
}

impl Publisher for UdpPublisher {
    fn publish(&mut self, channel: &str, payload: &[u8]) -> Result<(), ReplayError> {
        self.buf.clear();
        encode_datagram(self.seq, channel, payload, &mut self.buf)?;
        self.socket
            .send_to(&self.buf, self.dest)
            .map_err(|e| ReplayError::publish(channel, e))?;
        self.seq = self.seq.wrapping_add(1);
        Ok(())
    }
}

/// Encode one datagram into `buf`.
fn encode_datagram(
    seq: u32,
    channel: &str,
    payload: &[u8],
    buf: &mut Vec<u8>,
) -> Result<(), ReplayError> {
    if channel.len() > MAX_CHANNEL {
        return Err(ReplayError::publish(
            channel,
            format!("channel name too long: {} bytes (max {MAX_CHANNEL})", channel.len()),
        ));
    }
    let total = 4 + 4 + channel.len() + 1 + payload.len();
    if total > MAX_DATAGRAM {
        return Err(ReplayError::publish(
            channel,
            format!("datagram too large: {total} bytes (max {MAX_DATAGRAM})"),
        ));
    }

    buf.extend_from_slice(&DATAGRAM_MAGIC.to_be_bytes());
    buf.extend_from_slice(&seq.to_be_bytes());
    buf.extend_from_slice(channel.as_bytes());
    buf.push(0);
    buf.extend_from_slice(payload);
    Ok(())
}
