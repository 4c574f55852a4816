//! Owned copy of a received datagram plus the endpoint it came from.

use std::net::SocketAddr;

use super::error::ParseResult;
use super::parser::{parse_packet, Packet};

/// A datagram as handed over by the socket.
///
/// The payload is copied once into a single boxed slice at construction and
/// never mutated afterwards. Parsed views ([`Packet`], [`super::Message`])
/// borrow from it, so they cannot outlive the packet.
#[derive(Debug, Clone)]
pub struct ReceivedPacket {
    endpoint: SocketAddr,
    data: Box<[u8]>,
}

impl ReceivedPacket {
    /// Copy `data` into a new packet received from `endpoint`.
    pub fn alloc(data: &[u8], endpoint: SocketAddr) -> Self {
        Self {
            endpoint,
            data: Box::from(data),
        }
    }

    pub fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Interpret the payload as a message or bundle.
    pub fn parse(&self) -> ParseResult<Packet<'_>> {
        parse_packet(&self.data)
    }
}
