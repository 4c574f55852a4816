//! Response transport: encodes reply messages and hands them to a datagram
//! sink.
//!
//! `ReplySink` captures *where* replies go independently of *how* they are
//! sent, so the control loop can be exercised without a socket.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{Arc, Mutex};

use rosc::{OscMessage, OscPacket, OscType};

/// Buffer budget for replies with few or no arguments (`/done`, `/synced`).
pub const SMALL_REPLY_CAPACITY: usize = 128;

/// Buffer budget for `status.reply`.
pub const STATUS_REPLY_CAPACITY: usize = 1024;

/// Destination for encoded reply datagrams.
pub trait ReplySink: Send {
    fn send_datagram(&self, data: &[u8], endpoint: SocketAddr) -> io::Result<()>;
}

impl ReplySink for UdpSocket {
    fn send_datagram(&self, data: &[u8], endpoint: SocketAddr) -> io::Result<()> {
        self.send_to(data, endpoint).map(|_| ())
    }
}

/// Live server metrics carried by `status.reply`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusReport {
    pub ugens: i32,
    pub synths: i32,
    pub groups: i32,
    pub synthdefs: i32,
    pub avg_cpu: f32,
    pub peak_cpu: f32,
    pub nominal_sample_rate: f64,
    pub actual_sample_rate: f64,
}

impl StatusReport {
    /// Every metric unset (`-1`). This front end does not track the engine's
    /// node graph, so this is what `/status` answers with.
    pub fn unknown() -> Self {
        Self {
            ugens: -1,
            synths: -1,
            groups: -1,
            synthdefs: -1,
            avg_cpu: -1.0,
            peak_cpu: -1.0,
            nominal_sample_rate: -1.0,
            actual_sample_rate: -1.0,
        }
    }
}

impl Default for StatusReport {
    fn default() -> Self {
        Self::unknown()
    }
}

/// An outbound message together with the fixed buffer size it must fit in.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    message: OscMessage,
    capacity: usize,
}

impl Reply {
    /// `/done`, acknowledging `quit` and `notify`.
    pub fn done() -> Self {
        Self::new("/done", Vec::new(), SMALL_REPLY_CAPACITY)
    }

    /// `/synced id`, answering `sync`.
    pub fn synced(id: i32) -> Self {
        Self::new("/synced", vec![OscType::Int(id)], SMALL_REPLY_CAPACITY)
    }

    /// `status.reply` with the nine fields in protocol order. The first
    /// argument is unused and always 1.
    pub fn status(report: &StatusReport) -> Self {
        Self::new(
            "status.reply",
            vec![
                OscType::Int(1),
                OscType::Int(report.ugens),
                OscType::Int(report.synths),
                OscType::Int(report.groups),
                OscType::Int(report.synthdefs),
                OscType::Float(report.avg_cpu),
                OscType::Float(report.peak_cpu),
                OscType::Double(report.nominal_sample_rate),
                OscType::Double(report.actual_sample_rate),
            ],
            STATUS_REPLY_CAPACITY,
        )
    }

    fn new(addr: &str, args: Vec<OscType>, capacity: usize) -> Self {
        Self {
            message: OscMessage {
                addr: addr.to_string(),
                args,
            },
            capacity,
        }
    }

    pub fn address(&self) -> &str {
        &self.message.addr
    }

    /// Encode to wire bytes.
    ///
    /// # Panics
    /// If the encoded message exceeds the reply's capacity. Reply shapes are
    /// fixed, so this is a programming error rather than a runtime condition.
    pub fn encode(&self) -> io::Result<Vec<u8>> {
        let packet = OscPacket::Message(self.message.clone());
        let bytes = rosc::encoder::encode(&packet)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        assert!(
            bytes.len() <= self.capacity,
            "reply {} needs {} bytes, capacity is {}",
            self.message.addr,
            bytes.len(),
            self.capacity
        );
        Ok(bytes)
    }
}

/// Encodes replies and writes them to the sink.
pub struct ResponseTransport {
    sink: Box<dyn ReplySink>,
}

impl ResponseTransport {
    pub fn new(sink: impl ReplySink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
        }
    }

    pub fn send(&self, reply: &Reply, endpoint: SocketAddr) -> io::Result<()> {
        let bytes = reply.encode()?;
        self.sink.send_datagram(&bytes, endpoint)?;
        log::trace!(target: "control", "sent {} ({} bytes) to {}", reply.address(), bytes.len(), endpoint);
        Ok(())
    }
}

// ─── TestSink ───────────────────────────────────────────────────────

/// A sink that records every datagram for assertions.
pub struct TestSink {
    sent: Mutex<Vec<(SocketAddr, Vec<u8>)>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    /// All datagrams sent so far, in order.
    pub fn sent(&self) -> Vec<(SocketAddr, Vec<u8>)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl Default for TestSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplySink for TestSink {
    fn send_datagram(&self, data: &[u8], endpoint: SocketAddr) -> io::Result<()> {
        self.sent.lock().unwrap().push((endpoint, data.to_vec()));
        Ok(())
    }
}

/// Wraps `Arc<TestSink>` so a transport can own the sink while tests keep a
/// handle for assertions.
pub struct SharedTestSink(pub Arc<TestSink>);

impl ReplySink for SharedTestSink {
    fn send_datagram(&self, data: &[u8], endpoint: SocketAddr) -> io::Result<()> {
        self.0.send_datagram(data, endpoint)
    }
}

// ─── NullSink ───────────────────────────────────────────────────────

/// Discards every reply.
pub struct NullSink;

impl ReplySink for NullSink {
    fn send_datagram(&self, _: &[u8], _: SocketAddr) -> io::Result<()> {
        Ok(())
    }
}
