#![allow(dead_code)]
//! Test harness utilities for nova-core integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use nova_core::control::{
    callback_queue, CallbackReceiver, ControlContext, ResponseTransport, SharedTestSink,
    SystemCallback, TestSink,
};
use nova_core::osc::{parse_packet, Packet, ReceivedPacket};
use nova_core::stats::PacketReport;
use nova_core::{dispatch, Command, DumpFlag, ServerContext};
use rosc::{OscBundle, OscMessage, OscPacket, OscTime, OscType};

pub fn endpoint(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// The all-ones time tag meaning "execute now".
pub fn immediate() -> OscTime {
    OscTime {
        seconds: u32::MAX,
        fractional: u32::MAX,
    }
}

/// Some time tag that is not the immediate sentinel.
pub fn scheduled() -> OscTime {
    OscTime {
        seconds: 3_900_000_000,
        fractional: 0,
    }
}

pub fn msg(addr: &str, args: Vec<OscType>) -> OscPacket {
    OscPacket::Message(OscMessage {
        addr: addr.to_string(),
        args,
    })
}

pub fn bundle(timetag: OscTime, content: Vec<OscPacket>) -> OscPacket {
    OscPacket::Bundle(OscBundle { timetag, content })
}

pub fn encode(packet: &OscPacket) -> Vec<u8> {
    rosc::encoder::encode(packet).unwrap()
}

/// A message addressed by command number instead of string, with int args.
pub fn numeric_msg(command: Command, args: &[i32]) -> Vec<u8> {
    let mut data = command.id().to_be_bytes().to_vec();
    let mut tags = vec![b','];
    tags.extend(std::iter::repeat(b'i').take(args.len()));
    tags.push(0);
    while tags.len() % 4 != 0 {
        tags.push(0);
    }
    data.extend_from_slice(&tags);
    for arg in args {
        data.extend_from_slice(&arg.to_be_bytes());
    }
    data
}

/// Wrap encoded element bytes in `levels` immediate bundles, without the
/// recursion rosc's encoder would need.
pub fn nest_immediate(element: Vec<u8>, levels: usize) -> Vec<u8> {
    let mut data = element;
    for _ in 0..levels {
        let mut outer = b"#bundle\0".to_vec();
        outer.extend_from_slice(&u64::MAX.to_be_bytes());
        outer.extend_from_slice(&(data.len() as u32).to_be_bytes());
        outer.extend_from_slice(&data);
        data = outer;
    }
    data
}

/// Decoded reply for assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyView {
    pub to: SocketAddr,
    pub address: String,
    pub type_tags: String,
    pub args: Vec<String>,
}

pub fn decode_reply(to: SocketAddr, bytes: &[u8]) -> ReplyView {
    match parse_packet(bytes).unwrap() {
        Packet::Message(m) => ReplyView {
            to,
            address: m.address().to_string(),
            type_tags: m.type_tags().to_string(),
            args: m.args().iter().map(|a| a.to_string()).collect(),
        },
        Packet::Bundle(_) => panic!("replies are single messages"),
    }
}

/// Receive side and control side wired together in-process, with replies
/// captured by a `TestSink`.
pub struct Harness {
    pub ctx: ServerContext,
    pub rx: CallbackReceiver,
    pub control: ControlContext,
    pub sink: Arc<TestSink>,
    pub dump_osc: DumpFlag,
}

impl Harness {
    pub fn new() -> Self {
        let (tx, rx) = callback_queue();
        let dump_osc = DumpFlag::new(0);
        let sink = Arc::new(TestSink::new());
        let control = ControlContext::new(
            ResponseTransport::new(SharedTestSink(sink.clone())),
            dump_osc.clone(),
        );
        Self {
            ctx: ServerContext::new(tx, dump_osc.clone()),
            rx,
            control,
            sink,
            dump_osc,
        }
    }

    /// Run a datagram through the receive-side dispatch chain.
    pub fn feed(&self, bytes: &[u8], from: SocketAddr) -> PacketReport {
        let packet = ReceivedPacket::alloc(bytes, from);
        dispatch::handle_packet(&packet, &self.ctx)
    }

    pub fn feed_packet(&self, packet: &OscPacket, from: SocketAddr) -> PacketReport {
        self.feed(&encode(packet), from)
    }

    /// Callbacks queued so far, removed without running.
    pub fn pending(&self) -> Vec<SystemCallback> {
        self.rx.take_pending()
    }

    /// Commands of the queued callbacks, removed without running.
    pub fn pending_commands(&self) -> Vec<Command> {
        self.pending().iter().map(SystemCallback::command).collect()
    }

    /// Execute queued callbacks on the control context.
    pub fn run_callbacks(&mut self) -> usize {
        self.rx.run_pending(&mut self.control)
    }

    pub fn replies(&self) -> Vec<ReplyView> {
        self.sink
            .sent()
            .iter()
            .map(|(to, bytes)| decode_reply(*to, bytes))
            .collect()
    }
}
