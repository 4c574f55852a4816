//! Wire-level handling of received OSC data: the owned packet copy, the
//! zero-copy parser, and parse errors.

mod error;
mod packet;
mod parser;

pub use error::{ParseError, ParseResult};
pub use packet::ReceivedPacket;
pub use parser::{
    parse_packet, Address, Arg, ArgStream, Bundle, BundleElements, Message, Packet, MAX_BUNDLE_DEPTH,
};
