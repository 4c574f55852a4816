//! Packet dispatch: bundle expansion and two-tier address resolution.
//!
//! Messages whose address is a 4-byte command number resolve through
//! [`Command::from_id`]; string addresses resolve through
//! [`Command::from_address`]. Both land in the same handler table.
//!
//! Errors stop at message granularity: a malformed message or bundle element
//! is logged and dropped, and its siblings are still dispatched.

mod handlers;

use std::net::SocketAddr;

use nova_types::Command;

use crate::context::ServerContext;
use crate::osc::{
    Address, Bundle, Message, Packet, ParseError, ParseResult, ReceivedPacket, MAX_BUNDLE_DEPTH,
};
use crate::stats::PacketReport;

/// Outcome of dispatching one well-formed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A handler ran and queued its callback.
    Handled(Command),
    /// No handler for this address; logged and discarded.
    Unhandled,
    /// A handler ran but the control loop had already exited, so its
    /// callback was discarded.
    Dropped(Command),
}

/// Parse and dispatch a received packet, recording the outcome in the
/// context's receive stats.
pub fn handle_packet(packet: &ReceivedPacket, ctx: &ServerContext) -> PacketReport {
    let mut report = PacketReport::default();
    let endpoint = packet.endpoint();
    let parsed = packet.parse();

    if ctx.dump_osc().is_enabled() {
        log::info!(target: "osc::dump", "{}", render_dump(packet, &parsed));
    }

    match parsed {
        Ok(Packet::Message(msg)) => dispatch_counted(&msg, endpoint, ctx, &mut report),
        Ok(Packet::Bundle(bundle)) => handle_bundle(&bundle, endpoint, ctx, &mut report),
        Err(e) => {
            log::warn!(target: "osc::dispatch", "dropping malformed packet from {}: {}", endpoint, e);
            report.malformed += 1;
        }
    }

    ctx.stats().record(&report);
    report
}

/// Text printed for each packet while `dumpOSC` is on. Packets that fail to
/// parse are shown as raw bytes.
fn render_dump(packet: &ReceivedPacket, parsed: &ParseResult<Packet<'_>>) -> String {
    match parsed {
        Ok(p) => format!("received osc packet from {}\n{}", packet.endpoint(), p),
        Err(e) => format!(
            "received malformed osc packet from {} ({} bytes, {}): {:02x?}",
            packet.endpoint(),
            packet.len(),
            e,
            packet.data()
        ),
    }
}

/// Dispatch every element of an immediate bundle in wire order, recursing
/// into nested bundles up to [`MAX_BUNDLE_DEPTH`] levels.
///
/// Bundles with any other time tag are dropped: there is no scheduler to
/// defer them to.
pub fn handle_bundle(
    bundle: &Bundle<'_>,
    endpoint: SocketAddr,
    ctx: &ServerContext,
    report: &mut PacketReport,
) {
    dispatch_bundle(bundle, endpoint, ctx, report, 1);
}

fn dispatch_bundle(
    bundle: &Bundle<'_>,
    endpoint: SocketAddr,
    ctx: &ServerContext,
    report: &mut PacketReport,
    level: usize,
) {
    if level > MAX_BUNDLE_DEPTH {
        let e = ParseError::NestingTooDeep { limit: MAX_BUNDLE_DEPTH };
        log::warn!(target: "osc::dispatch", "dropping bundle from {}: {}", endpoint, e);
        report.malformed += 1;
        return;
    }

    let time_tag = bundle.time_tag();
    if !time_tag.is_immediate() {
        log::debug!(
            target: "osc::dispatch",
            "dropping bundle from {} scheduled for {}",
            endpoint,
            time_tag
        );
        report.deferred_dropped += 1;
        return;
    }

    for element in bundle.elements() {
        match element {
            Ok(Packet::Message(msg)) => dispatch_counted(&msg, endpoint, ctx, report),
            Ok(Packet::Bundle(inner)) => dispatch_bundle(&inner, endpoint, ctx, report, level + 1),
            Err(e) => {
                log::warn!(target: "osc::dispatch", "dropping malformed bundle element from {}: {}", endpoint, e);
                report.malformed += 1;
            }
        }
    }
}

fn dispatch_counted(
    message: &Message<'_>,
    endpoint: SocketAddr,
    ctx: &ServerContext,
    report: &mut PacketReport,
) {
    match handle_message(message, endpoint, ctx) {
        Ok(Dispatch::Handled(_)) => report.handled += 1,
        Ok(Dispatch::Unhandled) => report.unhandled += 1,
        Ok(Dispatch::Dropped(_)) => {}
        Err(e) => {
            log::warn!(target: "osc::dispatch", "error in message {} from {}: {}", message.address(), endpoint, e);
            report.malformed += 1;
        }
    }
}

/// Resolve a message's address and run its handler.
///
/// Unknown addresses are not an error: they are logged as unhandled. Errors
/// are reserved for malformed input (no leading `/`, wrong argument shape),
/// in which case nothing is queued.
pub fn handle_message(
    message: &Message<'_>,
    endpoint: SocketAddr,
    ctx: &ServerContext,
) -> ParseResult<Dispatch> {
    let command = match message.address() {
        Address::Numeric(id) => Command::from_id(id),
        Address::Pattern(address) => {
            if !address.starts_with('/') {
                return Err(ParseError::BadAddress(address.to_string()));
            }
            log::trace!(target: "osc::dispatch", "handling message {}", address);
            Command::from_address(address)
        }
    };

    let outcome = match command {
        Some(command) => handlers::route(command, message, endpoint, ctx)?,
        None => Dispatch::Unhandled,
    };
    if outcome == Dispatch::Unhandled {
        log::info!(target: "osc::dispatch", "unhandled message {}", message.address());
    }
    Ok(outcome)
}
