//! Per-command handlers. Each validates its arguments and queues exactly one
//! callback; none of them replies or touches shared state itself.

use std::net::SocketAddr;

use nova_types::Command;

use super::Dispatch;
use crate::context::ServerContext;
use crate::control::SystemCallback;
use crate::osc::{Message, ParseResult};

/// Route a resolved command to its handler. Commands executed by the
/// synthesis engine have no handler here and come back as unhandled.
pub(super) fn route(
    command: Command,
    message: &Message<'_>,
    endpoint: SocketAddr,
    ctx: &ServerContext,
) -> ParseResult<Dispatch> {
    let callback = match command {
        Command::Quit => handle_quit(endpoint),
        Command::Notify => handle_notify(message, endpoint)?,
        Command::Status => handle_status(endpoint),
        Command::DumpOsc => handle_dump_osc(message)?,
        Command::Sync => handle_sync(message, endpoint)?,
        _ => return Ok(Dispatch::Unhandled),
    };
    if !ctx.enqueue(callback) {
        return Ok(Dispatch::Dropped(command));
    }
    log::debug!(target: "osc::dispatch", "{} from {}", command, endpoint);
    Ok(Dispatch::Handled(command))
}

fn handle_quit(endpoint: SocketAddr) -> SystemCallback {
    SystemCallback::Quit { endpoint }
}

/// `/notify flag`: nonzero subscribes, zero unsubscribes.
fn handle_notify(message: &Message<'_>, endpoint: SocketAddr) -> ParseResult<SystemCallback> {
    let enable = message.arg_stream().int32()?;
    Ok(SystemCallback::Notify {
        endpoint,
        enable: enable != 0,
    })
}

fn handle_status(endpoint: SocketAddr) -> SystemCallback {
    SystemCallback::Status { endpoint }
}

/// `/dumpOSC mode`: only "off" and "print parsed" exist, so the mode is
/// clamped to 0..=1.
fn handle_dump_osc(message: &Message<'_>) -> ParseResult<SystemCallback> {
    let mode = message.arg_stream().int32()?;
    Ok(SystemCallback::DumpOsc {
        mode: mode.clamp(0, 1) as u8,
    })
}

fn handle_sync(message: &Message<'_>, endpoint: SocketAddr) -> ParseResult<SystemCallback> {
    let id = message.arg_stream().int32()?;
    Ok(SystemCallback::Sync { endpoint, id })
}
