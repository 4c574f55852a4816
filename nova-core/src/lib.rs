//! # nova-core
//!
//! Control-protocol front end for a real-time synthesis server: receives OSC
//! over UDP, expands bundles, dispatches server commands and answers peers,
//! without doing any of that work on the audio thread.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nova_core::config::Config;
//! use nova_core::server::OscServer;
//!
//! let settings = Config::load().server_settings();
//! let server = OscServer::start(&settings)?;
//! // Runs until a client sends /quit
//! let exit = server.wait()?;
//! ```
//!
//! ## Module Overview
//!
//! - [`osc`] — `ReceivedPacket` (owned datagram copy) and the zero-copy
//!   message/bundle parser
//! - [`dispatch`] — bundle expansion, numeric and string address resolution,
//!   per-command handlers
//! - [`control`] — `SystemCallback` queue, the control loop, observer
//!   registry, reply encoding and transport
//! - [`server`] — `OscServer`: socket, receive thread, control thread
//! - [`config`] — TOML configuration (embedded defaults + user override)

pub mod config;
pub mod context;
pub mod control;
pub mod dispatch;
pub mod osc;
pub mod server;
pub mod stats;

pub use context::{DumpFlag, ServerContext};
pub use nova_types::{Command, TimeTag};
