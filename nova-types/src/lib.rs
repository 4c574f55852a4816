//! # nova-types
//!
//! Shared type definitions for the nova control front end.
//! This crate contains the command table and the bundle time tag, used by
//! nova-core and nova-server.

mod command;
mod time_tag;

pub use command::{Command, COMMAND_COUNT};
pub use time_tag::TimeTag;
