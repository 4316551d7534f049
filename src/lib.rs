//! RFC 2217 Telnet Com-Port-Control server.
//!
//! Lets a remote telnet client treat a TCP connection as a local serial
//! port: byte streams, baud-rate changes, control-line manipulation
//! (DTR/RTS/break), flow-control selection, and buffer purges all travel
//! over the Telnet Com-Port-Option (RFC 2217, option code 0x2C). The
//! protocol engine itself lives in the [`telnet_negotiation`] crate; this
//! crate supplies the concurrency model that ties a listening socket to a
//! single active client session and the host-facing lifecycle API.
//!
//! A host application implements [`telnet_negotiation::Rfc2217Callbacks`]
//! to bridge the virtualized serial port to whatever real transport it has
//! — a UART, a USB-CDC adapter, or (see `demos/loopback_demo.rs`) a plain
//! in-memory loopback.

pub mod config;
pub mod errors;
pub mod server;
mod session;

pub use config::Rfc2217ServerConfig;
pub use errors::{Rfc2217Error, Rfc2217Result};
pub use server::Rfc2217Server;

pub use telnet_negotiation::{ControlSignal, PurgeTarget, Rfc2217Callbacks};
