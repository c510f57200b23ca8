//! Async client for the [Source RCON protocol](https://developer.valvesoftware.com/wiki/Source_RCON_Protocol),
//! as spoken by Minecraft and Source engine servers.
pub mod auth;
pub mod client;
pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod invoker;
pub mod packet;

pub use error::{RconError, Result};
