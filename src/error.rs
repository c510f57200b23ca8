use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, RconError>;

/// Possible errors for the package.
#[derive(Error, Debug)]
pub enum RconError {
    /// Returned if the host is down, behind a firewall or can't be resolved.
    #[error("host cannot be reached")]
    UnreachableHost(#[source] std::io::Error),
    /// Returned if the TCP handshake did not finish within the connect timeout.
    #[error("timed out connecting to host after {0:?}")]
    ConnectTimeout(Duration),
    /// Internal error used if the stream was successfully established, but
    /// there was a problem writing to the socket.
    #[error("cannot send message to host")]
    SendError(#[source] std::io::Error),
    /// Internal error used if the stream was successfully established, but
    /// there was a problem reading from the socket.
    #[error("cannot receive response from host")]
    ReceiveError(#[source] std::io::Error),
    /// Returned if an I/O deadline is configured and the peer stalled.
    #[error("no progress on the connection for {0:?}")]
    IoTimeout(Duration),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    /// Returned if the connection was already torn down.
    #[error("not connected to the server")]
    NotConnected,
    #[error("no command given")]
    EmptyCommand,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The bytes on the wire don't form a valid packet. The connection should
/// not be used afterwards.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("packet too short: {0} bytes")]
    TooShort(usize),
    #[error("packet size field is {declared} but {actual} bytes follow it")]
    SizeMismatch { declared: i32, actual: usize },
    #[error("packet size {0} is out of bounds")]
    SizeOutOfBounds(i32),
    #[error("stream closed in the middle of a packet")]
    Truncated,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    /// Returned if you can't remember the password.
    #[error("authentication failed: invalid password")]
    InvalidCredentials,
    #[error("authentication failed: mismatched request IDs (expected {expected}, got {got})")]
    Mismatch { expected: i32, got: i32 },
    /// A session gets exactly one attempt; open a new connection to retry.
    #[error("authentication was already attempted on this connection")]
    AlreadyAttempted,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExecError {
    #[error("not authenticated")]
    NotAuthenticated,
}
