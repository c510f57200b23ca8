//! The authentication handshake.
//!
//! ```text
//! Unauthenticated ──send AUTH──▶ AuthPending ──id matches──▶ Authenticated
//!                                     │
//!                                     └──id -1 / other id──▶ Rejected
//! ```
//!
//! A session gets a single attempt. After a rejection the connection is in an
//! undefined state as far as the server is concerned, so retrying means
//! opening a new one.

use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    config::Password,
    connection::Connection,
    error::{AuthError, Result},
    packet::{Packet, PacketType, AUTH_FAILED_ID},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    AuthPending,
    Authenticated,
    Rejected,
}

#[derive(Debug, Default)]
pub struct AuthSession {
    state: AuthState,
    srcds_preamble: bool,
}

impl AuthSession {
    /// Reads exactly one packet as the server's answer.
    pub fn new() -> Self {
        Self::default()
    }

    /// srcds answers an auth packet with an empty RESPONSE_VALUE first and
    /// the AUTH_RESPONSE second. A session built this way skips the former.
    pub fn srcds() -> Self {
        AuthSession {
            state: AuthState::Unauthenticated,
            srcds_preamble: true,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    /// Forget the authentication, e.g. once the connection is closed.
    pub fn reset(&mut self) {
        self.state = AuthState::Unauthenticated;
    }

    /// Send the password and check the server's answer.
    ///
    /// The answer carries `-1` as its id if the password is wrong, otherwise it
    /// echoes the id of our auth packet.
    pub async fn authenticate<S>(
        &mut self,
        conn: &mut Connection<S>,
        password: &Password,
    ) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if self.state != AuthState::Unauthenticated {
            return Err(AuthError::AlreadyAttempted.into());
        }

        let id = conn.next_request_id();
        let skip_preamble = self.srcds_preamble;
        self.state = AuthState::AuthPending;

        trace!("sending auth packet {} to server", id);
        let sent = async {
            conn.send(&Packet::new(id, PacketType::AUTH, password.expose()))
                .await?;
            let response = conn.receive().await?;
            if skip_preamble && is_srcds_preamble(&response, id) {
                trace!("skipping empty response value preceding the auth response");
                return conn.receive().await;
            }
            Ok(response)
        }
        .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                self.state = AuthState::Rejected;
                return Err(e);
            }
        };

        match check_response(&response, id) {
            Ok(()) => {
                debug!("rcon authentication succeeded");
                self.state = AuthState::Authenticated;
                Ok(())
            }
            Err(e) => {
                debug!("rcon authentication rejected: {}", e);
                self.state = AuthState::Rejected;
                Err(e.into())
            }
        }
    }
}

fn is_srcds_preamble(response: &Packet, id: i32) -> bool {
    response.id() == id
        && response.packet_type() == PacketType::RESPONSE_VALUE
        && response.body().is_empty()
}

fn check_response(response: &Packet, expected: i32) -> std::result::Result<(), AuthError> {
    if response.id() == AUTH_FAILED_ID {
        return Err(AuthError::InvalidCredentials);
    }
    if response.id() != expected {
        return Err(AuthError::Mismatch {
            expected,
            got: response.id(),
        });
    }
    Ok(())
}
