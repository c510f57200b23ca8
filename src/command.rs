use log::trace;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    auth::AuthSession,
    config::ResponseMode,
    connection::Connection,
    error::{ExecError, Result},
    packet::{Packet, PacketType},
};

/// Container struct for a response that can be glued together from multiple [Packet]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    body: String,
    packets: usize,
}

impl Response {
    pub fn body(&self) -> &str {
        self.body.as_ref()
    }

    /// How many packets the body was assembled from.
    pub fn packets(&self) -> usize {
        self.packets
    }
}

/// Run one command on an authenticated session.
///
/// In [ResponseMode::Single] exactly one response packet is read, so output
/// the server splits over several packets comes back truncated. Use
/// [ResponseMode::Reassemble] for commands with long output.
pub async fn execute<S>(
    conn: &mut Connection<S>,
    session: &AuthSession,
    command: &str,
    mode: ResponseMode,
) -> Result<Response>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if !session.is_authenticated() {
        return Err(ExecError::NotAuthenticated.into());
    }

    match mode {
        ResponseMode::Single => execute_single(conn, command).await,
        ResponseMode::Reassemble => execute_reassembled(conn, command).await,
    }
}

async fn execute_single<S>(conn: &mut Connection<S>, command: &str) -> Result<Response>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let id = conn.next_request_id();
    trace!("sending command packet {} to server", id);
    conn.send(&Packet::new(id, PacketType::EXEC_COMMAND, command))
        .await?;

    let response = conn.receive().await?;
    if response.id() != id {
        trace!("response id {} does not match command id {}", response.id(), id);
    }

    Ok(Response {
        body: response.body_text().into_owned(),
        packets: 1,
    })
}

async fn execute_reassembled<S>(conn: &mut Connection<S>, command: &str) -> Result<Response>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let command_packet = Packet::new(conn.next_request_id(), PacketType::EXEC_COMMAND, command);
    // the server won't tell us how many packets the response spans, so we send
    // a blank command right after and collect until its answer shows up.
    let tracking_packet = Packet::new(conn.next_request_id(), PacketType::EXEC_COMMAND, "");

    trace!("sending main packet {} to server", command_packet.id());
    conn.send(&command_packet).await?;
    trace!("sending tracking (blank) packet {} to server", tracking_packet.id());
    conn.send(&tracking_packet).await?;

    let mut body = Vec::<u8>::new();
    let mut packets = 0;

    loop {
        // responses arrive in the order the requests were sent
        let response = conn.receive().await?;
        if response.id() == tracking_packet.id() {
            trace!("that was the tracking packet, completing response");
            break;
        }
        if response.id() == command_packet.id() {
            packets += 1;
            body.extend_from_slice(response.body());
        } else {
            trace!("discarding packet with unexpected id {}", response.id());
        }
    }

    Ok(Response {
        body: String::from_utf8_lossy(&body).into_owned(),
        packets,
    })
}
