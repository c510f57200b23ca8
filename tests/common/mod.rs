//! A minimal rcon server for driving the client over real sockets.

use std::net::SocketAddr;

use mc_rcon::{
    connection::Connection,
    packet::{Packet, PacketType},
};
use tokio::{net::TcpListener, task::JoinHandle};

/// What the fake server saw before the client went away.
#[derive(Debug, Default)]
pub struct Transcript {
    pub passwords: Vec<String>,
    pub commands: Vec<String>,
    pub closed_by_client: bool,
}

/// Accept one connection, check the password, then answer every command with
/// the packets `reply` returns for it.
pub async fn spawn_server<F>(password: &'static str, reply: F) -> (SocketAddr, JoinHandle<Transcript>)
where
    F: Fn(&str) -> Vec<String> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut conn = Connection::from_stream(stream);
        let mut transcript = Transcript::default();

        let auth = match conn.receive().await {
            Ok(packet) => packet,
            Err(_) => {
                transcript.closed_by_client = true;
                return transcript;
            }
        };
        let attempt = auth.body_text().into_owned();
        let accepted = attempt == password;
        transcript.passwords.push(attempt);

        let id = if accepted { auth.id() } else { -1 };
        conn.send(&Packet::new(id, PacketType::AUTH_RESPONSE, ""))
            .await
            .unwrap();

        loop {
            let request = match conn.receive().await {
                Ok(packet) => packet,
                Err(_) => {
                    transcript.closed_by_client = true;
                    break;
                }
            };
            let command = request.body_text().into_owned();
            for body in reply(&command) {
                conn.send(&Packet::new(request.id(), PacketType::RESPONSE_VALUE, body))
                    .await
                    .unwrap();
            }
            transcript.commands.push(command);
        }

        transcript
    });

    (addr, handle)
}

/// Answer every command with a single echo packet.
pub fn echo(command: &str) -> Vec<String> {
    vec![format!("echo: {}", command)]
}
