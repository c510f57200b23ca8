//! End-to-end tests: the invoker against a fake rcon server on localhost.

mod common;

use std::time::Duration;

use common::{echo, spawn_server};
use mc_rcon::{
    client::Client,
    config::{Config, Password, ResponseMode},
    error::{AuthError, ProtocolError},
    invoker::CommandInvoker,
    RconError,
};
use tokio::net::TcpListener;

fn config_for(addr: std::net::SocketAddr, password: &str) -> Config {
    Config::default()
        .with_host(addr.ip().to_string())
        .with_port(addr.port())
        .with_password(Password::new(password))
        .with_io_timeout(Some(Duration::from_secs(5)))
}

#[tokio::test]
async fn test_invoke_joins_args_and_disconnects() {
    let (addr, server) = spawn_server("minecraft", echo).await;
    let invoker = CommandInvoker::new(config_for(addr, "minecraft"));

    let response = invoker.execute(&["say", "hello", "world"]).await.unwrap();
    assert_eq!(response.body(), "echo: say hello world");

    let transcript = server.await.unwrap();
    assert_eq!(transcript.passwords, vec!["minecraft"]);
    assert_eq!(transcript.commands, vec!["say hello world"]);
    assert!(transcript.closed_by_client);
}

#[tokio::test]
async fn test_invoke_with_wrong_password() {
    let (addr, server) = spawn_server("minecraft", echo).await;
    let invoker = CommandInvoker::new(config_for(addr, "creeper"));

    let err = invoker.execute(&["stop"]).await.unwrap_err();
    assert!(matches!(err, RconError::Auth(AuthError::InvalidCredentials)));

    let transcript = server.await.unwrap();
    assert!(transcript.commands.is_empty());
    assert!(transcript.closed_by_client);
}

#[tokio::test]
async fn test_invoke_without_command() {
    let invoker = CommandInvoker::new(Config::default());
    let err = invoker.execute::<String>(&[]).await.unwrap_err();
    assert!(matches!(err, RconError::EmptyCommand));
}

#[tokio::test]
async fn test_invoke_refused_connection() {
    // grab a free port, then stop listening on it
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let invoker = CommandInvoker::new(config_for(addr, "minecraft"));
    let err = invoker.execute(&["list"]).await.unwrap_err();
    assert!(matches!(err, RconError::UnreachableHost(_)));
}

#[tokio::test]
async fn test_server_hangs_up_before_answering() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
    });

    let invoker = CommandInvoker::new(config_for(addr, "minecraft"));
    let err = invoker.execute(&["list"]).await.unwrap_err();
    assert!(matches!(
        err,
        RconError::Protocol(ProtocolError::Truncated)
            | RconError::SendError(_)
            | RconError::ReceiveError(_)
    ));
    server.await.unwrap();
}

#[tokio::test]
async fn test_reassembled_response() {
    let (addr, server) = spawn_server("minecraft", |command| {
        if command.is_empty() {
            vec![String::new()]
        } else {
            vec!["part one, ".to_string(), "part two".to_string()]
        }
    })
    .await;
    let config = config_for(addr, "minecraft").with_response_mode(ResponseMode::Reassemble);

    let response = CommandInvoker::new(config)
        .execute(&["help"])
        .await
        .unwrap();
    assert_eq!(response.body(), "part one, part two");
    assert_eq!(response.packets(), 2);

    let transcript = server.await.unwrap();
    assert_eq!(transcript.commands, vec!["help", ""]);
}

#[tokio::test]
async fn test_client_runs_several_commands() {
    let (addr, server) = spawn_server("minecraft", echo).await;
    let mut client = Client::connect(&config_for(addr, "minecraft")).await.unwrap();

    client.authenticate().await.unwrap();
    assert_eq!(client.command("list").await.unwrap().body(), "echo: list");
    assert_eq!(
        client.command("time set day").await.unwrap().body(),
        "echo: time set day"
    );
    client.disconnect().await;
    client.disconnect().await;

    let transcript = server.await.unwrap();
    assert_eq!(transcript.commands, vec!["list", "time set day"]);
}
