use log::trace;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};

use crate::{
    auth::{AuthSession, AuthState},
    command::{self, Response},
    config::{Config, Password, ResponseMode},
    connection::Connection,
    error::{RconError, Result},
};

/// Simple asynchronous rcon client: one connection, one authentication
/// attempt, then any number of commands. The client should be `mut` as it
/// keeps a counter used for packet IDs.
///
/// ## Example
/// ```no_run
/// use mc_rcon::client::Client;
/// use mc_rcon::config::{Config, Password};
/// use std::error::Error;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn Error>> {
///     let config = Config::default().with_password(Password::new("<put rcon password here>"));
///     let mut client = Client::connect(&config).await?;
///     client.authenticate().await?;
///     let response = client.command("list").await?;
///
///     println!("{}", response.body());
///     client.disconnect().await;
///     Ok(())
/// }
/// ```
pub struct Client<S = TcpStream> {
    connection: Connection<S>,
    session: AuthSession,
    password: Password,
    response_mode: ResponseMode,
}

impl Client<TcpStream> {
    /// Open the TCP connection described by `config`. Does not authenticate.
    pub async fn connect(config: &Config) -> Result<Self> {
        let connection = Connection::connect(&config.host, config.port, config.connect_timeout)
            .await?
            .with_io_timeout(config.io_timeout);

        let client = Client::with_connection(
            connection,
            config.password.clone(),
            config.response_mode,
        );
        Ok(client.with_srcds_auth(config.srcds_auth))
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already open connection.
    pub fn with_connection(
        connection: Connection<S>,
        password: Password,
        response_mode: ResponseMode,
    ) -> Self {
        Client {
            connection,
            session: AuthSession::new(),
            password,
            response_mode,
        }
    }

    /// Skip the empty RESPONSE_VALUE srcds sends ahead of its auth answer.
    pub fn with_srcds_auth(mut self, srcds_auth: bool) -> Self {
        self.session = if srcds_auth {
            AuthSession::srcds()
        } else {
            AuthSession::new()
        };
        self
    }

    pub async fn authenticate(&mut self) -> Result<()> {
        if !self.connection.is_connected() {
            return Err(RconError::NotConnected);
        }
        self.session
            .authenticate(&mut self.connection, &self.password)
            .await?;
        trace!("auth complete");
        Ok(())
    }

    /// Run a rcon command. Fails without touching the network if the client
    /// is not authenticated. A transport or framing failure closes the
    /// connection and drops the authentication with it.
    pub async fn command(&mut self, command: &str) -> Result<Response> {
        let result =
            command::execute(&mut self.connection, &self.session, command, self.response_mode)
                .await;
        if result.is_err() && !self.connection.is_connected() {
            self.session.reset();
        }
        result
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn auth_state(&self) -> AuthState {
        self.session.state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Close the connection and drop the authentication. Idempotent.
    pub async fn disconnect(&mut self) {
        self.connection.disconnect().await;
        self.session.reset();
    }
}
