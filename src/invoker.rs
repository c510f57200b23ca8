//! One-shot command invocation: connect, authenticate, run a single command,
//! disconnect. There is no retry; whatever fails is reported as is.

use log::{debug, info};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    client::Client,
    command::Response,
    config::Config,
    error::{RconError, Result},
};

pub struct CommandInvoker {
    config: Config,
}

impl CommandInvoker {
    pub fn new(config: Config) -> Self {
        CommandInvoker { config }
    }

    /// Join `args` with single spaces and run them as one command.
    pub async fn execute<T: AsRef<str>>(&self, args: &[T]) -> Result<Response> {
        let command = join_command(args)?;

        info!(
            "connecting to {} (password set: {})",
            self.config.address(),
            !self.config.password.is_empty()
        );
        let mut client = Client::connect(&self.config).await?;
        run_once(&mut client, &command).await
    }
}

/// Authenticate and run `command` on `client`, then disconnect whatever the
/// outcome.
pub async fn run_once<S>(client: &mut Client<S>, command: &str) -> Result<Response>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let result = async {
        client.authenticate().await?;
        debug!("executing command: {}", command);
        client.command(command).await
    }
    .await;

    client.disconnect().await;
    result
}

pub fn join_command<T: AsRef<str>>(args: &[T]) -> Result<String> {
    let command = args
        .iter()
        .map(|arg| arg.as_ref())
        .collect::<Vec<_>>()
        .join(" ");

    if command.trim().is_empty() {
        return Err(RconError::EmptyCommand);
    }
    Ok(command)
}
