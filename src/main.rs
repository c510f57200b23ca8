use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::{debug, LevelFilter, Metadata, Record};
use mc_rcon::{
    config::{Config, ResponseMode},
    invoker::CommandInvoker,
    RconError,
};

/// Send a command to a game server over rcon.
///
/// The port and password come from MC_RCON_PORT and MC_RCON_PASSWORD, the
/// host from MC_RCON_HOST (default: localhost).
#[derive(Parser, Debug)]
#[command(name = "mc-rcon", version)]
struct Args {
    /// Server host, overrides MC_RCON_HOST
    #[arg(long)]
    host: Option<String>,

    /// Server rcon port, overrides MC_RCON_PORT
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    /// Seconds to wait for the TCP connection
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Seconds to wait on each read or write once connected (default: no limit)
    #[arg(long)]
    io_timeout: Option<u64>,

    /// Collect responses the server splits over several packets
    #[arg(long)]
    reassemble: bool,

    /// Skip the empty packet srcds sends before its auth answer
    #[arg(long)]
    srcds: bool,

    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Command to run; the words are joined with single spaces
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

struct SimpleLogger;

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{} - {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

fn load_config(args: &Args) -> Result<Config, RconError> {
    let mut config = Config::from_env()?
        .with_connect_timeout(Duration::from_secs(args.timeout))
        .with_io_timeout(args.io_timeout.map(Duration::from_secs));

    if let Some(host) = &args.host {
        config = config.with_host(host.clone());
    }
    if let Some(port) = args.port {
        config = config.with_port(port);
    }
    if args.srcds {
        config = config.with_srcds_auth(true);
    }
    if args.reassemble {
        config = config.with_response_mode(ResponseMode::Reassemble);
    }
    Ok(config)
}

fn print_error(err: &RconError) {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    println!("Error executing RCON command: {}", message);
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = log::set_logger(&SimpleLogger).map(|()| log::set_max_level(level));

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            print_error(&err);
            return ExitCode::FAILURE;
        }
    };
    debug!("{:?}", config);

    match CommandInvoker::new(config).execute(&args.command).await {
        Ok(response) => {
            println!("Server response:\n{}", response.body());
            ExitCode::SUCCESS
        }
        Err(err) => {
            print_error(&err);
            ExitCode::FAILURE
        }
    }
}
