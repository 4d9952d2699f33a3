use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use futures::StreamExt;
use haierac_client::transport::{self, TransportOpt};
use haierac_client::Client;
use haierac_common::config::{self, ConfigError};
use haierac_common::logger;
use structopt::StructOpt;
use thiserror::Error;

/// Polls a Haier indoor unit and prints every status frame it reports.
#[derive(StructOpt)]
struct Opt {
    #[structopt(short = "p", long = "port", env = "HAIERAC_PORT", help = "serial port the unit is attached to")]
    port: Option<PathBuf>,
    #[structopt(short = "i", long = "interval", help = "seconds between polls")]
    interval: Option<u64>,
    #[structopt(short = "r", long = "raw", help = "print the full byte table of each frame")]
    raw: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ExitCode> {
    let opt = Opt::from_args();

    logger::init();

    run(opt).await.map_err(|err| {
        log::error!("{err}");
        ExitCode::FAILURE
    })
}

#[derive(Debug, Error)]
enum RunError {
    #[error("reading config: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    OpenBus(#[from] transport::OpenError),
    #[error("writing output: {0}")]
    Output(#[from] io::Error),
}

async fn run(opt: Opt) -> Result<(), RunError> {
    let config = config::load()?;

    let transport = TransportOpt {
        port: opt.port.unwrap_or_else(|| config.device.port.clone()),
        baud_rate: config.device.baud_rate,
    };

    let interval = opt.interval
        .map(Duration::from_secs)
        .unwrap_or(config.device.poll_interval());

    let client = Client::connect(&transport, interval).await?;
    monitor(&client, opt.raw).await?;
    Ok(())
}

async fn monitor(client: &Client, raw: bool) -> Result<(), io::Error> {
    let mut updates = client.watch();

    while let Some(state) = updates.next().await {
        let mut rendered = format!("{state}\n");
        if raw {
            haierac_protocol::pretty::pretty_print(&mut rendered, &client.frame(), use_color())
                .map_err(io::Error::other)?;
        }
        io::stdout().write_all(rendered.as_bytes())?;
    }

    Ok(())
}

fn use_color() -> bool {
    io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}
