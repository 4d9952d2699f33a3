use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use haierac_client::transport::{self, TransportOpt};
use haierac_client::Client;
use haierac_common::config::{self, ConfigError};
use haierac_common::logger;
use haierac_protocol::field::types::Celsius;
use haierac_protocol::{ClimateState, Command, FanMode, HvacMode};
use structopt::StructOpt;
use thiserror::Error;

/// Reads or changes the settings of a Haier indoor unit.
#[derive(StructOpt)]
struct Opt {
    #[structopt(short = "p", long = "port", env = "HAIERAC_PORT", help = "serial port the unit is attached to")]
    port: Option<PathBuf>,
    #[structopt(short = "t", long = "timeout", default_value = "10", help = "seconds to wait for the unit to answer")]
    timeout: u64,
    #[structopt(subcommand)]
    cmd: Cmd,
}

#[derive(StructOpt)]
enum Cmd {
    /// Print the current status
    Status,
    /// Set the operating mode: off, auto, cool, heat, dry or fan_only
    Mode { mode: HvacMode },
    /// Set the fan speed: off, auto, low, medium or high
    Fan { fan: FanMode },
    /// Set the target temperature in °C
    Temp { temperature: i16 },
    /// Change several settings in one command frame
    Set {
        #[structopt(long)]
        mode: Option<HvacMode>,
        #[structopt(long)]
        fan: Option<FanMode>,
        #[structopt(long)]
        temp: Option<i16>,
    },
    /// Send the power-on request
    PowerOn,
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
    #[error(transparent)]
    Client(#[from] haierac_client::Error),
    #[error("nothing to change")]
    EmptyCommand,
}

async fn run(opt: Opt) -> Result<(), RunError> {
    let config = config::load()?;

    let transport = TransportOpt {
        port: opt.port.unwrap_or_else(|| config.device.port.clone()),
        baud_rate: config.device.baud_rate,
    };
    let timeout = Duration::from_secs(opt.timeout);

    let client = Client::connect(&transport, config.device.poll_interval()).await?;
    let state = client.wait_for_status(timeout).await?;

    let command = match opt.cmd {
        Cmd::Status => {
            print_state(&state);
            return Ok(());
        }
        Cmd::PowerOn => {
            client.power_on().await?;
            return confirm(&client, timeout).await;
        }
        Cmd::Mode { mode } => Command::from_call(Some(mode), None, None),
        Cmd::Fan { fan } => Command::from_call(None, Some(fan), None),
        Cmd::Temp { temperature } => Command::from_call(None, None, Some(Celsius(temperature))),
        Cmd::Set { mode, fan, temp } => Command::from_call(mode, fan, temp.map(Celsius)),
    };

    if command.is_empty() {
        return Err(RunError::EmptyCommand);
    }

    client.command(&command).await?;
    confirm(&client, timeout).await
}

async fn confirm(client: &Client, timeout: Duration) -> Result<(), RunError> {
    client.poll().await?;
    let state = client.next_status(timeout).await?;
    print_state(&state);
    Ok(())
}

fn print_state(state: &ClimateState) {
    println!("{state}");
}
