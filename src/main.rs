use std::{io, path::PathBuf};

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use batsim::{
    battery::Battery,
    bus::{spawn_thread, Bus, BusHandle},
    config::Settings,
    driver::BatteryDriver,
    script,
    sink::TracingSink,
};

#[derive(Parser)]
#[command(author, version, about = "Battery management unit simulator", long_about = None)]
struct Cli {
    /// Batteries config file (json)
    #[arg(short, long, default_value = "batteries.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, Default)]
enum Command {
    /// Serves the configured batteries until interrupted.
    #[default]
    Run,
    /// Reads everything each configured battery reports, then exits.
    Probe,
    /// Runs bus transactions read line by line from stdin.
    Script,
}

fn init_tracing(level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(&cli.config)
        .with_context(|| format!("failed to load batteries config {:?}", cli.config))?;

    init_tracing(settings.log_level);
    info!("loaded batteries config {:?}", cli.config);
    info!(
        uri = %settings.bus.uri,
        node = %settings.bus.node,
        "using bus {:?}",
        settings.bus.i2c_bus
    );

    let mut bus = Bus::new(settings.bus.i2c_bus.clone());
    for bat in &settings.batteries {
        info!(
            "creating battery #{} sim (bus={}, addr={:#04x})",
            bat.id, settings.bus.i2c_bus, bat.address
        );

        bus.attach(
            bat.address,
            Battery::new(bat.id, TracingSink::new(bat.id, bat.address)),
        )
        .with_context(|| format!("failed to attach battery #{}", bat.id))?;
    }

    let (txn_tx, txn_rx) = flume::bounded(256);
    let bus_join = spawn_thread(bus, txn_rx);
    let handle = BusHandle::new(txn_tx);

    match cli.command.unwrap_or_default() {
        Command::Run => serve(handle)?,
        Command::Probe => probe(handle, &settings)?,
        Command::Script => {
            script::run(&handle, io::stdin().lock(), io::stdout().lock())?;
            drop(handle);
        }
    }

    bus_join
        .join()
        .map_err(|_| anyhow!("bus thread panicked"))??;

    info!("exit");

    Ok(())
}

/// Holds the bus open until ctrl+c or SIGTERM.
fn serve(handle: BusHandle) -> anyhow::Result<()> {
    let (quit_tx, quit_rx) = flume::bounded(1);

    ctrlc::set_handler(move || {
        info!("received ctrl+c, exiting");
        let _ = quit_tx.try_send(());
    })?;

    let _ = quit_rx.recv();
    drop(handle);

    Ok(())
}

fn probe(handle: BusHandle, settings: &Settings) -> anyhow::Result<()> {
    for bat in &settings.batteries {
        let mut driver = BatteryDriver::new(handle.clone(), bat.address);
        let survey = driver
            .survey()
            .with_context(|| format!("failed to probe battery #{}", bat.id))?;

        print!("{survey}");
    }

    Ok(())
}
