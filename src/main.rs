use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use htcpcp_pot::cli::Cli;
use htcpcp_pot::config::{default_config_path, FileSettingsSource, PotConfig};
use htcpcp_pot::external::CommandActionRunner;
use htcpcp_pot::http::{serve, Dispatcher};
use htcpcp_pot::pot::Pot;
use htcpcp_pot::shutdown::{finish_shutdown, shutdown_signal};
use htcpcp_pot::telemetry::{init_telemetry, shutdown_telemetry};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };

    // First run: write a default configuration for the operator to edit
    if !config_path.exists() {
        PotConfig::default().save_to_file(&config_path)?;
        println!("Created a new configuration file at {}", config_path.display());
        return Ok(());
    }

    PotConfig::load_env_file()?;
    let config = PotConfig::load(&config_path)?;
    init_telemetry(&config.observability)?;
    tracing::info!(path = %config_path.display(), "Configuration loaded successfully");

    let runner = Arc::new(CommandActionRunner::new(Duration::from_secs(
        config.action_timeout_sec,
    )));
    let pot = Pot::new(config.pot_settings(), runner);

    let mut dispatcher = Dispatcher::new(pot.clone());
    if config.reload_on_request && !cli.no_reload {
        dispatcher = dispatcher.with_settings_source(Arc::new(FileSettingsSource::new(&config_path)));
    }

    let addr = SocketAddr::new(cli.bind, cli.port);
    tokio::runtime::Runtime::new()?.block_on(async {
        serve(addr, dispatcher, shutdown_signal()).await
    })?;

    finish_shutdown(pot.metrics());
    shutdown_telemetry();
    Ok(())
}
