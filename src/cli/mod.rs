use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "htcpcp-server")]
#[command(version)]
#[command(about = "HTCPCP coffee pot server")]
#[command(long_about = "Serves a coffee pot over the Hyper Text Coffee Pot Control Protocol. \
                       BREW (or POST) starts a brew, WHEN stops the pour, GET reports the pot's \
                       status and PROPFIND the kind of coffee being made.")]
pub struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = 80, help = "Set server port")]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0", help = "Address to bind the server to")]
    pub bind: IpAddr,

    /// Configuration file path
    #[arg(long, help = "Configuration file (default: htcpcp.toml next to the executable)")]
    pub config: Option<PathBuf>,

    /// Disable per-request configuration reloading
    #[arg(long, help = "Read the configuration only once at startup")]
    pub no_reload: bool,
}
