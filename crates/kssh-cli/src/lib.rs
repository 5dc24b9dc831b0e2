//! kssh CLI library

pub mod commands;
pub mod error;

pub use error::{Error, Result};

use clap::{Parser, Subcommand, ValueEnum};
use kssh_common::telemetry::LogFormat;

/// kssh - provision a fleet of mutually trusted SSH pods
#[derive(Parser, Debug)]
#[command(name = "kssh")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log output format
    #[arg(
        long,
        global = true,
        value_enum,
        env = "KSSH_LOG_FORMAT",
        default_value = "text"
    )]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate keys, render the fleet and create whatever is missing
    Deploy(commands::deploy::DeployArgs),
    /// Print the objects a deploy would apply, without contacting a cluster
    Render(commands::render::RenderArgs),
}

/// Log format as accepted on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Deploy(args) => commands::deploy::run(args).await,
            Commands::Render(args) => commands::render::run(args),
        }
    }
}
