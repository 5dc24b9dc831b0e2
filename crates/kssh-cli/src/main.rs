//! kssh
//!
//! Provisions a fleet of SSH pods that all trust each other.

use clap::Parser;
use tracing::error;

use kssh_cli::Cli;
use kssh_common::telemetry::init_logging;

#[tokio::main]
async fn main() {
    if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
        eprintln!("failed to install crypto provider: {:?}", e);
        std::process::exit(1);
    }

    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.log_format.into()) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = cli.run().await {
        error!(error = %e, "kssh failed");
        std::process::exit(e.exit_code());
    }
}
