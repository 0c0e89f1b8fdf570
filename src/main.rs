use std::process::exit;

use clap::Parser;
use cmd::{Cli, Commands};
use log::*;
use provider::Provider;
mod api;
mod client;
mod cmd;
mod config;
mod errors;
mod framework;
mod helpers;
mod kinds;
mod provider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut provider = Provider::new();
    if cli.command.needs_cluster() {
        match cli.provider.provider_data().await {
            Ok(data) => provider.configure(data),
            Err(err) => {
                error!("{}", err);
                exit(1)
            }
        }
    }

    let ok = match &cli.command {
        Commands::Schema(args) => cmd::schema::run(&provider, args)?,
        Commands::Validate => cmd::schema::validate(&provider)?,
        Commands::Manifest(args) => cmd::manifests::run(&provider, args).await?,
        Commands::Read(args) => cmd::lifecycle::read(&provider, args).await?,
        Commands::Apply(args) => cmd::lifecycle::apply(&provider, args).await?,
        Commands::Refresh(args) => cmd::lifecycle::refresh(&provider, args).await?,
        Commands::Destroy(args) => cmd::lifecycle::destroy(&provider, args).await?,
        Commands::Import(args) => cmd::lifecycle::import(&provider, args).await?,
    };
    if !ok {
        exit(1)
    }

    Ok(())
}
