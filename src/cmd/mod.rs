use clap::{command, Parser, Subcommand};

use self::lifecycle::{ApplyArgs, ConfigArgs, ImportArgs, StateArgs};
use self::manifests::ManifestArgs;
use self::schema::SchemaArgs;
use crate::config::ProviderConfig;

pub(crate) mod document;
pub(crate) mod lifecycle;
pub(crate) mod manifests;
pub(crate) mod schema;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) provider: ProviderConfig,
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Print data source and resource schemas as JSON
    Schema(SchemaArgs),
    /// Check every schema for definition mistakes
    Validate,
    /// Render a manifest data source to YAML, without contacting the cluster
    Manifest(ManifestArgs),
    /// Read a data source from the cluster
    Read(ConfigArgs),
    /// Create or update a resource, replacing it when its identity changed
    Apply(ApplyArgs),
    /// Refresh resource state from the cluster
    Refresh(StateArgs),
    /// Delete a resource
    Destroy(StateArgs),
    /// Import an existing object by its id
    Import(ImportArgs),
}

impl Commands {
    /// Commands that never talk to the cluster run without a client.
    pub(crate) fn needs_cluster(&self) -> bool {
        !matches!(self, Commands::Schema(_) | Commands::Validate | Commands::Manifest(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lifecycle_commands() {
        let cli = Cli::parse_from([
            "terraform-provider-crds",
            "--wait-timeout",
            "10",
            "apply",
            "crds_authzed_com_spice_db_cluster_v1alpha1",
            "--config",
            "cluster.yaml",
            "--state",
            "state.json",
        ]);
        assert_eq!(cli.provider.wait_timeout, 10);
        match cli.command {
            Commands::Apply(args) => {
                assert_eq!(args.target.type_name, "crds_authzed_com_spice_db_cluster_v1alpha1");
                assert_eq!(args.state.unwrap().to_str(), Some("state.json"));
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn local_commands_skip_the_cluster() {
        let cli = Cli::parse_from(["terraform-provider-crds", "validate"]);
        assert!(!cli.command.needs_cluster());
        let cli = Cli::parse_from(["terraform-provider-crds", "import", "crds_x", "node-a"]);
        assert!(cli.command.needs_cluster());
    }
}
