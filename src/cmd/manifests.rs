use std::path::PathBuf;

use clap::Args;
use serde_json::Value;

use super::document::{load, report};
use crate::provider::Provider;

#[derive(Args)]
pub(crate) struct ManifestArgs {
    /// Manifest data source type, e.g. crds_slo_koordinator_sh_node_slo_v1alpha1_manifest
    pub(crate) type_name: String,
    /// JSON or YAML file holding the data source configuration
    #[arg(long, short)]
    pub(crate) config: PathBuf,
}

/// Print the rendered YAML rather than the whole state.
pub(crate) async fn run(provider: &Provider, args: &ManifestArgs) -> anyhow::Result<bool> {
    let config = load(&args.config)?;
    let response = provider.read_data_source(&args.type_name, &config).await;
    let ok = report(&response.diagnostics);
    if let Some(yaml) = response.state.as_ref().and_then(|s| s.get("yaml")).and_then(Value::as_str) {
        print!("{}", yaml);
    }
    Ok(ok)
}
