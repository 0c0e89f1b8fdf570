use std::path::PathBuf;

use clap::Args;

use super::document::{emit, load, report};
use crate::provider::Provider;

#[derive(Args)]
pub(crate) struct TypeArgs {
    /// Data source or resource type, e.g. crds_authzed_com_spice_db_cluster_v1alpha1
    pub(crate) type_name: String,
}

#[derive(Args)]
pub(crate) struct ConfigArgs {
    #[command(flatten)]
    pub(crate) target: TypeArgs,
    /// JSON or YAML file holding the configuration
    #[arg(long, short)]
    pub(crate) config: PathBuf,
}

#[derive(Args)]
pub(crate) struct ApplyArgs {
    #[command(flatten)]
    pub(crate) target: TypeArgs,
    /// JSON or YAML file holding the configuration
    #[arg(long, short)]
    pub(crate) config: PathBuf,
    /// Prior state, as printed by an earlier apply. Without it the resource is created
    #[arg(long, short)]
    pub(crate) state: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct StateArgs {
    #[command(flatten)]
    pub(crate) target: TypeArgs,
    /// Current state, as printed by apply, refresh or import
    #[arg(long, short)]
    pub(crate) state: PathBuf,
}

#[derive(Args)]
pub(crate) struct ImportArgs {
    #[command(flatten)]
    pub(crate) target: TypeArgs,
    /// `name` for cluster scoped kinds, `namespace/name` otherwise
    pub(crate) id: String,
}

pub(crate) async fn read(provider: &Provider, args: &ConfigArgs) -> anyhow::Result<bool> {
    let config = load(&args.config)?;
    emit(&provider.read_data_source(&args.target.type_name, &config).await)
}

pub(crate) async fn apply(provider: &Provider, args: &ApplyArgs) -> anyhow::Result<bool> {
    let config = load(&args.config)?;
    let prior = args.state.as_deref().map(load).transpose()?;
    emit(&provider.apply_resource(&args.target.type_name, &config, prior.as_ref()).await)
}

pub(crate) async fn refresh(provider: &Provider, args: &StateArgs) -> anyhow::Result<bool> {
    let state = load(&args.state)?;
    emit(&provider.refresh_resource(&args.target.type_name, &state).await)
}

pub(crate) async fn destroy(provider: &Provider, args: &StateArgs) -> anyhow::Result<bool> {
    let state = load(&args.state)?;
    Ok(report(&provider.destroy_resource(&args.target.type_name, &state).await))
}

pub(crate) async fn import(provider: &Provider, args: &ImportArgs) -> anyhow::Result<bool> {
    emit(&provider.import_resource(&args.target.type_name, &args.id).await)
}
