use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use log::*;

use crate::client::KubeClient;
use crate::errors::{Error, Result};
use crate::provider::ProviderData;

/// How to reach the cluster and how long to wait on it.
#[derive(Args, Clone, Debug)]
pub(crate) struct ProviderConfig {
    /// Path to a kubeconfig file. Without it the usual loading rules apply:
    /// $KUBECONFIG, ~/.kube/config, then the in-cluster service account
    #[arg(long, global = true, env = "CRDS_KUBECONFIG")]
    pub(crate) kubeconfig: Option<PathBuf>,
    /// Kubeconfig context to use instead of the current one
    #[arg(long, global = true, env = "CRDS_KUBE_CONTEXT")]
    pub(crate) context: Option<String>,
    /// Seconds to wait for `wait_for` conditions after create and update
    #[arg(long, global = true, default_value_t = 300, env = "CRDS_WAIT_TIMEOUT")]
    pub(crate) wait_timeout: u64,
    /// Seconds between two polls while waiting
    #[arg(long, global = true, default_value_t = 2, env = "CRDS_POLL_INTERVAL")]
    pub(crate) poll_interval: u64,
}

impl ProviderConfig {
    async fn kube_config(&self) -> Result<Config> {
        let options = KubeConfigOptions {
            context: self.context.clone(),
            ..Default::default()
        };
        match (&self.kubeconfig, &self.context) {
            (Some(path), _) => {
                info!("loading kubeconfig from {}", path.display());
                let kubeconfig = Kubeconfig::read_from(path).map_err(Error::KubeconfigError)?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(Error::KubeconfigError)
            }
            (None, Some(context)) => {
                info!("using kubeconfig context {}", context);
                Config::from_kubeconfig(&options).await.map_err(Error::KubeconfigError)
            }
            (None, None) => Config::infer().await.map_err(Error::InferConfigError),
        }
    }

    pub(crate) fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout)
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    /// Build the client every data source and resource shares.
    pub(crate) async fn provider_data(&self) -> Result<ProviderData> {
        let config = self.kube_config().await?;
        debug!("talking to {}", config.cluster_url);
        let client = Client::try_from(config).map_err(Error::KubeError)?;
        Ok(ProviderData {
            client: Arc::new(KubeClient::new(client)),
            wait_timeout: self.wait_timeout(),
            poll_interval: self.poll_interval(),
        })
    }
}
