use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("SerializationError: {0}")]
    SerializationError(#[source] serde_json::Error),

    #[error("YamlError: {0}")]
    YamlError(#[source] serde_yaml::Error),

    #[error("Kube Error: {0}")]
    KubeError(#[source] kube::Error),

    #[error("Kubeconfig Error: {0}")]
    KubeconfigError(#[source] kube::config::KubeconfigError),

    #[error("Kube Config Error: {0}")]
    InferConfigError(#[source] kube::config::InferConfigError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("JsonPathError: {0}")]
    JsonPathError(String),

    #[error("timed out after {0:?} waiting for {1}")]
    WaitTimeout(Duration, String),

    #[error("expected import identifier with format: '{expected}'. Got: '{id}'")]
    InvalidImportId { expected: &'static str, id: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
