//! The slice of a Terraform plugin framework this provider relies on:
//! schemas, validators, diagnostics and the data source / resource lifecycle.

pub mod convert;
pub mod diag;
pub mod path;
pub mod schema;
pub mod validators;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

pub use diag::Diagnostics;
pub use schema::{Attribute, AttributeKind, ElementType, Schema};
pub use validators::Validator;

use crate::provider::ProviderData;

/// Outcome of a lifecycle call. A resource `read` returning no state means
/// the object is gone and should be dropped from state.
#[derive(Debug, Default)]
pub struct Response {
    pub state: Option<Value>,
    pub diagnostics: Diagnostics,
}

impl Response {
    pub fn with_state(state: Value) -> Self {
        Response {
            state: Some(state),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn from_diagnostics(diagnostics: Diagnostics) -> Self {
        Response {
            state: None,
            diagnostics,
        }
    }

    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_error(summary, detail);
        Self::from_diagnostics(diagnostics)
    }
}

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Full type name, e.g. `crds_slo_koordinator_sh_node_slo_v1alpha1`.
    fn metadata(&self, provider_type_name: &str) -> String;

    fn schema(&self) -> Schema;

    /// Receives the configured provider data. Local-only data sources ignore it.
    fn configure(&mut self, _data: Arc<ProviderData>) -> Diagnostics {
        Diagnostics::new()
    }

    async fn read(&self, config: &Value) -> Response;
}

#[async_trait]
pub trait Resource: Send + Sync {
    fn metadata(&self, provider_type_name: &str) -> String;

    fn schema(&self) -> Schema;

    fn configure(&mut self, data: Arc<ProviderData>) -> Diagnostics;

    async fn create(&self, plan: &Value) -> Response;

    async fn read(&self, state: &Value) -> Response;

    async fn update(&self, plan: &Value, prior: &Value) -> Response;

    async fn delete(&self, state: &Value) -> Diagnostics;

    /// Turn an import identifier into a minimal state that `read` can refresh.
    fn import_state(&self, id: &str) -> Response;
}
