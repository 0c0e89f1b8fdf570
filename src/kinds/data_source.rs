use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use kube::Resource;
use log::*;
use serde_json::Value;

use super::{id_attribute, metadata_attribute, object_id, object_ref, spec_attribute, CrdKind, MetadataMode};
use crate::framework::convert::object_to_state;
use crate::framework::{DataSource, Diagnostics, Response, Schema};
use crate::helpers::manifests::normalize;
use crate::provider::ProviderData;

/// Reads an existing object of kind `K` from the cluster.
pub struct CrdDataSource<K> {
    data: Option<Arc<ProviderData>>,
    kind: PhantomData<fn() -> K>,
}

impl<K: CrdKind> CrdDataSource<K> {
    pub fn new() -> Self {
        CrdDataSource {
            data: None,
            kind: PhantomData,
        }
    }
}

impl<K: CrdKind> Default for CrdDataSource<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K: CrdKind> DataSource for CrdDataSource<K> {
    fn metadata(&self, provider_type_name: &str) -> String {
        format!("{}_{}", provider_type_name, K::TYPE_NAME)
    }

    fn schema(&self) -> Schema {
        Schema::new(
            K::DESCRIPTION,
            vec![
                id_attribute(),
                metadata_attribute(K::NAMESPACED, MetadataMode::DataSource),
                spec_attribute::<K>().into_computed(),
            ],
        )
    }

    fn configure(&mut self, data: Arc<ProviderData>) -> Diagnostics {
        self.data = Some(data);
        Diagnostics::new()
    }

    async fn read(&self, config: &Value) -> Response {
        let data = match &self.data {
            Some(data) => data,
            None => {
                return Response::error(
                    "Unconfigured provider",
                    "Expected a configured Kubernetes client. Please report this issue to the provider developers.",
                )
            }
        };
        let target = match object_ref::<K>(config) {
            Ok(target) => target,
            Err(diags) => return Response::from_diagnostics(diags),
        };

        let object = match data.client.get(&target).await {
            Ok(object) => object,
            Err(err) if err.is_not_found() => {
                return Response::error(
                    "Unable to find object",
                    format!(
                        "The requested {} does not exist in the cluster.\n\n{}",
                        K::kind(&()),
                        err
                    ),
                )
            }
            Err(err) => {
                error!("{}", err);
                return Response::error(
                    "Unable to GET resource",
                    format!("An unexpected error occurred while reading the resource.\n\nGET Error: {err}"),
                );
            }
        };

        let normalized = match normalize::<K>(&object) {
            Ok(normalized) => normalized,
            Err(err) => {
                return Response::error(
                    "Unable to unmarshal resource",
                    format!("An unexpected error occurred while parsing the resource read response.\n\nUnmarshal Error: {err}"),
                )
            }
        };

        let schema = self.schema();
        let mut state = object_to_state(&schema.attributes, &normalized);
        state["id"] = Value::String(object_id(target.namespace.as_deref(), &target.name));
        Response::with_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::v1alpha1::nodemetric_api::NodeMetric;
    use crate::api::v1alpha1::spicedbcluster_api::SpiceDBCluster;
    use crate::client::fake::FakeClient;
    use serde_json::json;

    fn configured<K: CrdKind>(client: Arc<FakeClient>) -> CrdDataSource<K> {
        let mut ds = CrdDataSource::<K>::new();
        ds.configure(ProviderData::for_tests(client));
        ds
    }

    #[test]
    fn schema_is_valid_and_read_only() {
        let ds = CrdDataSource::<NodeMetric>::new();
        assert_eq!(ds.metadata("crds"), "crds_slo_koordinator_sh_node_metric_v1alpha1");
        let schema = ds.schema();
        assert!(schema.validate_implementation().is_empty());
        assert!(schema.attribute("spec").unwrap().is_read_only());
    }

    #[tokio::test]
    async fn reads_object_into_state() {
        let client = Arc::new(FakeClient::new());
        let config = json!({"metadata": {"name": "dev", "namespace": "authz"}});
        let target = object_ref::<SpiceDBCluster>(&config).unwrap();
        client.insert(
            &target,
            json!({
                "apiVersion": "authzed.com/v1alpha1",
                "kind": "SpiceDBCluster",
                "metadata": {"name": "dev", "namespace": "authz", "labels": {"team": "iam"}, "uid": "123"},
                "spec": {"version": "v1.29.0", "secretName": "dev-spicedb", "config": {"replicas": 2}},
                "status": {"phase": "Running"}
            }),
        );

        let response = configured::<SpiceDBCluster>(client).read(&config).await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state = response.state.unwrap();
        assert_eq!(state["id"], "authz/dev");
        assert_eq!(state["metadata"]["labels"]["team"], "iam");
        assert_eq!(state["metadata"]["annotations"], Value::Null);
        assert_eq!(state["spec"]["secret_name"], "dev-spicedb");
        assert_eq!(state["spec"]["config"]["replicas"], 2);
        assert_eq!(state["spec"]["patches"], Value::Null);
    }

    #[tokio::test]
    async fn missing_object_is_a_diagnostic() {
        let client = Arc::new(FakeClient::new());
        let response = configured::<NodeMetric>(client)
            .read(&json!({"metadata": {"name": "node-a"}}))
            .await;
        assert!(response.state.is_none());
        let diag = response.diagnostics.iter().next().unwrap();
        assert_eq!(diag.summary, "Unable to find object");
    }

    #[tokio::test]
    async fn api_errors_are_diagnostics() {
        let client = Arc::new(FakeClient::forbidden());
        let response = configured::<NodeMetric>(client)
            .read(&json!({"metadata": {"name": "node-a"}}))
            .await;
        let diag = response.diagnostics.iter().next().unwrap();
        assert_eq!(diag.summary, "Unable to GET resource");
        assert!(diag.detail.contains("forbidden"));
    }

    #[tokio::test]
    async fn undecodable_objects_are_diagnostics() {
        let client = Arc::new(FakeClient::new());
        let config = json!({"metadata": {"name": "node-a"}});
        client.insert(
            &object_ref::<NodeMetric>(&config).unwrap(),
            json!({
                "metadata": {"name": "node-a"},
                "spec": {"metricCollectPolicy": {"reportIntervalSeconds": "often"}}
            }),
        );
        let response = configured::<NodeMetric>(client).read(&config).await;
        let diag = response.diagnostics.iter().next().unwrap();
        assert_eq!(diag.summary, "Unable to unmarshal resource");
    }

    #[tokio::test]
    async fn unconfigured_read_fails() {
        let response = CrdDataSource::<NodeMetric>::new()
            .read(&json!({"metadata": {"name": "node-a"}}))
            .await;
        assert!(response.diagnostics.has_error());
    }
}
