use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;

use super::{id_attribute, metadata_attribute, object_id, spec_attribute, CrdKind, MetadataMode};
use crate::framework::convert::{object_to_state, state_to_object};
use crate::framework::{Attribute, DataSource, Response, Schema};
use crate::helpers::manifests::{normalize, to_yaml, with_type_meta};

/// Renders the YAML of an object of kind `K` without talking to the cluster.
pub struct CrdManifest<K> {
    kind: PhantomData<fn() -> K>,
}

impl<K: CrdKind> CrdManifest<K> {
    pub fn new() -> Self {
        CrdManifest { kind: PhantomData }
    }
}

impl<K: CrdKind> Default for CrdManifest<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K: CrdKind> DataSource for CrdManifest<K> {
    fn metadata(&self, provider_type_name: &str) -> String {
        format!("{}_{}_manifest", provider_type_name, K::TYPE_NAME)
    }

    fn schema(&self) -> Schema {
        Schema::new(
            K::DESCRIPTION,
            vec![
                id_attribute(),
                Attribute::string("yaml")
                    .local()
                    .computed()
                    .describe("The generated manifest in YAML format."),
                metadata_attribute(K::NAMESPACED, MetadataMode::Manifest),
                spec_attribute::<K>(),
            ],
        )
    }

    async fn read(&self, config: &Value) -> Response {
        let schema = self.schema();
        let object = with_type_meta::<K>(state_to_object(&schema.attributes, config));
        let normalized = match normalize::<K>(&object) {
            Ok(normalized) => normalized,
            Err(err) => {
                return Response::error(
                    "Unable to marshal resource",
                    format!("An unexpected error occurred while marshalling the manifest.\n\nMarshal Error: {err}"),
                )
            }
        };
        let yaml = match to_yaml(&normalized) {
            Ok(yaml) => yaml,
            Err(err) => {
                return Response::error(
                    "Unable to marshal resource",
                    format!("An unexpected error occurred while rendering the manifest as YAML.\n\nMarshal Error: {err}"),
                )
            }
        };

        let mut state = object_to_state(&schema.attributes, &normalized);
        let metadata = &normalized["metadata"];
        state["id"] = Value::String(object_id(
            metadata["namespace"].as_str(),
            metadata["name"].as_str().unwrap_or_default(),
        ));
        state["yaml"] = Value::String(yaml);
        Response::with_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::v1alpha1::nodeslo_api::NodeSLO;
    use crate::api::v1alpha1::spicedbcluster_api::SpiceDBCluster;
    use serde_json::json;

    #[test]
    fn type_name_has_manifest_suffix() {
        let manifest = CrdManifest::<NodeSLO>::new();
        assert_eq!(manifest.metadata("crds"), "crds_slo_koordinator_sh_node_slo_v1alpha1_manifest");
        assert!(manifest.schema().validate_implementation().is_empty());
    }

    #[tokio::test]
    async fn renders_yaml_locally() {
        let config = json!({
            "metadata": {"name": "node-a", "labels": {"pool": "batch"}},
            "spec": {
                "cpu_burst_strategy": {"policy": "auto", "cpu_burst_percent": 1000},
                "resource_qos_strategy": {"be_class": {"cpu_qos": {"enable": true, "group_identity": -1}}}
            }
        });
        let response = CrdManifest::<NodeSLO>::new().read(&config).await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);

        let state = response.state.unwrap();
        assert_eq!(state["id"], "node-a");
        assert_eq!(state["spec"]["cpu_burst_strategy"]["policy"], "auto");
        let yaml = state["yaml"].as_str().unwrap();
        assert_eq!(
            yaml,
            "apiVersion: slo.koordinator.sh/v1alpha1\n\
             kind: NodeSLO\n\
             metadata:\n  labels:\n    pool: batch\n  name: node-a\n\
             spec:\n  \
               resourceQOSStrategy:\n    beClass:\n      cpuQOS:\n        enable: true\n        groupIdentity: -1\n  \
               cpuBurstStrategy:\n    policy: auto\n    cpuBurstPercent: 1000\n"
        );
    }

    #[tokio::test]
    async fn namespaced_id() {
        let config = json!({
            "metadata": {"name": "dev", "namespace": "authz"},
            "spec": {"channel": "stable", "patches": [{"kind": "Deployment", "patch": {"spec": {"replicas": 3}}}]}
        });
        let response = CrdManifest::<SpiceDBCluster>::new().read(&config).await;
        let state = response.state.unwrap();
        assert_eq!(state["id"], "authz/dev");
        assert!(state["yaml"].as_str().unwrap().contains("namespace: authz"));
        assert_eq!(state["spec"]["patches"][0]["kind"], "Deployment");
    }
}
