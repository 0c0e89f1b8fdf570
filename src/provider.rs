//! The provider: a registry of every data source and resource, plus the host
//! operations that validate configuration before handing it to them.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use log::*;
use serde::Serialize;
use serde_json::Value;

use crate::api::v1alpha1::nodemetric_api::NodeMetric;
use crate::api::v1alpha1::nodeslo_api::NodeSLO;
use crate::api::v1alpha1::spicedbcluster_api::SpiceDBCluster;
use crate::client::ObjectClient;
use crate::framework::convert::validate_config;
use crate::framework::{DataSource, Diagnostics, Resource, Response, Schema};
use crate::kinds::{CrdDataSource, CrdKind, CrdManifest, CrdResource};

pub const TYPE_NAME: &str = "crds";

/// Everything a configured data source or resource needs.
pub struct ProviderData {
    pub client: Arc<dyn ObjectClient>,
    /// Upper bound for `wait_for` after create and update.
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
}

#[cfg(test)]
impl ProviderData {
    pub fn for_tests(client: Arc<crate::client::fake::FakeClient>) -> Arc<ProviderData> {
        Arc::new(ProviderData {
            client,
            wait_timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(5),
        })
    }
}

type DataSourceFactory = fn() -> Box<dyn DataSource>;
type ResourceFactory = fn() -> Box<dyn Resource>;

fn manifest<K: CrdKind>() -> Box<dyn DataSource> {
    Box::new(CrdManifest::<K>::new())
}

fn data_source<K: CrdKind>() -> Box<dyn DataSource> {
    Box::new(CrdDataSource::<K>::new())
}

fn resource<K: CrdKind>() -> Box<dyn Resource> {
    Box::new(CrdResource::<K>::new())
}

fn data_source_factories() -> Vec<DataSourceFactory> {
    vec![
        manifest::<NodeSLO>,
        data_source::<NodeSLO>,
        manifest::<NodeMetric>,
        data_source::<NodeMetric>,
        manifest::<SpiceDBCluster>,
        data_source::<SpiceDBCluster>,
    ]
}

fn resource_factories() -> Vec<ResourceFactory> {
    vec![resource::<NodeSLO>, resource::<NodeMetric>, resource::<SpiceDBCluster>]
}

#[derive(Debug, Serialize)]
pub struct ProviderSchemas {
    pub data_source_schemas: BTreeMap<String, Schema>,
    pub resource_schemas: BTreeMap<String, Schema>,
}

#[derive(Default)]
pub struct Provider {
    data: Option<Arc<ProviderData>>,
}

impl Provider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configure(&mut self, data: ProviderData) {
        self.data = Some(Arc::new(data));
    }

    pub fn data_source_types(&self) -> Vec<String> {
        data_source_factories()
            .into_iter()
            .map(|factory| factory().metadata(TYPE_NAME))
            .collect()
    }

    pub fn resource_types(&self) -> Vec<String> {
        resource_factories()
            .into_iter()
            .map(|factory| factory().metadata(TYPE_NAME))
            .collect()
    }

    fn data_source(&self, type_name: &str) -> Result<Box<dyn DataSource>, Diagnostics> {
        let mut found = data_source_factories()
            .into_iter()
            .map(|factory| factory())
            .find(|ds| ds.metadata(TYPE_NAME) == type_name)
            .ok_or_else(|| unknown_type("data source", type_name))?;
        if let Some(data) = &self.data {
            let diags = found.configure(data.clone());
            if diags.has_error() {
                return Err(diags);
            }
        }
        Ok(found)
    }

    fn resource(&self, type_name: &str) -> Result<Box<dyn Resource>, Diagnostics> {
        let mut found = resource_factories()
            .into_iter()
            .map(|factory| factory())
            .find(|r| r.metadata(TYPE_NAME) == type_name)
            .ok_or_else(|| unknown_type("resource", type_name))?;
        if let Some(data) = &self.data {
            let diags = found.configure(data.clone());
            if diags.has_error() {
                return Err(diags);
            }
        }
        Ok(found)
    }

    pub fn schemas(&self) -> ProviderSchemas {
        ProviderSchemas {
            data_source_schemas: data_source_factories()
                .into_iter()
                .map(|factory| {
                    let ds = factory();
                    (ds.metadata(TYPE_NAME), ds.schema())
                })
                .collect(),
            resource_schemas: resource_factories()
                .into_iter()
                .map(|factory| {
                    let r = factory();
                    (r.metadata(TYPE_NAME), r.schema())
                })
                .collect(),
        }
    }

    /// Run `validate_implementation` on every registered schema.
    pub fn validate_schemas(&self) -> Diagnostics {
        let schemas = self.schemas();
        let all = schemas
            .data_source_schemas
            .iter()
            .chain(schemas.resource_schemas.iter());
        let mut diags = Diagnostics::new();
        for (type_name, schema) in all {
            for diag in schema.validate_implementation() {
                let detail = format!("{}: {}", type_name, diag.detail);
                match diag.path {
                    Some(path) => diags.add_attribute_error(path, diag.summary, detail),
                    None => diags.add_error(diag.summary, detail),
                }
            }
        }
        diags
    }

    pub async fn read_data_source(&self, type_name: &str, config: &Value) -> Response {
        let ds = match self.data_source(type_name) {
            Ok(ds) => ds,
            Err(diags) => return Response::from_diagnostics(diags),
        };
        if let Err(diags) = validate(&ds.schema(), config) {
            return Response::from_diagnostics(diags);
        }
        info!("reading data source {}", type_name);
        ds.read(config).await
    }

    /// Create when there is no prior state, replace when an attribute that
    /// requires replacement changed, update otherwise.
    pub async fn apply_resource(&self, type_name: &str, config: &Value, prior: Option<&Value>) -> Response {
        let resource = match self.resource(type_name) {
            Ok(resource) => resource,
            Err(diags) => return Response::from_diagnostics(diags),
        };
        let schema = resource.schema();
        if let Err(diags) = validate(&schema, config) {
            return Response {
                state: prior.cloned(),
                diagnostics: diags,
            };
        }

        match prior {
            None => {
                info!("creating {}", type_name);
                resource.create(config).await
            }
            Some(prior) if schema.requires_replacement(prior, config) => {
                info!("replacing {}", type_name);
                let diags = resource.delete(prior).await;
                if diags.has_error() {
                    return Response {
                        state: Some(prior.clone()),
                        diagnostics: diags,
                    };
                }
                let mut response = resource.create(config).await;
                let mut all = diags;
                all.extend(response.diagnostics);
                response.diagnostics = all;
                response
            }
            Some(prior) => {
                info!("updating {}", type_name);
                keep_on_error(resource.update(config, prior).await, prior)
            }
        }
    }

    pub async fn refresh_resource(&self, type_name: &str, state: &Value) -> Response {
        match self.resource(type_name) {
            Ok(resource) => keep_on_error(resource.read(state).await, state),
            Err(diags) => Response::from_diagnostics(diags),
        }
    }

    pub async fn destroy_resource(&self, type_name: &str, state: &Value) -> Diagnostics {
        match self.resource(type_name) {
            Ok(resource) => {
                info!("destroying {}", type_name);
                resource.delete(state).await
            }
            Err(diags) => diags,
        }
    }

    /// Import an existing object and read it in full.
    pub async fn import_resource(&self, type_name: &str, id: &str) -> Response {
        let resource = match self.resource(type_name) {
            Ok(resource) => resource,
            Err(diags) => return Response::from_diagnostics(diags),
        };
        let imported = resource.import_state(id);
        let state = match imported.state {
            Some(state) if !imported.diagnostics.has_error() => state,
            _ => return imported,
        };
        let mut response = resource.read(&state).await;
        if response.state.is_none() && !response.diagnostics.has_error() {
            response.diagnostics.add_error(
                "Cannot import non-existent remote object",
                format!(
                    "While attempting to import an existing object to {:?}, the provider detected that no object exists with the given id. Only pre-existing objects can be imported; check that the id is correct.",
                    type_name
                ),
            );
        }
        response
    }
}

fn unknown_type(what: &str, type_name: &str) -> Diagnostics {
    let mut diags = Diagnostics::new();
    diags.add_error(
        format!("Invalid {} type", what),
        format!("The provider {:?} does not support {} type {:?}.", TYPE_NAME, what, type_name),
    );
    diags
}

/// A failed call that produced no state leaves the prior state in place.
fn keep_on_error(mut response: Response, prior: &Value) -> Response {
    if response.state.is_none() && response.diagnostics.has_error() {
        response.state = Some(prior.clone());
    }
    response
}

fn validate(schema: &Schema, config: &Value) -> Result<(), Diagnostics> {
    let mut diags = Diagnostics::new();
    validate_config(&schema.attributes, config, &mut diags);
    if diags.has_error() {
        Err(diags)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeClient;
    use serde_json::json;

    fn configured(client: Arc<FakeClient>) -> Provider {
        let data = ProviderData::for_tests(client);
        Provider {
            data: Some(data),
        }
    }

    fn assert_valid_schema(schema: Option<&Schema>) {
        let diags = schema.expect("registered").validate_implementation();
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn slo_koordinator_sh_node_metric_v1alpha1_resource_validate_schema() {
        let schemas = Provider::new().schemas();
        assert_valid_schema(schemas.resource_schemas.get("crds_slo_koordinator_sh_node_metric_v1alpha1"));
    }

    #[test]
    fn slo_koordinator_sh_node_slo_v1alpha1_resource_validate_schema() {
        let schemas = Provider::new().schemas();
        assert_valid_schema(schemas.resource_schemas.get("crds_slo_koordinator_sh_node_slo_v1alpha1"));
    }

    #[test]
    fn authzed_com_spice_db_cluster_v1alpha1_resource_validate_schema() {
        let schemas = Provider::new().schemas();
        assert_valid_schema(schemas.resource_schemas.get("crds_authzed_com_spice_db_cluster_v1alpha1"));
    }

    #[test]
    fn every_registered_schema_is_valid() {
        let provider = Provider::new();
        let diags = provider.validate_schemas();
        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(provider.data_source_types().len(), 6);
        assert_eq!(provider.resource_types().len(), 3);
        assert!(provider
            .data_source_types()
            .contains(&"crds_authzed_com_spice_db_cluster_v1alpha1_manifest".to_string()));
    }

    #[tokio::test]
    async fn unknown_types_are_diagnostics() {
        let response = Provider::new().read_data_source("crds_nope", &json!({})).await;
        assert_eq!(response.diagnostics.iter().next().unwrap().summary, "Invalid data source type");
    }

    #[tokio::test]
    async fn manifests_work_without_a_cluster() {
        let response = Provider::new()
            .read_data_source(
                "crds_slo_koordinator_sh_node_metric_v1alpha1_manifest",
                &json!({"metadata": {"name": "node-a"}}),
            )
            .await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert!(response.state.unwrap()["yaml"].as_str().unwrap().contains("kind: NodeMetric"));
    }

    #[tokio::test]
    async fn invalid_config_never_reaches_the_cluster() {
        let client = Arc::new(FakeClient::new());
        let provider = configured(client.clone());
        let response = provider
            .apply_resource(
                "crds_slo_koordinator_sh_node_slo_v1alpha1",
                &json!({
                    "metadata": {"name": "node-a"},
                    "spec": {"cpu_burst_strategy": {"cfs_quota_burst_percent": 50}}
                }),
                None,
            )
            .await;
        assert!(response.state.is_none());
        assert_eq!(response.diagnostics.iter().next().unwrap().summary, "Invalid Attribute Value");
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn renaming_replaces_the_object() {
        let client = Arc::new(FakeClient::new());
        let provider = configured(client.clone());
        let type_name = "crds_authzed_com_spice_db_cluster_v1alpha1";

        let created = provider
            .apply_resource(type_name, &json!({"metadata": {"name": "dev", "namespace": "authz"}}), None)
            .await
            .state
            .unwrap();

        let relabeled = json!({"metadata": {"name": "dev", "namespace": "authz", "labels": {"a": "b"}}});
        let updated = provider.apply_resource(type_name, &relabeled, Some(&created)).await;
        assert!(updated.diagnostics.is_empty(), "{:?}", updated.diagnostics);

        let moved = json!({"metadata": {"name": "dev", "namespace": "staging"}});
        let replaced = provider
            .apply_resource(type_name, &moved, updated.state.as_ref())
            .await;
        assert_eq!(replaced.state.unwrap()["id"], "staging/dev");
        assert_eq!(
            client.calls(),
            vec![
                "apply SpiceDBCluster authz/dev manager=terraform-provider-crds force=false",
                "apply SpiceDBCluster authz/dev manager=terraform-provider-crds force=false",
                "delete SpiceDBCluster authz/dev propagation=None",
                "apply SpiceDBCluster staging/dev manager=terraform-provider-crds force=false",
            ]
        );
    }

    #[tokio::test]
    async fn failed_update_and_refresh_keep_prior_state() {
        let type_name = "crds_authzed_com_spice_db_cluster_v1alpha1";
        let config = json!({"metadata": {"name": "dev", "namespace": "authz"}});
        let created = configured(Arc::new(FakeClient::new()))
            .apply_resource(type_name, &config, None)
            .await
            .state
            .unwrap();

        let broken = configured(Arc::new(FakeClient::forbidden()));
        let relabeled = json!({"metadata": {"name": "dev", "namespace": "authz", "labels": {"a": "b"}}});
        let updated = broken.apply_resource(type_name, &relabeled, Some(&created)).await;
        assert_eq!(updated.diagnostics.iter().next().unwrap().summary, "Unable to PATCH resource");
        assert_eq!(updated.state.as_ref(), Some(&created));

        let refreshed = broken.refresh_resource(type_name, &created).await;
        assert_eq!(refreshed.diagnostics.iter().next().unwrap().summary, "Unable to GET resource");
        assert_eq!(refreshed.state.as_ref(), Some(&created));
    }

    #[tokio::test]
    async fn malformed_wait_paths_are_rejected_before_any_call() {
        let client = Arc::new(FakeClient::new());
        let response = configured(client.clone())
            .apply_resource(
                "crds_slo_koordinator_sh_node_metric_v1alpha1",
                &json!({"metadata": {"name": "node-a"}, "wait_for": [{"jsonpath": "$.status[?(@.type =="}]}),
                None,
            )
            .await;
        let diag = response.diagnostics.iter().next().unwrap();
        assert_eq!(diag.summary, "Invalid Attribute Value");
        assert_eq!(diag.path.as_ref().unwrap().to_string(), "wait_for[0].jsonpath");
        assert!(response.state.is_none());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn import_reads_the_object() {
        let client = Arc::new(FakeClient::new());
        let provider = configured(client.clone());
        let type_name = "crds_slo_koordinator_sh_node_slo_v1alpha1";

        let missing = provider.import_resource(type_name, "node-a").await;
        assert_eq!(
            missing.diagnostics.iter().next().unwrap().summary,
            "Cannot import non-existent remote object"
        );

        provider
            .apply_resource(
                type_name,
                &json!({"metadata": {"name": "node-a"}, "spec": {"system_strategy": {"watermark_scale_factor": 150}}}),
                None,
            )
            .await;
        let imported = provider.import_resource(type_name, "node-a").await;
        let state = imported.state.unwrap();
        assert_eq!(state["id"], "node-a");
        assert_eq!(state["spec"]["system_strategy"]["watermark_scale_factor"], 150);
    }

    #[tokio::test]
    async fn destroy_then_refresh_drops_state() {
        let client = Arc::new(FakeClient::new());
        let provider = configured(client);
        let type_name = "crds_slo_koordinator_sh_node_metric_v1alpha1";
        let state = provider
            .apply_resource(type_name, &json!({"metadata": {"name": "node-a"}}), None)
            .await
            .state
            .unwrap();

        assert!(provider.destroy_resource(type_name, &state).await.is_empty());
        let refreshed = provider.refresh_resource(type_name, &state).await;
        assert!(refreshed.state.is_none());
    }
}
