use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use kube::api::PropagationPolicy;
use log::*;
use serde_json::{json, Value};

use super::{
    id_attribute, metadata_attribute, object_id, object_ref, parse_import_id, spec_attribute, CrdKind,
    MetadataMode,
};
use crate::client::{ApplyOptions, ObjectRef};
use crate::framework::convert::{merge_local, object_to_state, state_to_object};
use crate::framework::{Attribute, Diagnostics, Resource, Response, Schema, Validator};
use crate::helpers::manifests::{normalize, with_type_meta};
use crate::helpers::wait::{wait_for, WaitCondition};
use crate::provider::ProviderData;

pub const DEFAULT_FIELD_MANAGER: &str = "terraform-provider-crds";

/// Manages an object of kind `K` with server-side apply.
pub struct CrdResource<K> {
    data: Option<Arc<ProviderData>>,
    kind: PhantomData<fn() -> K>,
}

impl<K: CrdKind> CrdResource<K> {
    pub fn new() -> Self {
        CrdResource {
            data: None,
            kind: PhantomData,
        }
    }

    fn provider_data(&self) -> Result<&ProviderData, Diagnostics> {
        match &self.data {
            Some(data) => Ok(data.as_ref()),
            None => {
                let mut diags = Diagnostics::new();
                diags.add_error(
                    "Unconfigured provider",
                    "Expected a configured Kubernetes client. Please report this issue to the provider developers.",
                );
                Err(diags)
            }
        }
    }

    /// Create and update are the same server-side apply.
    async fn apply(&self, plan: &Value) -> Response {
        let data = match self.provider_data() {
            Ok(data) => data,
            Err(diags) => return Response::from_diagnostics(diags),
        };
        let target = match object_ref::<K>(plan) {
            Ok(target) => target,
            Err(diags) => return Response::from_diagnostics(diags),
        };
        let conditions = match wait_conditions(plan) {
            Ok(conditions) => conditions,
            Err(err) => {
                return Response::error(
                    "Unable to read wait_for",
                    format!("The wait_for configuration could not be decoded.\n\nError: {err}"),
                )
            }
        };

        let schema = self.schema();
        let object = with_type_meta::<K>(state_to_object(&schema.attributes, plan));
        let body = match normalize::<K>(&object) {
            Ok(body) => body,
            Err(err) => {
                return Response::error(
                    "Unable to marshal resource",
                    format!("An unexpected error occurred while creating the resource request.\n\nMarshal Error: {err}"),
                )
            }
        };
        let options = ApplyOptions {
            field_manager: plan["field_manager"]
                .as_str()
                .unwrap_or(DEFAULT_FIELD_MANAGER)
                .to_string(),
            force: plan["force_conflicts"].as_bool().unwrap_or(false),
        };

        let applied = match data.client.apply(&target, &body, &options).await {
            Ok(object) => object,
            Err(err) => {
                error!("{}", err);
                return Response::error(
                    "Unable to PATCH resource",
                    format!("An unexpected error occurred while applying the resource.\n\nPATCH Error: {err}"),
                );
            }
        };

        // From here on the object exists, so every response carries its state.
        let mut response = self.applied_state(&target, &applied, plan);
        if conditions.is_empty() || response.diagnostics.has_error() {
            return response;
        }
        match wait_for(
            data.client.as_ref(),
            &target,
            &conditions,
            data.wait_timeout,
            data.poll_interval,
        )
        .await
        {
            Ok(object) => self.applied_state(&target, &object, plan),
            Err(err) => {
                warn!("{} was applied but is not ready: {}", target, err);
                response.diagnostics.add_error(
                    "Unable to wait for resource",
                    format!("The resource was applied but did not reach the requested state.\n\nWait Error: {err}"),
                );
                response
            }
        }
    }

    fn state_from_object(&self, target: &ObjectRef, object: &Value, locals: &Value) -> Response {
        let normalized = match normalize::<K>(object) {
            Ok(normalized) => normalized,
            Err(err) => {
                return Response::error(
                    "Unable to unmarshal resource",
                    format!("An unexpected error occurred while parsing the resource response.\n\nUnmarshal Error: {err}"),
                )
            }
        };
        Response::with_state(self.state(target, &normalized, locals))
    }

    /// Like `state_from_object`, but falls back to the raw object so an
    /// applied object is never lost from state.
    fn applied_state(&self, target: &ObjectRef, object: &Value, locals: &Value) -> Response {
        let mut response = self.state_from_object(target, object, locals);
        if response.state.is_none() {
            response.state = Some(self.state(target, object, locals));
        }
        response
    }

    fn state(&self, target: &ObjectRef, object: &Value, locals: &Value) -> Value {
        let schema = self.schema();
        let mut state = object_to_state(&schema.attributes, object);
        merge_local(&schema.attributes, locals, &mut state);
        state["id"] = Value::String(object_id(target.namespace.as_deref(), &target.name));
        state
    }
}

impl<K: CrdKind> Default for CrdResource<K> {
    fn default() -> Self {
        Self::new()
    }
}

fn wait_conditions(plan: &Value) -> serde_json::Result<Vec<WaitCondition>> {
    match &plan["wait_for"] {
        Value::Null => Ok(Vec::new()),
        conditions => serde_json::from_value(conditions.clone()),
    }
}

fn propagation_policy(state: &Value) -> Option<PropagationPolicy> {
    match state["deletion_propagation"].as_str()? {
        "Orphan" => Some(PropagationPolicy::Orphan),
        "Background" => Some(PropagationPolicy::Background),
        "Foreground" => Some(PropagationPolicy::Foreground),
        _ => None,
    }
}

#[async_trait]
impl<K: CrdKind> Resource for CrdResource<K> {
    fn metadata(&self, provider_type_name: &str) -> String {
        format!("{}_{}", provider_type_name, K::TYPE_NAME)
    }

    fn schema(&self) -> Schema {
        Schema::new(
            K::DESCRIPTION,
            vec![
                id_attribute(),
                Attribute::string("api_version")
                    .json("apiVersion")
                    .computed()
                    .describe("The API group and version of the object."),
                Attribute::string("kind").computed().describe("The kind of the object."),
                Attribute::string("field_manager")
                    .local()
                    .optional()
                    .validator(Validator::StringLengthAtLeast(1))
                    .describe("The name of the manager used to track field ownership. Defaults to 'terraform-provider-crds'."),
                Attribute::bool("force_conflicts")
                    .local()
                    .optional()
                    .describe("If 'true', server-side apply will force the changes against conflicts."),
                Attribute::string("deletion_propagation")
                    .local()
                    .optional()
                    .validator(Validator::StringOneOf(vec!["Orphan", "Background", "Foreground"]))
                    .describe("Decides if a deletion will propagate to the dependents of the object, and how the garbage collector will handle the propagation."),
                Attribute::list_nested(
                    "wait_for",
                    vec![
                        Attribute::string("jsonpath")
                            .required()
                            .validator(Validator::StringLengthAtLeast(1))
                            .validator(Validator::JsonPath)
                            .describe("JSONPath expression selecting the field to wait for."),
                        Attribute::string("value")
                            .optional()
                            .describe("Expected value of the selected field. Any value matches when unset."),
                    ],
                )
                .local()
                .optional()
                .describe("Conditions that must hold after create or update before the operation completes."),
                metadata_attribute(K::NAMESPACED, MetadataMode::Resource),
                spec_attribute::<K>(),
            ],
        )
    }

    fn configure(&mut self, data: Arc<ProviderData>) -> Diagnostics {
        self.data = Some(data);
        Diagnostics::new()
    }

    async fn create(&self, plan: &Value) -> Response {
        self.apply(plan).await
    }

    async fn read(&self, state: &Value) -> Response {
        let data = match self.provider_data() {
            Ok(data) => data,
            Err(diags) => return Response::from_diagnostics(diags),
        };
        let target = match object_ref::<K>(state) {
            Ok(target) => target,
            Err(diags) => return Response::from_diagnostics(diags),
        };
        match data.client.get(&target).await {
            Ok(object) => self.state_from_object(&target, &object, state),
            Err(err) if err.is_not_found() => {
                warn!("{} is gone, removing it from state", target);
                Response::default()
            }
            Err(err) => {
                error!("{}", err);
                Response::error(
                    "Unable to GET resource",
                    format!("An unexpected error occurred while reading the resource.\n\nGET Error: {err}"),
                )
            }
        }
    }

    async fn update(&self, plan: &Value, _prior: &Value) -> Response {
        self.apply(plan).await
    }

    async fn delete(&self, state: &Value) -> Diagnostics {
        let data = match self.provider_data() {
            Ok(data) => data,
            Err(diags) => return diags,
        };
        let target = match object_ref::<K>(state) {
            Ok(target) => target,
            Err(diags) => return diags,
        };
        let mut diags = Diagnostics::new();
        match data.client.delete(&target, propagation_policy(state)).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => warn!("{} was already deleted", target),
            Err(err) => {
                error!("{}", err);
                diags.add_error(
                    "Unable to DELETE resource",
                    format!("An unexpected error occurred while deleting the resource.\n\nDELETE Error: {err}"),
                );
            }
        }
        diags
    }

    fn import_state(&self, id: &str) -> Response {
        let (namespace, name) = match parse_import_id(id, K::NAMESPACED) {
            Ok(parts) => parts,
            Err(err) => return Response::error("Error importing resource", err.to_string()),
        };
        let schema = self.schema();
        let mut state = object_to_state(
            &schema.attributes,
            &json!({"metadata": {"name": name, "namespace": namespace}}),
        );
        state["id"] = Value::String(id.to_string());
        Response::with_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::v1alpha1::nodemetric_api::NodeMetric;
    use crate::api::v1alpha1::nodeslo_api::NodeSLO;
    use crate::api::v1alpha1::spicedbcluster_api::SpiceDBCluster;
    use crate::client::fake::FakeClient;
    use crate::framework::convert::validate_config;

    fn configured<K: CrdKind>(client: Arc<FakeClient>) -> CrdResource<K> {
        let mut resource = CrdResource::<K>::new();
        resource.configure(ProviderData::for_tests(client));
        resource
    }

    fn spicedb_plan() -> Value {
        json!({
            "field_manager": "platform-team",
            "force_conflicts": true,
            "deletion_propagation": "Foreground",
            "metadata": {"name": "dev", "namespace": "authz", "labels": {"team": "iam"}},
            "spec": {"version": "v1.29.0", "secret_name": "dev-spicedb", "config": {"datastoreEngine": "postgres"}}
        })
    }

    #[test]
    fn node_metric_resource_validate_schema() {
        let diags = CrdResource::<NodeMetric>::new().schema().validate_implementation();
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn plan_validates_against_schema() {
        let schema = CrdResource::<SpiceDBCluster>::new().schema();
        let mut diags = Diagnostics::new();
        validate_config(&schema.attributes, &spicedb_plan(), &mut diags);
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[tokio::test]
    async fn create_applies_and_records_state() {
        let client = Arc::new(FakeClient::new());
        let resource = configured::<SpiceDBCluster>(client.clone());

        let response = resource.create(&spicedb_plan()).await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(
            client.calls(),
            vec!["apply SpiceDBCluster authz/dev manager=platform-team force=true"]
        );

        let target = object_ref::<SpiceDBCluster>(&spicedb_plan()).unwrap();
        let sent = client.object(&target).unwrap();
        assert_eq!(sent["apiVersion"], "authzed.com/v1alpha1");
        assert_eq!(sent["kind"], "SpiceDBCluster");
        assert_eq!(sent["spec"]["secretName"], "dev-spicedb");
        assert!(sent["spec"].get("channel").is_none());

        let state = response.state.unwrap();
        assert_eq!(state["id"], "authz/dev");
        assert_eq!(state["api_version"], "authzed.com/v1alpha1");
        assert_eq!(state["field_manager"], "platform-team");
        assert_eq!(state["deletion_propagation"], "Foreground");
        assert_eq!(state["spec"]["config"]["datastoreEngine"], "postgres");
    }

    #[tokio::test]
    async fn defaults_field_manager() {
        let client = Arc::new(FakeClient::new());
        let resource = configured::<NodeMetric>(client.clone());
        let plan = json!({
            "metadata": {"name": "node-a"},
            "spec": {"metric_collect_policy": {"report_interval_seconds": 60}}
        });
        let response = resource.update(&plan, &plan).await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(
            client.calls(),
            vec!["apply NodeMetric node-a manager=terraform-provider-crds force=false"]
        );
        assert_eq!(
            response.state.unwrap()["spec"]["metric_collect_policy"]["report_interval_seconds"],
            60
        );
    }

    #[tokio::test]
    async fn waits_for_conditions_after_apply() {
        let client = Arc::new(FakeClient::new());
        let resource = configured::<NodeSLO>(client.clone());
        let plan = json!({
            "wait_for": [{"jsonpath": "metadata.uid"}, {"jsonpath": "$.metadata.resourceVersion", "value": "1"}],
            "metadata": {"name": "node-a"}
        });
        let response = resource.create(&plan).await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(client.calls().len(), 2);
        assert_eq!(response.state.unwrap()["wait_for"][0]["jsonpath"], "metadata.uid");
    }

    #[tokio::test]
    async fn wait_timeout_keeps_the_applied_object_in_state() {
        let client = Arc::new(FakeClient::new());
        let resource = configured::<NodeSLO>(client.clone());
        let plan = json!({
            "wait_for": [{"jsonpath": "status.ready"}],
            "metadata": {"name": "node-a"}
        });
        let response = resource.create(&plan).await;
        let diag = response.diagnostics.iter().next().unwrap();
        assert_eq!(diag.summary, "Unable to wait for resource");

        let state = response.state.expect("applied object stays tracked");
        assert_eq!(state["id"], "node-a");
        assert_eq!(state["wait_for"][0]["jsonpath"], "status.ready");
        assert!(client.object(&object_ref::<NodeSLO>(&plan).unwrap()).is_some());
    }

    #[tokio::test]
    async fn nulls_inside_dynamic_values_reach_the_api_server() {
        let client = Arc::new(FakeClient::new());
        let resource = configured::<SpiceDBCluster>(client.clone());
        let plan = json!({
            "metadata": {"name": "dev", "namespace": "authz"},
            "spec": {
                "config": {"logLevel": null},
                "patches": [{"kind": "Deployment", "patch": {"metadata": {"annotations": {"drop-me": null}}}}]
            }
        });
        let response = resource.create(&plan).await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);

        let sent = client.object(&object_ref::<SpiceDBCluster>(&plan).unwrap()).unwrap();
        assert_eq!(sent["spec"]["config"], json!({"logLevel": null}));
        assert_eq!(
            sent["spec"]["patches"][0]["patch"],
            json!({"metadata": {"annotations": {"drop-me": null}}})
        );
        assert!(sent["spec"].get("version").is_none());
    }

    #[tokio::test]
    async fn int_or_string_survives_refresh_then_apply() {
        let client = Arc::new(FakeClient::new());
        let resource = configured::<NodeSLO>(client.clone());
        let state = json!({"metadata": {"name": "node-a"}});
        let target = object_ref::<NodeSLO>(&state).unwrap();
        client.insert(
            &target,
            json!({
                "apiVersion": "slo.koordinator.sh/v1alpha1",
                "kind": "NodeSLO",
                "metadata": {"name": "node-a"},
                "spec": {"resourceQOSStrategy": {"beClass": {"networkQOS": {"egressLimit": 50, "ingressLimit": "100M"}}}}
            }),
        );

        let refreshed = resource.read(&state).await.state.unwrap();
        let network = &refreshed["spec"]["resource_qos_strategy"]["be_class"]["network_qos"];
        assert_eq!(network["egress_limit"], "50");

        let response = resource.update(&refreshed, &refreshed).await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let sent = client.object(&target).unwrap();
        let network = &sent["spec"]["resourceQOSStrategy"]["beClass"]["networkQOS"];
        assert_eq!(network["egressLimit"], json!(50));
        assert_eq!(network["ingressLimit"], json!("100M"));
    }

    #[tokio::test]
    async fn read_refreshes_and_drops_missing_objects() {
        let client = Arc::new(FakeClient::new());
        let resource = configured::<SpiceDBCluster>(client.clone());
        let created = resource.create(&spicedb_plan()).await.state.unwrap();

        let refreshed = resource.read(&created).await;
        assert_eq!(refreshed.state.as_ref(), Some(&created));

        let diags = resource.delete(&created).await;
        assert!(diags.is_empty(), "{diags:?}");
        assert!(client
            .calls()
            .contains(&"delete SpiceDBCluster authz/dev propagation=Some(Foreground)".to_string()));

        let gone = resource.read(&created).await;
        assert!(gone.state.is_none());
        assert!(gone.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn delete_tolerates_missing_objects_but_not_api_errors() {
        let state = json!({"metadata": {"name": "node-a"}});
        let missing = configured::<NodeSLO>(Arc::new(FakeClient::new())).delete(&state).await;
        assert!(missing.is_empty());

        let forbidden = configured::<NodeSLO>(Arc::new(FakeClient::forbidden())).delete(&state).await;
        assert_eq!(forbidden.iter().next().unwrap().summary, "Unable to DELETE resource");
    }

    #[tokio::test]
    async fn patch_errors_are_diagnostics() {
        let resource = configured::<SpiceDBCluster>(Arc::new(FakeClient::forbidden()));
        let response = resource.create(&spicedb_plan()).await;
        assert!(response.state.is_none());
        assert_eq!(response.diagnostics.iter().next().unwrap().summary, "Unable to PATCH resource");
    }

    #[test]
    fn import_splits_identifier() {
        let imported = CrdResource::<SpiceDBCluster>::new().import_state("authz/dev");
        let state = imported.state.unwrap();
        assert_eq!(state["id"], "authz/dev");
        assert_eq!(state["metadata"]["namespace"], "authz");
        assert_eq!(state["metadata"]["name"], "dev");
        assert_eq!(state["spec"], Value::Null);

        let cluster = CrdResource::<NodeSLO>::new().import_state("node-a").state.unwrap();
        assert_eq!(cluster["metadata"]["name"], "node-a");

        let bad = CrdResource::<SpiceDBCluster>::new().import_state("dev");
        assert_eq!(bad.diagnostics.iter().next().unwrap().summary, "Error importing resource");
    }
}
