use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// SpiceDBCluster is the authzed operator's description of a SpiceDB deployment.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    group = "authzed.com",
    version = "v1alpha1",
    kind = "SpiceDBCluster",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct SpiceDBClusterSpec {
    /// Version is the name of the version of SpiceDB that will be run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Channel is a defined series of updates that operator should follow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Config values to be passed to the cluster
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    /// SecretName points to a secret (in the same namespace) that holds the
    /// preshared key, datastore engine and datastore uri.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,
    /// Patches is a list of patches to apply to generated resources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patches: Option<Vec<ResourcePatch>>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
pub struct ResourcePatch {
    pub kind: String,
    pub patch: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::Resource;

    #[test]
    fn namespaced_identity() {
        assert_eq!(SpiceDBCluster::api_version(&()), "authzed.com/v1alpha1");
        assert_eq!(SpiceDBCluster::plural(&()), "spicedbclusters");
    }
}
