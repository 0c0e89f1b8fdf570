//! Terraform glue shared by every CRD kind.
//!
//! A kind only describes itself through [`CrdKind`]: its type name, scope and
//! the attributes of its `spec`. The manifest data source, data source and
//! resource are generic over it.

pub mod data_source;
pub mod manifest;
pub mod node_metric;
pub mod node_slo;
pub mod resource;
pub mod spicedb_cluster;

use kube::core::ApiResource;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::ObjectRef;
use crate::errors::{Error, Result};
use crate::framework::schema::ElementType;
use crate::framework::{Attribute, Diagnostics, Validator};

pub use data_source::CrdDataSource;
pub use manifest::CrdManifest;
pub use resource::CrdResource;

pub trait CrdKind: Resource<DynamicType = ()> + DeserializeOwned + Serialize + Send + Sync + 'static {
    /// Type name without the provider prefix, e.g. `slo_koordinator_sh_node_slo_v1alpha1`.
    const TYPE_NAME: &'static str;
    const NAMESPACED: bool;
    const DESCRIPTION: &'static str;

    /// Attributes of `spec` in their configurable form.
    fn spec_attributes() -> Vec<Attribute>;

    fn spec_required() -> bool {
        false
    }
}

/// Which flavour of `metadata` a schema needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataMode {
    /// Managed object: identity changes force replacement.
    Resource,
    /// Locally rendered YAML.
    Manifest,
    /// Looked up in the cluster: only the identity is configurable.
    DataSource,
}

pub fn id_attribute() -> Attribute {
    Attribute::string("id")
        .local()
        .computed()
        .describe("Contains the value 'metadata.namespace/metadata.name' for namespaced objects and 'metadata.name' otherwise.")
}

pub fn metadata_attribute(namespaced: bool, mode: MetadataMode) -> Attribute {
    let mut name = Attribute::string("name")
        .required()
        .validator(Validator::StringLengthAtLeast(1))
        .describe("Unique identifier for this object.");
    let mut namespace = Attribute::string("namespace")
        .required()
        .validator(Validator::StringLengthAtLeast(1))
        .describe("The namespace the object lives in.");
    if mode == MetadataMode::Resource {
        name = name.requires_replace();
        namespace = namespace.requires_replace();
    }

    let mut attributes = vec![name];
    if namespaced {
        attributes.push(namespace);
    }

    let labels = Attribute::map("labels", ElementType::String)
        .describe("Map of string keys and values that can be used to organize and categorize objects.");
    let annotations = Attribute::map("annotations", ElementType::String)
        .describe("Unstructured key value map stored with a resource that may be set by external tools.");
    match mode {
        MetadataMode::DataSource => {
            attributes.push(labels.computed());
            attributes.push(annotations.computed());
        }
        _ => {
            attributes.push(labels.optional());
            attributes.push(annotations.optional());
        }
    }

    Attribute::single_nested("metadata", attributes)
        .required()
        .describe("Data that helps uniquely identify this object.")
}

pub fn spec_attribute<K: CrdKind>() -> Attribute {
    let spec = Attribute::single_nested("spec", K::spec_attributes())
        .describe("Desired state of the object, as understood by its operator.");
    if K::spec_required() {
        spec.required()
    } else {
        spec.optional()
    }
}

pub fn object_id(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) => format!("{ns}/{name}"),
        None => name.to_string(),
    }
}

/// Split an import identifier into namespace and name.
pub fn parse_import_id(id: &str, namespaced: bool) -> Result<(Option<String>, String)> {
    if !namespaced {
        if id.is_empty() || id.contains('/') {
            return Err(Error::InvalidImportId {
                expected: "name",
                id: id.to_string(),
            });
        }
        return Ok((None, id.to_string()));
    }
    match id.split('/').collect::<Vec<_>>().as_slice() {
        [ns, name] if !ns.is_empty() && !name.is_empty() => Ok((Some(ns.to_string()), name.to_string())),
        _ => Err(Error::InvalidImportId {
            expected: "namespace/name",
            id: id.to_string(),
        }),
    }
}

/// Address of the object described by a configuration or state value.
pub fn object_ref<K: CrdKind>(value: &Value) -> Result<ObjectRef, Diagnostics> {
    let mut diags = Diagnostics::new();
    let metadata = &value["metadata"];
    let name = metadata["name"].as_str().map(str::to_string);
    let namespace = if K::NAMESPACED {
        metadata["namespace"].as_str().map(str::to_string)
    } else {
        None
    };
    match name {
        Some(name) if !K::NAMESPACED || namespace.is_some() => {
            Ok(ObjectRef::new(ApiResource::erase::<K>(&()), namespace, name))
        }
        _ => {
            diags.add_error(
                "Missing object identity",
                format!(
                    "Expected metadata.name{} to be set for {}.",
                    if K::NAMESPACED { " and metadata.namespace" } else { "" },
                    K::kind(&())
                ),
            );
            Err(diags)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::v1alpha1::nodeslo_api::NodeSLO;
    use crate::api::v1alpha1::spicedbcluster_api::SpiceDBCluster;
    use serde_json::json;

    #[test]
    fn ids_follow_scope() {
        assert_eq!(object_id(None, "node-a"), "node-a");
        assert_eq!(object_id(Some("default"), "dev"), "default/dev");
    }

    #[test]
    fn import_ids() {
        assert_eq!(parse_import_id("node-a", false).unwrap(), (None, "node-a".to_string()));
        assert_eq!(
            parse_import_id("default/dev", true).unwrap(),
            (Some("default".to_string()), "dev".to_string())
        );
        for bad in ["dev", "default/", "/dev", "a/b/c", ""] {
            assert!(parse_import_id(bad, true).is_err(), "{bad}");
        }
        assert!(parse_import_id("a/b", false).is_err());

        let err = parse_import_id("dev", true).unwrap_err();
        assert_eq!(err.to_string(), "expected import identifier with format: 'namespace/name'. Got: 'dev'");
    }

    #[test]
    fn object_ref_reads_metadata() {
        let target = object_ref::<SpiceDBCluster>(&json!({"metadata": {"name": "dev", "namespace": "authz"}})).unwrap();
        assert_eq!(target.namespace.as_deref(), Some("authz"));
        assert_eq!(target.resource.plural, "spicedbclusters");
        assert_eq!(target.to_string(), "SpiceDBCluster authz/dev");

        let cluster = object_ref::<NodeSLO>(&json!({"metadata": {"name": "node-a", "namespace": "ignored"}})).unwrap();
        assert_eq!(cluster.namespace, None);

        assert!(object_ref::<SpiceDBCluster>(&json!({"metadata": {"name": "dev"}})).is_err());
    }

    #[test]
    fn data_source_metadata_is_read_only_beyond_identity() {
        let metadata = metadata_attribute(true, MetadataMode::DataSource);
        let nested = metadata.kind.nested().unwrap();
        let names: Vec<_> = nested.iter().map(|a| (a.name, a.is_read_only())).collect();
        assert_eq!(
            names,
            vec![("name", false), ("namespace", false), ("labels", true), ("annotations", true)]
        );
    }
}
