use kube::Resource;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::{Error, Result};

/// Add `apiVersion` and `kind` of `K` to an object built from Terraform values.
pub fn with_type_meta<K>(object: Value) -> Value
where
    K: Resource<DynamicType = ()>,
{
    let mut map = Map::new();
    map.insert("apiVersion".to_string(), Value::String(K::api_version(&()).into_owned()));
    map.insert("kind".to_string(), Value::String(K::kind(&()).into_owned()));
    if let Value::Object(fields) = object {
        for (key, value) in fields {
            map.entry(key).or_insert(value);
        }
    }
    Value::Object(map)
}

/// Decode an object into its typed model, surfacing shape mismatches early.
pub fn to_typed<K: DeserializeOwned>(object: &Value) -> Result<K> {
    serde_json::from_value(object.clone()).map_err(Error::SerializationError)
}

/// Normalise an object through its typed model: unknown fields are dropped and
/// unset fields omitted, which is what gets sent to or recorded from the cluster.
/// Nulls inside free-form values are kept; in an apply patch they remove fields.
pub fn normalize<K>(object: &Value) -> Result<Value>
where
    K: DeserializeOwned + serde::Serialize,
{
    // The typed models always carry a spec, even when nothing in it is set.
    let mut object = object.clone();
    let had_spec = object.get("spec").map_or(false, |spec| !spec.is_null());
    if let Some(map) = object.as_object_mut() {
        if !had_spec {
            map.insert("spec".to_string(), Value::Object(Map::new()));
        }
    }

    let typed: K = to_typed(&object)?;
    let mut value = serde_json::to_value(&typed).map_err(Error::SerializationError)?;
    if !had_spec {
        if let Some(map) = value.as_object_mut() {
            if map.get("spec").map_or(false, |spec| spec.as_object().map_or(false, Map::is_empty)) {
                map.remove("spec");
            }
        }
    }
    Ok(value)
}

/// Keys keep the order of the typed model's fields, not alphabetical order.
pub fn to_yaml(object: &Value) -> Result<String> {
    serde_yaml::to_string(object).map_err(Error::YamlError)
}
