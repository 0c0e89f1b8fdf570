//! Moving values between Terraform shape (snake_case, every attribute present)
//! and Kubernetes shape (camelCase, unset fields omitted).

use serde_json::{Map, Value};

use super::diag::Diagnostics;
use super::path::AttributePath;
use super::schema::{Attribute, AttributeKind, ElementType};

/// Validate a configuration object against a schema, the way Terraform does
/// before handing configuration to a provider.
pub fn validate_config(attributes: &[Attribute], config: &Value, diags: &mut Diagnostics) {
    validate_object(attributes, config, &AttributePath::default(), diags);
}

fn child(parent: &AttributePath, name: &str) -> AttributePath {
    if parent.is_empty() {
        AttributePath::root(name)
    } else {
        parent.attribute(name)
    }
}

fn validate_object(attributes: &[Attribute], value: &Value, parent: &AttributePath, diags: &mut Diagnostics) {
    let object = match value {
        Value::Object(object) => object,
        _ => {
            type_error(parent, "object", diags);
            return;
        }
    };

    for key in object.keys() {
        if !attributes.iter().any(|a| a.name == key) {
            diags.add_attribute_error(
                child(parent, key),
                "Unsupported argument",
                format!("An argument named {key:?} is not expected here."),
            );
        }
    }

    for attr in attributes {
        let path = child(parent, attr.name);
        let value = object.get(attr.name).unwrap_or(&Value::Null);
        if value.is_null() {
            if attr.required {
                diags.add_attribute_error(
                    path.clone(),
                    "Missing Configuration for Required Attribute",
                    format!(
                        "Must set a configuration value for the {path} attribute as the provider has marked it as required."
                    ),
                );
            }
            continue;
        }
        if attr.is_read_only() {
            diags.add_attribute_error(
                path,
                "Invalid Configuration for Read-Only Attribute",
                "Cannot set value for this attribute as the provider has marked it as read-only. Remove the configuration line setting the value.",
            );
            continue;
        }
        validate_value(attr, value, &path, diags);
    }
}

fn validate_value(attr: &Attribute, value: &Value, path: &AttributePath, diags: &mut Diagnostics) {
    let well_typed = match &attr.kind {
        AttributeKind::String | AttributeKind::IntOrString => {
            check_element(ElementType::String, value, path, diags)
        }
        AttributeKind::Bool => check_element(ElementType::Bool, value, path, diags),
        AttributeKind::Int64 => check_element(ElementType::Int64, value, path, diags),
        AttributeKind::Dynamic => true,
        AttributeKind::List(element) => match value.as_array() {
            Some(items) => items
                .iter()
                .enumerate()
                .fold(true, |ok, (i, item)| check_element(*element, item, &path.index(i), diags) && ok),
            None => type_error(path, "list", diags),
        },
        AttributeKind::Map(element) => match value.as_object() {
            Some(entries) => entries
                .iter()
                .fold(true, |ok, (k, v)| check_element(*element, v, &path.key(k), diags) && ok),
            None => type_error(path, "map", diags),
        },
        AttributeKind::SingleNested(nested) => {
            validate_object(nested, value, path, diags);
            true
        }
        AttributeKind::ListNested(nested) => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    validate_object(nested, item, &path.index(i), diags);
                }
                true
            }
            None => type_error(path, "list of object", diags),
        },
    };

    if well_typed {
        for validator in &attr.validators {
            validator.validate(path, value, diags);
        }
    }
}

fn check_element(element: ElementType, value: &Value, path: &AttributePath, diags: &mut Diagnostics) -> bool {
    let (ok, expected) = match element {
        ElementType::String => (value.is_string(), "string"),
        ElementType::Bool => (value.is_boolean(), "bool"),
        ElementType::Int64 => (value.as_i64().is_some(), "number (int64)"),
    };
    if ok {
        true
    } else {
        type_error(path, expected, diags)
    }
}

fn type_error(path: &AttributePath, expected: &str, diags: &mut Diagnostics) -> bool {
    diags.add_attribute_error(
        path.clone(),
        "Incorrect attribute value type",
        format!("Inappropriate value for attribute {path}: {expected} required."),
    );
    false
}

/// Terraform value -> Kubernetes JSON. Unset attributes and local or read-only ones are
/// dropped; dynamic values are copied as is, nulls included.
pub fn state_to_object(attributes: &[Attribute], state: &Value) -> Value {
    let mut out = Map::new();
    for attr in attributes {
        let json_name = match &attr.json_name {
            Some(name) if !attr.is_read_only() => name,
            _ => continue,
        };
        let value = match state.get(attr.name) {
            Some(value) if !value.is_null() => value,
            _ => continue,
        };
        let converted = match (&attr.kind, value) {
            (AttributeKind::SingleNested(nested), _) => state_to_object(nested, value),
            (AttributeKind::IntOrString, Value::String(s)) => int_or_string(s),
            (AttributeKind::ListNested(nested), Value::Array(items)) => {
                Value::Array(items.iter().map(|item| state_to_object(nested, item)).collect())
            }
            _ => value.clone(),
        };
        out.insert(json_name.clone(), converted);
    }
    Value::Object(out)
}

/// Kubernetes JSON -> Terraform value holding every attribute of the schema.
pub fn object_to_state(attributes: &[Attribute], object: &Value) -> Value {
    let mut out = Map::new();
    for attr in attributes {
        let value = attr
            .json_name
            .as_ref()
            .and_then(|name| object.get(name))
            .filter(|v| !v.is_null());
        let converted = match (value, &attr.kind) {
            (None, _) => Value::Null,
            (Some(value), AttributeKind::SingleNested(nested)) => object_to_state(nested, value),
            (Some(Value::Array(items)), AttributeKind::ListNested(nested)) => {
                Value::Array(items.iter().map(|item| object_to_state(nested, item)).collect())
            }
            (Some(value), AttributeKind::String | AttributeKind::IntOrString) => coerce_string(value),
            (Some(value), _) => value.clone(),
        };
        out.insert(attr.name.to_string(), converted);
    }
    Value::Object(out)
}

/// Copy the configurable state-only root attributes (`field_manager`, `wait_for`, ...)
/// from `source` into `target`.
pub fn merge_local(attributes: &[Attribute], source: &Value, target: &mut Value) {
    let target = match target.as_object_mut() {
        Some(target) => target,
        None => return,
    };
    for attr in attributes.iter().filter(|a| a.json_name.is_none() && !a.is_read_only()) {
        let value = source.get(attr.name).cloned().unwrap_or(Value::Null);
        target.insert(attr.name.to_string(), value);
    }
}

// `"50"` means 50 (a percentage), `"50M"` a quantity.
fn int_or_string(s: &str) -> Value {
    let digits = !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    match s.parse::<i64>() {
        Ok(n) if digits => Value::from(n),
        _ => Value::String(s.to_string()),
    }
}

// int-or-string fields come back from the API server as numbers.
fn coerce_string(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        other => other.clone(),
    }
}
