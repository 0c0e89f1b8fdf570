use serde::Serialize;
use serde_json::Value;

use super::diag::Diagnostics;
use super::path::AttributePath;
use super::schema::AttributeKind;
use crate::helpers::wait::compile;

/// Value constraints carried over from a CRD's OpenAPI schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Validator {
    StringLengthAtLeast(usize),
    StringOneOf(Vec<&'static str>),
    Int64AtLeast(i64),
    Int64AtMost(i64),
    /// The value must parse as a JSONPath expression, e.g. `status.phase`.
    JsonPath,
}

impl Validator {
    pub fn description(&self) -> String {
        match self {
            Validator::StringLengthAtLeast(min) => format!("string length must be at least {min}"),
            Validator::StringOneOf(values) => format!("value must be one of: {}", quoted(values)),
            Validator::Int64AtLeast(min) => format!("value must be at least {min}"),
            Validator::Int64AtMost(max) => format!("value must be at most {max}"),
            Validator::JsonPath => "value must be a valid JSONPath expression".to_string(),
        }
    }

    /// Whether this validator can be attached to an attribute of the given kind.
    pub fn applies_to(&self, kind: &AttributeKind) -> bool {
        match self {
            Validator::StringLengthAtLeast(_) | Validator::StringOneOf(_) | Validator::JsonPath => {
                matches!(kind, AttributeKind::String | AttributeKind::IntOrString)
            }
            Validator::Int64AtLeast(_) | Validator::Int64AtMost(_) => {
                matches!(kind, AttributeKind::Int64)
            }
        }
    }

    /// Check a known, non-null value. Type mismatches are reported elsewhere.
    pub fn validate(&self, path: &AttributePath, value: &Value, diags: &mut Diagnostics) {
        match self {
            Validator::StringLengthAtLeast(min) => {
                if let Some(s) = value.as_str() {
                    let len = s.chars().count();
                    if len < *min {
                        diags.add_attribute_error(
                            path.clone(),
                            "Invalid Attribute Value Length",
                            format!("Attribute {path} string length must be at least {min}, got: {len}"),
                        );
                    }
                }
            }
            Validator::StringOneOf(values) => {
                if let Some(s) = value.as_str() {
                    if !values.contains(&s) {
                        diags.add_attribute_error(
                            path.clone(),
                            "Invalid Attribute Value Match",
                            format!(
                                "Attribute {path} value must be one of: {}, got: {s:?}",
                                quoted(values)
                            ),
                        );
                    }
                }
            }
            Validator::Int64AtLeast(min) => {
                if let Some(n) = value.as_i64() {
                    if n < *min {
                        diags.add_attribute_error(
                            path.clone(),
                            "Invalid Attribute Value",
                            format!("Attribute {path} value must be at least {min}, got: {n}"),
                        );
                    }
                }
            }
            Validator::Int64AtMost(max) => {
                if let Some(n) = value.as_i64() {
                    if n > *max {
                        diags.add_attribute_error(
                            path.clone(),
                            "Invalid Attribute Value",
                            format!("Attribute {path} value must be at most {max}, got: {n}"),
                        );
                    }
                }
            }
            Validator::JsonPath => {
                if let Some(s) = value.as_str() {
                    if let Err(err) = compile(s) {
                        diags.add_attribute_error(
                            path.clone(),
                            "Invalid Attribute Value",
                            format!("Attribute {path} value must be a valid JSONPath expression, got: {s:?}\n\n{err}"),
                        );
                    }
                }
            }
        }
    }
}

/// Shorthand for the common `AtLeast` + `AtMost` pair.
pub fn int64_between(min: i64, max: i64) -> Vec<Validator> {
    vec![Validator::Int64AtLeast(min), Validator::Int64AtMost(max)]
}

fn quoted(values: &[&str]) -> String {
    let inner: Vec<String> = values.iter().map(|v| format!("{v:?}")).collect();
    format!("[{}]", inner.join(" "))
}
