use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use super::diag::Diagnostics;
use super::path::AttributePath;
use super::validators::Validator;

/// Root attribute names Terraform claims for its own meta-arguments.
const RESERVED_ROOT_NAMES: &[&str] = &[
    "connection",
    "count",
    "depends_on",
    "for_each",
    "lifecycle",
    "provider",
    "provisioner",
];

#[derive(Clone, Debug, Serialize)]
pub struct Schema {
    pub description: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    String,
    Bool,
    Int64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    String,
    Bool,
    Int64,
    /// A string in Terraform; digits-only values travel to Kubernetes as integers.
    IntOrString,
    List(ElementType),
    Map(ElementType),
    /// Arbitrary JSON, used for fields the CRD marks `x-kubernetes-preserve-unknown-fields`.
    Dynamic,
    SingleNested(Vec<Attribute>),
    ListNested(Vec<Attribute>),
}

impl AttributeKind {
    pub fn nested(&self) -> Option<&[Attribute]> {
        match self {
            AttributeKind::SingleNested(attrs) | AttributeKind::ListNested(attrs) => Some(attrs),
            _ => None,
        }
    }
}

/// A single attribute of a data source or resource schema.
///
/// `name` is the Terraform (snake_case) name, `json_name` the key used in the
/// Kubernetes object. Attributes without a `json_name` only live in Terraform state.
#[derive(Clone, Debug, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_name: Option<String>,
    pub kind: AttributeKind,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub requires_replace: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
}

impl Attribute {
    pub fn new(name: &'static str, kind: AttributeKind) -> Self {
        Attribute {
            name,
            json_name: Some(lower_camel_case(name)),
            kind,
            description: String::new(),
            required: false,
            optional: false,
            computed: false,
            requires_replace: false,
            validators: Vec::new(),
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, AttributeKind::String)
    }

    pub fn bool(name: &'static str) -> Self {
        Self::new(name, AttributeKind::Bool)
    }

    pub fn int64(name: &'static str) -> Self {
        Self::new(name, AttributeKind::Int64)
    }

    pub fn int_or_string(name: &'static str) -> Self {
        Self::new(name, AttributeKind::IntOrString)
    }

    pub fn list(name: &'static str, element: ElementType) -> Self {
        Self::new(name, AttributeKind::List(element))
    }

    pub fn map(name: &'static str, element: ElementType) -> Self {
        Self::new(name, AttributeKind::Map(element))
    }

    pub fn dynamic(name: &'static str) -> Self {
        Self::new(name, AttributeKind::Dynamic)
    }

    pub fn single_nested(name: &'static str, attributes: Vec<Attribute>) -> Self {
        Self::new(name, AttributeKind::SingleNested(attributes))
    }

    pub fn list_nested(name: &'static str, attributes: Vec<Attribute>) -> Self {
        Self::new(name, AttributeKind::ListNested(attributes))
    }

    /// Override the derived Kubernetes field name, e.g. `cpu_qos` -> `cpuQOS`.
    pub fn json(mut self, json_name: &str) -> Self {
        self.json_name = Some(json_name.to_string());
        self
    }

    /// Keep this attribute out of the Kubernetes object.
    pub fn local(mut self) -> Self {
        self.json_name = None;
        self
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn validators(mut self, validators: Vec<Validator>) -> Self {
        self.validators.extend(validators);
        self
    }

    /// Computed without being configurable.
    pub fn is_read_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }

    /// The read-only form of this attribute, as used by data sources.
    pub fn into_computed(mut self) -> Self {
        self.required = false;
        self.optional = false;
        self.computed = true;
        self.requires_replace = false;
        self.validators.clear();
        self.kind = match self.kind {
            AttributeKind::SingleNested(attrs) => AttributeKind::SingleNested(into_computed(attrs)),
            AttributeKind::ListNested(attrs) => AttributeKind::ListNested(into_computed(attrs)),
            kind => kind,
        };
        self
    }
}

pub fn into_computed(attributes: Vec<Attribute>) -> Vec<Attribute> {
    attributes.into_iter().map(Attribute::into_computed).collect()
}

impl Schema {
    pub fn new(description: &str, attributes: Vec<Attribute>) -> Self {
        Schema {
            description: description.to_string(),
            attributes,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Check the schema itself for mistakes that would make it unusable.
    pub fn validate_implementation(&self) -> Diagnostics {
        let mut diags = Diagnostics::new();
        for attr in &self.attributes {
            if RESERVED_ROOT_NAMES.contains(&attr.name) {
                diags.add_attribute_error(
                    AttributePath::root(attr.name),
                    "Reserved Root Attribute/Block Name",
                    format!("Schema uses a reserved root name {:?}. Choose a different name.", attr.name),
                );
            }
        }
        match self.attribute("id") {
            Some(id) if matches!(id.kind, AttributeKind::String) && id.computed => {}
            _ => diags.add_attribute_error(
                AttributePath::root("id"),
                "Missing id Attribute",
                "Schema must declare a computed string \"id\" attribute at the root.",
            ),
        }
        validate_attributes(&self.attributes, &AttributePath::default(), &mut diags);
        diags
    }

    /// True when an attribute marked `requires_replace` differs between prior state and plan.
    pub fn requires_replacement(&self, prior: &Value, plan: &Value) -> bool {
        attributes_require_replacement(&self.attributes, prior, plan)
    }
}

fn validate_attributes(attributes: &[Attribute], parent: &AttributePath, diags: &mut Diagnostics) {
    let mut seen = HashSet::new();
    for attr in attributes {
        let path = if parent.is_empty() {
            AttributePath::root(attr.name)
        } else {
            parent.attribute(attr.name)
        };

        if !is_valid_name(attr.name) {
            diags.add_attribute_error(
                path.clone(),
                "Invalid Attribute/Block Name",
                format!(
                    "Names must only contain lowercase alphanumeric characters or underscores and must not start with a digit, got: {:?}",
                    attr.name
                ),
            );
        }
        if !seen.insert(attr.name) {
            diags.add_attribute_error(
                path.clone(),
                "Duplicate Attribute Name",
                format!("Attribute {:?} is declared more than once.", attr.name),
            );
        }

        match (attr.required, attr.optional, attr.computed) {
            (false, false, false) => diags.add_attribute_error(
                path.clone(),
                "Invalid Attribute Definition",
                "Attribute must set one of Required, Optional, or Computed.",
            ),
            (true, true, _) | (true, _, true) => diags.add_attribute_error(
                path.clone(),
                "Invalid Attribute Definition",
                "Required attributes cannot also be Optional or Computed.",
            ),
            _ => {}
        }

        for validator in &attr.validators {
            if !validator.applies_to(&attr.kind) {
                diags.add_attribute_error(
                    path.clone(),
                    "Invalid Attribute Validator",
                    format!("Validator \"{}\" cannot be used on this attribute type.", validator.description()),
                );
            }
        }

        if let Some(nested) = attr.kind.nested() {
            if nested.is_empty() {
                diags.add_attribute_error(
                    path.clone(),
                    "Invalid Attribute Definition",
                    "Nested attributes must declare at least one attribute.",
                );
            }
            validate_attributes(nested, &path, diags);
        }
    }
}

fn attributes_require_replacement(attributes: &[Attribute], prior: &Value, plan: &Value) -> bool {
    attributes.iter().any(|attr| {
        let before = prior.get(attr.name).unwrap_or(&Value::Null);
        let after = plan.get(attr.name).unwrap_or(&Value::Null);
        if attr.requires_replace && before != after {
            return true;
        }
        match &attr.kind {
            AttributeKind::SingleNested(nested) => attributes_require_replacement(nested, before, after),
            _ => false,
        }
    })
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// `memory_evict_threshold_percent` -> `memoryEvictThresholdPercent`.
pub fn lower_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, part) in name.split('_').filter(|p| !p.is_empty()).enumerate() {
        if i == 0 {
            out.push_str(part);
            continue;
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
