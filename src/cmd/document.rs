use std::fs;
use std::path::Path;

use anyhow::Context;
use serde_json::Value;

use crate::framework::{Diagnostics, Response};

/// Load a configuration or state document. YAML is a superset of JSON, so
/// both formats go through `serde_yaml`.
pub(crate) fn load(path: &Path) -> anyhow::Result<Value> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value = serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    if !value.is_object() {
        anyhow::bail!("{} must hold an object, got: {}", path.display(), value);
    }
    Ok(value)
}

/// Print diagnostics to stderr. Returns false when any of them is an error.
pub(crate) fn report(diagnostics: &Diagnostics) -> bool {
    if !diagnostics.is_empty() {
        eprintln!("{}\n", diagnostics);
    }
    !diagnostics.has_error()
}

/// Print the state of a response as JSON, or `null` once it is gone.
pub(crate) fn emit(response: &Response) -> anyhow::Result<bool> {
    let ok = report(&response.diagnostics);
    let state = response.state.clone().unwrap_or(Value::Null);
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(ok)
}
