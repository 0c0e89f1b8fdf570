use std::time::Duration;

use jsonpath_lib::Compiled;
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::{sleep, Instant};

use crate::client::{ObjectClient, ObjectRef};
use crate::errors::{Error, Result};

/// A JSONPath that must select something, optionally with a specific value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitCondition {
    pub jsonpath: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Compile a JSONPath, rooting paths without a leading `$` at `$.`.
pub fn compile(jsonpath: &str) -> Result<Compiled> {
    let path = if jsonpath.starts_with('$') {
        jsonpath.to_string()
    } else {
        format!("$.{}", jsonpath)
    };
    Compiled::compile(&path).map_err(|err| Error::JsonPathError(format!("{}: {}", jsonpath, err)))
}

impl WaitCondition {
    /// Met when the path selects at least one value, even `null`, and the
    /// first one matches `value` if that is set.
    pub fn is_met(&self, object: &Value) -> Result<bool> {
        let selected = compile(&self.jsonpath)?
            .select(object)
            .map_err(|err| Error::JsonPathError(format!("{}: {:?}", self.jsonpath, err)))?;
        let first = match selected.first() {
            Some(value) => *value,
            None => return Ok(false),
        };
        Ok(match &self.value {
            None => true,
            Some(expected) => scalar_string(first).as_deref() == Some(expected.as_str()),
        })
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Poll the object until every condition holds, returning the last object seen.
pub async fn wait_for(
    client: &dyn ObjectClient,
    target: &ObjectRef,
    conditions: &[WaitCondition],
    timeout: Duration,
    interval: Duration,
) -> Result<Value> {
    let deadline = Instant::now() + timeout;
    loop {
        let object = client.get(target).await?;
        let mut pending = None;
        for condition in conditions {
            if !condition.is_met(&object)? {
                pending = Some(condition);
                break;
            }
        }
        let condition = match pending {
            None => return Ok(object),
            Some(condition) => condition,
        };
        if Instant::now() >= deadline {
            return Err(Error::WaitTimeout(
                timeout,
                format!("{} on {}", condition.jsonpath, target),
            ));
        }
        debug!("{} not yet satisfied on {}", condition.jsonpath, target);
        sleep(interval).await;
    }
}
