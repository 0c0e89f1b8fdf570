//! Generic access to Kubernetes objects through the dynamic API.

use std::fmt;

use async_trait::async_trait;
use kube::api::{Api, DeleteParams, Patch, PatchParams, PropagationPolicy};
use kube::core::{ApiResource, DynamicObject};
use kube::Client;
use log::*;
use serde_json::Value;

use crate::errors::{Error, Result};

/// Address of a single object: which resource type, where, and its name.
#[derive(Clone, Debug)]
pub struct ObjectRef {
    pub resource: ApiResource,
    /// `None` for cluster scoped kinds.
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectRef {
    pub fn new(resource: ApiResource, namespace: Option<String>, name: String) -> Self {
        ObjectRef {
            resource,
            namespace,
            name,
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.resource.kind, ns, self.name),
            None => write!(f, "{} {}", self.resource.kind, self.name),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplyOptions {
    pub field_manager: String,
    pub force: bool,
}

/// The three verbs the provider needs. Objects travel as plain JSON.
#[async_trait]
pub trait ObjectClient: Send + Sync {
    async fn get(&self, target: &ObjectRef) -> Result<Value>;

    /// Server-side apply of `body`; returns the object as stored by the API server.
    async fn apply(&self, target: &ObjectRef, body: &Value, options: &ApplyOptions) -> Result<Value>;

    async fn delete(&self, target: &ObjectRef, propagation: Option<PropagationPolicy>) -> Result<()>;
}

pub struct KubeClient {
    client: Client,
}

impl KubeClient {
    pub fn new(client: Client) -> Self {
        KubeClient { client }
    }

    fn api(&self, target: &ObjectRef) -> Api<DynamicObject> {
        match &target.namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &target.resource),
            None => Api::all_with(self.client.clone(), &target.resource),
        }
    }
}

fn map_kube_error(target: &ObjectRef, err: kube::Error) -> Error {
    match err {
        kube::Error::Api(response) if response.code == 404 => Error::NotFound(target.to_string()),
        err => Error::KubeError(err),
    }
}

#[async_trait]
impl ObjectClient for KubeClient {
    async fn get(&self, target: &ObjectRef) -> Result<Value> {
        info!("getting {}", target);
        let obj = self
            .api(target)
            .get(&target.name)
            .await
            .map_err(|err| map_kube_error(target, err))?;
        serde_json::to_value(obj).map_err(Error::SerializationError)
    }

    async fn apply(&self, target: &ObjectRef, body: &Value, options: &ApplyOptions) -> Result<Value> {
        info!(
            "applying {} as {} (force: {})",
            target, options.field_manager, options.force
        );
        let mut params = PatchParams::apply(&options.field_manager);
        if options.force {
            params = params.force();
        }
        let obj = self
            .api(target)
            .patch(&target.name, &params, &Patch::Apply(body))
            .await
            .map_err(|err| map_kube_error(target, err))?;
        serde_json::to_value(obj).map_err(Error::SerializationError)
    }

    async fn delete(&self, target: &ObjectRef, propagation: Option<PropagationPolicy>) -> Result<()> {
        info!("deleting {}", target);
        let params = DeleteParams {
            propagation_policy: propagation,
            ..Default::default()
        };
        self.api(target)
            .delete(&target.name, &params)
            .await
            .map(|_| ())
            .map_err(|err| map_kube_error(target, err))
    }
}
