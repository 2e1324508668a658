//! Shared Kubernetes plumbing for the CRD-backed executors

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{EnvVar, Namespace, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use k8s_openapi::NamespaceResourceScope;
use kube::api::{DeleteParams, ListParams, PostParams};
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use gantry_core::domain::task::PipelineTask;

use crate::error::{ExecutorError, ExecutorResult};

/// Action param key holding the serialized bigdata config
pub const BIGDATA_CONF_PARAM: &str = "bigDataConf";

/// Env var naming the namespace that holds platform-owned secrets
const ENV_PLATFORM_NAMESPACE: &str = "GANTRY_NAMESPACE";
const DEFAULT_PLATFORM_NAMESPACE: &str = "default";

/// Env var naming the registry credential secret copied into job namespaces
const ENV_IMAGE_PULL_SECRET: &str = "IMAGE_PULL_SECRET";
const DEFAULT_IMAGE_PULL_SECRET: &str = "gantry-regcred";

pub fn platform_namespace() -> String {
    std::env::var(ENV_PLATFORM_NAMESPACE)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_PLATFORM_NAMESPACE.to_string())
}

pub fn image_pull_secret_name() -> String {
    std::env::var(ENV_IMAGE_PULL_SECRET)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_IMAGE_PULL_SECRET.to_string())
}

pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 404)
}

pub fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.code == 409)
}

/// Fetches the task namespace, creating it on first use
pub async fn ensure_namespace(client: &Client, namespace: &str) -> ExecutorResult<Namespace> {
    let api: Api<Namespace> = Api::all(client.clone());
    match api.get(namespace).await {
        Ok(ns) => Ok(ns),
        Err(e) if is_not_found(&e) => {
            debug!("create namespace {}", namespace);
            let ns = Namespace {
                metadata: ObjectMeta {
                    name: Some(namespace.to_string()),
                    ..Default::default()
                },
                ..Default::default()
            };
            Ok(api.create(&PostParams::default(), &ns).await?)
        }
        Err(e) => Err(e.into()),
    }
}

/// Owner reference pointing at the task namespace
///
/// Workload CRDs carry this so that deleting the namespace cascades to
/// everything the pipeline put in it.
pub fn owner_reference_for(namespace: &Namespace) -> OwnerReference {
    OwnerReference {
        api_version: "v1".to_string(),
        kind: "Namespace".to_string(),
        name: namespace.metadata.name.clone().unwrap_or_default(),
        uid: namespace.metadata.uid.clone().unwrap_or_default(),
        ..Default::default()
    }
}

/// Copies the registry credential secret into the job namespace
///
/// Returns the secret name to reference in image-pull-secrets, or `None`
/// when the platform namespace has no such secret; jobs then pull
/// anonymously instead of failing up front.
pub async fn copy_image_pull_secret(
    client: &Client,
    namespace: &str,
) -> ExecutorResult<Option<String>> {
    let name = image_pull_secret_name();
    let target: Api<Secret> = Api::namespaced(client.clone(), namespace);
    match target.get(&name).await {
        Ok(_) => return Ok(Some(name)),
        Err(e) if is_not_found(&e) => {}
        Err(e) => return Err(e.into()),
    }

    let source: Api<Secret> = Api::namespaced(client.clone(), &platform_namespace());
    let origin = match source.get(&name).await {
        Ok(secret) => secret,
        Err(e) if is_not_found(&e) => {
            warn!(
                "image pull secret {} not found in namespace {}, jobs in {} will pull anonymously",
                name,
                platform_namespace(),
                namespace
            );
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let copy = Secret {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: origin.data.clone(),
        type_: origin.type_.clone(),
        ..Default::default()
    };
    match target.create(&PostParams::default(), &copy).await {
        Ok(_) => Ok(Some(name)),
        Err(e) if is_already_exists(&e) => Ok(Some(name)),
        Err(e) => Err(e.into()),
    }
}

/// Deletes a namespace, tolerating ones already gone or terminating
pub async fn delete_namespace_if_present(client: &Client, namespace: &str) -> ExecutorResult<()> {
    let api: Api<Namespace> = Api::all(client.clone());
    let ns = match api.get(namespace).await {
        Ok(ns) => ns,
        Err(e) if is_not_found(&e) => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    if ns.metadata.deletion_timestamp.is_some() {
        debug!("namespace {} is already terminating", namespace);
        return Ok(());
    }
    match api.delete(namespace, &DeleteParams::default()).await {
        Ok(_) => {
            debug!("deleted namespace {}", namespace);
            Ok(())
        }
        Err(e) if is_not_found(&e) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Removes the workload CRD addressed by a task, tolerating ones already
/// gone
///
/// A task that never got a UUID owns nothing but its namespace, so only
/// the namespace is cleaned up for it.
pub async fn remove_workload<K>(client: &Client, task: &PipelineTask) -> ExecutorResult<Value>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + std::fmt::Debug,
{
    if task.extra.namespace.is_empty() {
        return Err(ExecutorError::MissingNamespace);
    }
    if task.extra.uuid.is_empty() {
        if task.extra.not_pipeline_controlled_ns {
            return Ok(Value::Null);
        }
        delete_namespace_if_present(client, &task.extra.namespace).await?;
        return Ok(Value::Null);
    }

    let api: Api<K> = Api::namespaced(client.clone(), &task.extra.namespace);
    match api.get(&task.extra.uuid).await {
        Ok(_) => {}
        Err(e) if is_not_found(&e) => return Ok(Value::Null),
        Err(e) => return Err(e.into()),
    }
    match api.delete(&task.extra.uuid, &DeleteParams::default()).await {
        Ok(_) => Ok(Value::Null),
        Err(e) if is_not_found(&e) => Ok(Value::Null),
        Err(e) => Err(e.into()),
    }
}

/// Deletes the task namespace once no workload of kind `K` remains in it
pub async fn cleanup_namespace<K>(client: &Client, task: &PipelineTask) -> ExecutorResult<Value>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + std::fmt::Debug,
{
    if task.extra.namespace.is_empty() {
        return Err(ExecutorError::MissingNamespace);
    }
    if task.extra.not_pipeline_controlled_ns {
        warn!(
            "namespace {} is not controlled by the pipeline, skip cleanup",
            task.extra.namespace
        );
        return Ok(Value::Null);
    }

    let api: Api<K> = Api::namespaced(client.clone(), &task.extra.namespace);
    let workloads = api.list(&ListParams::default()).await?;
    let remaining = workloads
        .items
        .iter()
        .filter(|w| w.meta().deletion_timestamp.is_none())
        .count();
    if remaining > 0 {
        return Err(ExecutorError::NamespaceBusy {
            namespace: task.extra.namespace.clone(),
            remaining,
        });
    }
    delete_namespace_if_present(client, &task.extra.namespace).await?;
    Ok(Value::Null)
}

/// Bigdata workload config carried in a task's action params
///
/// `name`/`namespace` come from the task itself; only `spec` is read from
/// the param payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BigdataConf {
    pub name: String,
    pub namespace: String,
    pub spec: BigdataSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BigdataSpec {
    pub image: String,
    pub class: String,
    /// Main application file (jar or python entry): `local://...`,
    /// `http(s)://...`, or an absolute in-image path
    pub resource: String,
    pub args: Vec<String>,
    pub envs: Vec<EnvVar>,
    pub properties: Option<BTreeMap<String, String>>,
    pub flink_conf: Option<FlinkConf>,
    pub spark_conf: Option<SparkConf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlinkConf {
    /// "job" for an ephemeral job cluster, "session" for a long-running one
    pub kind: String,
    pub parallelism: i32,
    pub job_manager_resource: BigdataResource,
    pub task_manager_resource: BigdataResource,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SparkConf {
    /// Deploy mode, "cluster" or "client"
    pub kind: String,
    /// Application type, e.g. "Java", "Scala" or "Python"
    #[serde(rename = "type")]
    pub type_: String,
    pub python_version: Option<String>,
    pub deps: SparkDeps,
    pub driver_resource: BigdataResource,
    pub executor_resource: BigdataResource,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SparkDeps {
    pub py_files: Vec<String>,
}

/// Replica/CPU/memory envelope for one bigdata component
///
/// CPU and memory stay strings: they are passed through to the operator
/// verbatim (e.g. "1", "2048m").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BigdataResource {
    pub replica: i32,
    pub cpu: String,
    pub memory: String,
    #[serde(rename = "maxCPU")]
    pub max_cpu: String,
    pub max_memory: String,
}

/// Extracts the bigdata config from a task
///
/// The param value is usually a JSON string (doubly encoded by the
/// definition layer); an inline object is accepted too.
pub fn bigdata_conf(task: &PipelineTask) -> ExecutorResult<BigdataConf> {
    let value = task
        .extra
        .action_params
        .get(BIGDATA_CONF_PARAM)
        .ok_or_else(|| {
            ExecutorError::InvalidSpec(format!(
                "task is missing the {} action param",
                BIGDATA_CONF_PARAM
            ))
        })?;
    let spec: BigdataSpec = match value {
        Value::String(raw) => serde_json::from_str(raw)?,
        other => serde_json::from_value(other.clone())?,
    };
    Ok(BigdataConf {
        name: task.extra.uuid.clone(),
        namespace: task.extra.namespace.clone(),
        spec,
    })
}
