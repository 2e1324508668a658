//! Spark-on-Kubernetes backend
//!
//! Tasks run as `SparkApplication` CRDs owned by the spark operator.
//! Submitting the CRD is the whole of `create`/`start`; from then on the
//! operator drives the workload and this executor only mirrors the
//! reported application state. Driver pods run under a namespaced `spark`
//! service account that is provisioned on demand.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{EnvVar, ServiceAccount};
use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::api::PostParams;
use kube::{Api, Client, CustomResource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use gantry_core::domain::task::PipelineTask;
use gantry_core::status::{PipelineStatus, PipelineStatusDesc};
use gantry_core::{Kind, Name};

use crate::error::{ExecutorError, ExecutorResult};
use crate::plugins::k8s::common::{
    bigdata_conf, cleanup_namespace, copy_image_pull_secret, ensure_namespace, is_already_exists,
    is_not_found, owner_reference_for, remove_workload, BigdataConf, BigdataResource, BigdataSpec,
    SparkConf,
};
use crate::transfer::{job_status, transfer_status};
use crate::types::{ActionExecutor, TaskPromise};

pub const KIND: &str = "K8SSPARK";

/// Operator version line the generated specs target
const SPARK_VERSION: &str = "2.4.0";
const IMAGE_PULL_POLICY: &str = "Always";
const RESTART_POLICY_NEVER: &str = "Never";
const APP_TYPE_PYTHON: &str = "Python";
const DEFAULT_PYTHON_VERSION: &str = "3";

/// Per-namespace identity the driver pod submits executors with
const SPARK_SERVICE_ACCOUNT: &str = "spark";
const SPARK_ROLE: &str = "spark-role";
const SPARK_ROLE_BINDING: &str = "spark-role-binding";
const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

/// Resource envelope surfaced to the workload containers
const ENV_CPU_LIMIT: &str = "GANTRY_CPU_LIMIT";
const ENV_MEM_LIMIT: &str = "GANTRY_MEM_LIMIT";

/// Application states reported by the spark operator
pub mod app_state {
    /// The operator has not picked the application up yet
    pub const NEW: &str = "";
    pub const SUBMITTED: &str = "SUBMITTED";
    pub const RUNNING: &str = "RUNNING";
    pub const COMPLETED: &str = "COMPLETED";
    pub const SUCCEEDING: &str = "SUCCEEDING";
    pub const FAILING: &str = "FAILING";
    pub const FAILED: &str = "FAILED";
    pub const SUBMISSION_FAILED: &str = "SUBMISSION_FAILED";
    pub const INVALIDATING: &str = "INVALIDATING";
    pub const PENDING_RERUN: &str = "PENDING_RERUN";
    pub const UNKNOWN: &str = "UNKNOWN";
}

/// `sparkoperator.k8s.io/v1beta2 SparkApplication`
#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize)]
#[kube(
    group = "sparkoperator.k8s.io",
    version = "v1beta2",
    kind = "SparkApplication",
    namespaced,
    status = "SparkApplicationStatus",
    schema = "disabled"
)]
#[serde(default, rename_all = "camelCase")]
pub struct SparkApplicationSpec {
    /// Application type, e.g. "Java", "Scala" or "Python"
    #[serde(rename = "type")]
    pub type_: String,
    /// Deploy mode, "cluster" or "client"
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_pull_secrets: Option<Vec<String>>,
    pub spark_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_application_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spark_conf: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deps: Option<SparkDependencies>,
    pub restart_policy: SparkRestartPolicy,
    pub driver: SparkDriverSpec,
    pub executor: SparkExecutorSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SparkRestartPolicy {
    #[serde(rename = "type")]
    pub type_: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SparkDependencies {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub py_files: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SparkDriverSpec {
    #[serde(flatten)]
    pub pod: SparkPodSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SparkExecutorSpec {
    #[serde(flatten)]
    pub pod: SparkPodSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instances: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SparkPodSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cores: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_overhead: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SparkApplicationStatus {
    pub application_state: SparkApplicationState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SparkApplicationState {
    pub state: String,
    pub error_message: String,
}

/// Maps an operator application state onto the backend status vocabulary
fn app_state_to_backend(state: &str) -> &'static str {
    match state {
        app_state::NEW | app_state::SUBMITTED => job_status::UNSCHEDULABLE,
        app_state::RUNNING => job_status::RUNNING,
        app_state::COMPLETED | app_state::SUCCEEDING => job_status::STOPPED_ON_OK,
        app_state::FAILING
        | app_state::FAILED
        | app_state::SUBMISSION_FAILED
        | app_state::INVALIDATING
        | app_state::PENDING_RERUN => job_status::STOPPED_ON_FAILED,
        _ => job_status::UNKNOWN,
    }
}

fn spark_labels() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("job-type".to_string(), "k8s-spark".to_string()),
        ("spark-version".to_string(), SPARK_VERSION.to_string()),
    ])
}

/// Resolves the entry file the operator should submit
///
/// `local://` and `http(s)://` URLs pass through; a bare absolute path is
/// taken as a file baked into the image.
fn main_application_file(spec: &BigdataSpec) -> ExecutorResult<String> {
    let resource = spec.resource.as_str();
    if resource.starts_with("local://")
        || resource.starts_with("http://")
        || resource.starts_with("https://")
    {
        return Ok(resource.to_string());
    }
    if resource.starts_with('/') {
        return Ok(format!("local://{}", resource));
    }
    Err(ExecutorError::InvalidSpec(format!(
        "spark resource {} must be a local://, http(s):// or absolute in-image path",
        resource
    )))
}

fn compose_pod_spec(conf: &BigdataConf, resource: &BigdataResource) -> SparkPodSpec {
    let cores = resource.cpu.parse::<i32>().map(|c| c.max(1)).unwrap_or(1);
    let core_limit = if resource.max_cpu.is_empty() {
        cores.to_string()
    } else {
        resource.max_cpu.clone()
    };

    let mut env = conf.spec.envs.clone();
    env.push(EnvVar {
        name: ENV_CPU_LIMIT.to_string(),
        value: Some(core_limit.clone()),
        ..Default::default()
    });
    env.push(EnvVar {
        name: ENV_MEM_LIMIT.to_string(),
        value: Some(resource.memory.clone()),
        ..Default::default()
    });
    // older operator versions only read the envVars map, fill both forms
    let env_vars: BTreeMap<String, String> = env
        .iter()
        .map(|e| (e.name.clone(), e.value.clone().unwrap_or_default()))
        .collect();

    SparkPodSpec {
        cores: Some(cores),
        core_limit: Some(core_limit),
        memory: (!resource.memory.is_empty()).then(|| resource.memory.clone()),
        memory_overhead: (!resource.max_memory.is_empty()).then(|| resource.max_memory.clone()),
        labels: Some(spark_labels()),
        env: Some(env),
        env_vars: Some(env_vars),
    }
}

/// Builds the application CRD for one task from its bigdata config
fn generate_spark_application(
    conf: &BigdataConf,
    spark: &SparkConf,
    image_pull_secret: Option<String>,
    owner: OwnerReference,
) -> ExecutorResult<SparkApplication> {
    let main_file = main_application_file(&conf.spec)?;

    let mut spec = SparkApplicationSpec {
        type_: spark.type_.clone(),
        mode: spark.kind.clone(),
        image: Some(conf.spec.image.clone()),
        image_pull_policy: Some(IMAGE_PULL_POLICY.to_string()),
        image_pull_secrets: image_pull_secret.map(|name| vec![name]),
        spark_version: SPARK_VERSION.to_string(),
        main_class: (!conf.spec.class.is_empty()).then(|| conf.spec.class.clone()),
        main_application_file: Some(main_file),
        python_version: None,
        arguments: (!conf.spec.args.is_empty()).then(|| conf.spec.args.clone()),
        spark_conf: conf.spec.properties.clone(),
        deps: (!spark.deps.py_files.is_empty()).then(|| SparkDependencies {
            py_files: Some(spark.deps.py_files.clone()),
        }),
        restart_policy: SparkRestartPolicy {
            type_: RESTART_POLICY_NEVER.to_string(),
        },
        driver: SparkDriverSpec {
            pod: compose_pod_spec(conf, &spark.driver_resource),
            service_account: Some(SPARK_SERVICE_ACCOUNT.to_string()),
        },
        executor: SparkExecutorSpec {
            pod: compose_pod_spec(conf, &spark.executor_resource),
            instances: Some(spark.executor_resource.replica.max(1)),
        },
    };
    if spec.type_ == APP_TYPE_PYTHON {
        spec.python_version = Some(
            spark
                .python_version
                .clone()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_PYTHON_VERSION.to_string()),
        );
    }

    let mut app = SparkApplication::new(&conf.name, spec);
    app.metadata.namespace = Some(conf.namespace.clone());
    app.metadata.labels = Some(spark_labels());
    app.metadata.owner_references = Some(vec![owner]);
    Ok(app)
}

/// Executor that runs tasks as spark-operator applications
pub struct K8sSparkExecutor {
    kind: Kind,
    name: Name,
    client: Client,
}

impl K8sSparkExecutor {
    /// Connects with in-cluster config when available, kubeconfig otherwise
    pub async fn new(name: Name, _options: &HashMap<String, String>) -> anyhow::Result<Self> {
        Ok(Self {
            kind: Kind::new(KIND)?,
            name,
            client: Client::try_default().await?,
        })
    }

    fn validate(&self, task: &PipelineTask) -> ExecutorResult<()> {
        if task.extra.namespace.is_empty() {
            return Err(ExecutorError::MissingNamespace);
        }
        if task.extra.uuid.is_empty() {
            return Err(ExecutorError::MissingUuid);
        }
        Ok(())
    }

    fn apps(&self, namespace: &str) -> Api<SparkApplication> {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn ensure_spark_rbac(&self, namespace: &str) -> ExecutorResult<()> {
        self.ensure_service_account(namespace).await?;
        self.ensure_role(namespace).await?;
        self.ensure_role_binding(namespace).await
    }

    async fn ensure_service_account(&self, namespace: &str) -> ExecutorResult<()> {
        let api: Api<ServiceAccount> = Api::namespaced(self.client.clone(), namespace);
        match api.get(SPARK_SERVICE_ACCOUNT).await {
            Ok(_) => return Ok(()),
            Err(e) if is_not_found(&e) => {}
            Err(e) => return Err(e.into()),
        }
        let account = ServiceAccount {
            metadata: ObjectMeta {
                name: Some(SPARK_SERVICE_ACCOUNT.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        match api.create(&PostParams::default(), &account).await {
            Ok(_) => Ok(()),
            Err(e) if is_already_exists(&e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// The driver needs to manage pods, services and configmaps in its
    /// own namespace to spawn executors
    async fn ensure_role(&self, namespace: &str) -> ExecutorResult<()> {
        let api: Api<Role> = Api::namespaced(self.client.clone(), namespace);
        match api.get(SPARK_ROLE).await {
            Ok(_) => return Ok(()),
            Err(e) if is_not_found(&e) => {}
            Err(e) => return Err(e.into()),
        }
        let role = Role {
            metadata: ObjectMeta {
                name: Some(SPARK_ROLE.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            rules: Some(vec![PolicyRule {
                api_groups: Some(vec![String::new()]),
                resources: Some(vec![
                    "pods".to_string(),
                    "services".to_string(),
                    "configmaps".to_string(),
                ]),
                verbs: vec!["*".to_string()],
                ..Default::default()
            }]),
        };
        match api.create(&PostParams::default(), &role).await {
            Ok(_) => Ok(()),
            Err(e) if is_already_exists(&e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_role_binding(&self, namespace: &str) -> ExecutorResult<()> {
        let api: Api<RoleBinding> = Api::namespaced(self.client.clone(), namespace);
        match api.get(SPARK_ROLE_BINDING).await {
            Ok(_) => return Ok(()),
            Err(e) if is_not_found(&e) => {}
            Err(e) => return Err(e.into()),
        }
        let binding = RoleBinding {
            metadata: ObjectMeta {
                name: Some(SPARK_ROLE_BINDING.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            role_ref: RoleRef {
                api_group: RBAC_API_GROUP.to_string(),
                kind: "Role".to_string(),
                name: SPARK_ROLE.to_string(),
            },
            subjects: Some(vec![Subject {
                kind: "ServiceAccount".to_string(),
                name: SPARK_SERVICE_ACCOUNT.to_string(),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            }]),
        };
        match api.create(&PostParams::default(), &binding).await {
            Ok(_) => Ok(()),
            Err(e) if is_already_exists(&e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ActionExecutor for K8sSparkExecutor {
    fn kind(&self) -> Kind {
        self.kind.clone()
    }

    fn name(&self) -> Name {
        self.name.clone()
    }

    async fn create(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        self.validate(task)?;
        let conf = bigdata_conf(task)?;
        let spark = conf.spec.spark_conf.clone().ok_or_else(|| {
            ExecutorError::InvalidSpec("bigdata conf is missing the sparkConf section".to_string())
        })?;

        let ns = ensure_namespace(&self.client, &conf.namespace).await?;
        let pull_secret = copy_image_pull_secret(&self.client, &conf.namespace).await?;
        self.ensure_spark_rbac(&conf.namespace).await?;

        let app = generate_spark_application(&conf, &spark, pull_secret, owner_reference_for(&ns))?;
        match self.apps(&conf.namespace).create(&PostParams::default(), &app).await {
            Ok(_) => debug!("created spark application {}/{}", conf.namespace, conf.name),
            Err(e) if is_already_exists(&e) => warn!(
                "spark application {}/{} already exists, take create as success",
                conf.namespace, conf.name
            ),
            Err(e) => return Err(e.into()),
        }
        Ok(serde_json::to_value(&conf)?)
    }

    /// The operator picks the application up on its own once the CRD is
    /// in place, so starting reduces to making sure it was created
    async fn start(&self, task: &PipelineTask, _promise: TaskPromise) -> ExecutorResult<Value> {
        self.validate(task)?;
        let existence = self.exist(task).await?;
        if !existence.created {
            warn!(
                "spark application not created yet, create before start, task {}",
                task.id
            );
            return self.create(task).await;
        }
        if existence.started {
            warn!("spark application already started, task {}", task.id);
        }
        Ok(Value::Null)
    }

    async fn status(&self, task: &PipelineTask) -> ExecutorResult<PipelineStatusDesc> {
        self.validate(task)?;
        let app = match self.apps(&task.extra.namespace).get(&task.extra.uuid).await {
            Ok(app) => app,
            Err(e) if is_not_found(&e) => {
                warn!(
                    "spark application {}/{} not found in cluster",
                    task.extra.namespace, task.extra.uuid
                );
                return Ok(PipelineStatusDesc::new(PipelineStatus::NotFoundInCluster, ""));
            }
            Err(e) => return Err(e.into()),
        };

        let state = app.status.map(|s| s.application_state).unwrap_or_default();
        let backend = app_state_to_backend(&state.state);
        let mut desc = state.error_message;
        if backend == job_status::UNKNOWN && state.state != app_state::UNKNOWN {
            desc = format!("unknown status, spark app state: {:?}", state.state);
        }
        let status = transfer_status(backend);
        debug!(
            "spark application {}/{} status: {:?} -> {}",
            task.extra.namespace, task.extra.uuid, state.state, status
        );
        Ok(PipelineStatusDesc::new(status, desc))
    }

    async fn cancel(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        self.remove(task).await
    }

    async fn remove(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        remove_workload::<SparkApplication>(&self.client, task).await
    }

    async fn delete_namespace(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        cleanup_namespace::<SparkApplication>(&self.client, task).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python_conf() -> BigdataConf {
        let raw = r#"{
            "image": "registry/py-runner:v2",
            "resource": "/app/main.py",
            "args": ["--date", "2024-01-01"],
            "envs": [{"name": "PROFILE", "value": "prod"}],
            "sparkConf": {
                "kind": "cluster",
                "type": "Python",
                "deps": {"pyFiles": ["local:///app/lib.zip"]},
                "driverResource": {"cpu": "1", "memory": "1024m"},
                "executorResource": {"replica": 2, "cpu": "2", "memory": "2048m", "maxCPU": "4", "maxMemory": "4096m"}
            }
        }"#;
        BigdataConf {
            name: "u100".to_string(),
            namespace: "pipeline-100".to_string(),
            spec: serde_json::from_str(raw).unwrap(),
        }
    }

    fn namespace_owner(name: &str) -> OwnerReference {
        OwnerReference {
            api_version: "v1".to_string(),
            kind: "Namespace".to_string(),
            name: name.to_string(),
            uid: "ns-uid".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_app_state_mapping() {
        let cases = [
            (app_state::NEW, job_status::UNSCHEDULABLE),
            (app_state::SUBMITTED, job_status::UNSCHEDULABLE),
            (app_state::RUNNING, job_status::RUNNING),
            (app_state::COMPLETED, job_status::STOPPED_ON_OK),
            (app_state::SUCCEEDING, job_status::STOPPED_ON_OK),
            (app_state::FAILING, job_status::STOPPED_ON_FAILED),
            (app_state::FAILED, job_status::STOPPED_ON_FAILED),
            (app_state::SUBMISSION_FAILED, job_status::STOPPED_ON_FAILED),
            (app_state::INVALIDATING, job_status::STOPPED_ON_FAILED),
            (app_state::PENDING_RERUN, job_status::STOPPED_ON_FAILED),
            (app_state::UNKNOWN, job_status::UNKNOWN),
            ("SOMETHING_ELSE", job_status::UNKNOWN),
        ];
        for (state, expected) in cases {
            assert_eq!(app_state_to_backend(state), expected, "state {:?}", state);
        }
    }

    #[test]
    fn test_main_application_file() {
        let mut spec = BigdataSpec::default();

        spec.resource = "local:///opt/app.jar".to_string();
        assert_eq!(main_application_file(&spec).unwrap(), "local:///opt/app.jar");

        spec.resource = "https://repo.test/app.jar".to_string();
        assert_eq!(
            main_application_file(&spec).unwrap(),
            "https://repo.test/app.jar"
        );

        spec.resource = "/opt/app.jar".to_string();
        assert_eq!(main_application_file(&spec).unwrap(), "local:///opt/app.jar");

        spec.resource = "relative/app.jar".to_string();
        assert!(matches!(
            main_application_file(&spec),
            Err(ExecutorError::InvalidSpec(_))
        ));
    }

    #[test]
    fn test_compose_pod_spec_clamps_and_mirrors_envs() {
        let conf = BigdataConf::default();
        let resource = BigdataResource {
            cpu: "0".to_string(),
            memory: "512m".to_string(),
            ..Default::default()
        };

        let pod = compose_pod_spec(&conf, &resource);
        assert_eq!(pod.cores, Some(1));
        assert_eq!(pod.core_limit.as_deref(), Some("1"));
        assert_eq!(pod.memory.as_deref(), Some("512m"));
        assert_eq!(pod.memory_overhead, None);

        let env_vars = pod.env_vars.unwrap();
        assert_eq!(env_vars.get(ENV_CPU_LIMIT).map(String::as_str), Some("1"));
        assert_eq!(
            env_vars.get(ENV_MEM_LIMIT).map(String::as_str),
            Some("512m")
        );
    }

    #[test]
    fn test_generate_spark_application() {
        let conf = python_conf();
        let spark = conf.spec.spark_conf.clone().unwrap();

        let app = generate_spark_application(
            &conf,
            &spark,
            Some("gantry-regcred".to_string()),
            namespace_owner(&conf.namespace),
        )
        .unwrap();

        assert_eq!(app.metadata.name.as_deref(), Some("u100"));
        assert_eq!(app.metadata.namespace.as_deref(), Some("pipeline-100"));
        assert_eq!(app.spec.type_, "Python");
        assert_eq!(app.spec.mode, "cluster");
        assert_eq!(app.spec.spark_version, SPARK_VERSION);
        assert_eq!(app.spec.python_version.as_deref(), Some("3"));
        assert_eq!(
            app.spec.main_application_file.as_deref(),
            Some("local:///app/main.py")
        );
        assert_eq!(
            app.spec.image_pull_secrets,
            Some(vec!["gantry-regcred".to_string()])
        );
        assert_eq!(app.spec.restart_policy.type_, "Never");
        assert_eq!(app.spec.driver.service_account.as_deref(), Some("spark"));
        assert_eq!(app.spec.executor.instances, Some(2));
        assert_eq!(app.spec.executor.pod.cores, Some(2));
        assert_eq!(app.spec.executor.pod.core_limit.as_deref(), Some("4"));
        assert_eq!(
            app.spec.executor.pod.memory_overhead.as_deref(),
            Some("4096m")
        );
        assert_eq!(
            app.spec.deps.unwrap().py_files,
            Some(vec!["local:///app/lib.zip".to_string()])
        );

        let owners = app.metadata.owner_references.unwrap();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].kind, "Namespace");
    }

    #[test]
    fn test_generate_java_application_keeps_python_version_unset() {
        let mut conf = python_conf();
        let mut spark = conf.spec.spark_conf.clone().unwrap();
        spark.type_ = "Java".to_string();
        conf.spec.class = "io.gantry.WordCount".to_string();

        let app =
            generate_spark_application(&conf, &spark, None, namespace_owner(&conf.namespace))
                .unwrap();
        assert_eq!(app.spec.python_version, None);
        assert_eq!(app.spec.main_class.as_deref(), Some("io.gantry.WordCount"));
        assert_eq!(app.spec.image_pull_secrets, None);
    }
}
