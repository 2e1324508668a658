//! Flink-on-Kubernetes backend
//!
//! Tasks run as `FlinkCluster` CRDs owned by the flink operator. A config
//! with kind `job` produces an ephemeral job cluster whose progress is the
//! job's own state; any other kind produces a session cluster judged by
//! the cluster state alone.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{EnvVar, LocalObjectReference, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
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
    is_not_found, owner_reference_for, remove_workload, BigdataConf, BigdataResource, FlinkConf,
};
use crate::transfer::{job_status, transfer_status};
use crate::types::{ActionExecutor, TaskPromise};

pub const KIND: &str = "K8SFLINK";

/// Config kind selecting an ephemeral job cluster
const FLINK_KIND_JOB: &str = "job";
const IMAGE_PULL_POLICY: &str = "Always";
const ACCESS_SCOPE_CLUSTER: &str = "Cluster";
const JOB_RESTART_POLICY_NEVER: &str = "Never";

/// Cluster states reported by the flink operator
pub mod cluster_state {
    pub const CREATING: &str = "Creating";
    pub const RUNNING: &str = "Running";
    pub const RECONCILING: &str = "Reconciling";
    pub const UPDATING: &str = "Updating";
    pub const STOPPING: &str = "Stopping";
    pub const PARTIALLY_STOPPED: &str = "PartiallyStopped";
    pub const STOPPED: &str = "Stopped";
}

/// Job states reported by the flink operator
pub mod job_state {
    pub const PENDING: &str = "Pending";
    pub const RUNNING: &str = "Running";
    pub const UPDATING: &str = "Updating";
    pub const SUCCEEDED: &str = "Succeeded";
    pub const FAILED: &str = "Failed";
    pub const CANCELLED: &str = "Cancelled";
    pub const UNKNOWN: &str = "Unknown";
}

/// `flinkoperator.k8s.io/v1beta1 FlinkCluster`
#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize)]
#[kube(
    group = "flinkoperator.k8s.io",
    version = "v1beta1",
    kind = "FlinkCluster",
    namespaced,
    status = "FlinkClusterStatus",
    schema = "disabled"
)]
#[serde(default, rename_all = "camelCase")]
pub struct FlinkClusterSpec {
    pub image: FlinkImageSpec,
    pub job_manager: FlinkJobManagerSpec,
    pub task_manager: FlinkTaskManagerSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<FlinkJobSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_vars: Option<Vec<EnvVar>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flink_properties: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlinkImageSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_secrets: Option<Vec<LocalObjectReference>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlinkJobManagerSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    pub access_scope: String,
    pub resources: ResourceRequirements,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlinkTaskManagerSpec {
    pub replicas: i32,
    pub resources: ResourceRequirements,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlinkJobSpec {
    pub jar_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlinkClusterStatus {
    pub state: String,
    pub components: FlinkClusterComponents,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlinkClusterComponents {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<FlinkJobStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlinkJobStatus {
    pub name: String,
    pub id: String,
    pub state: String,
}

/// Maps the operator job state onto the backend status vocabulary
fn job_state_to_backend(state: &str) -> &'static str {
    match state {
        job_state::PENDING => job_status::UNSCHEDULABLE,
        job_state::RUNNING | job_state::UPDATING => job_status::RUNNING,
        job_state::SUCCEEDED => job_status::STOPPED_ON_OK,
        job_state::FAILED => job_status::STOPPED_ON_FAILED,
        job_state::CANCELLED => job_status::STOPPED_BY_KILLED,
        _ => job_status::UNKNOWN,
    }
}

/// Session clusters have no terminal success: a stopped cluster went away
/// without being asked to
fn cluster_state_to_backend(state: &str) -> &'static str {
    match state {
        // the operator leaves the state empty until it has reconciled
        "" | cluster_state::CREATING => job_status::UNSCHEDULABLE,
        cluster_state::RUNNING
        | cluster_state::RECONCILING
        | cluster_state::UPDATING
        | cluster_state::STOPPING
        | cluster_state::PARTIALLY_STOPPED => job_status::RUNNING,
        cluster_state::STOPPED => job_status::STOPPED_ON_FAILED,
        _ => job_status::UNKNOWN,
    }
}

/// Same quantities for requests and limits, the operator does not
/// distinguish them for pipeline workloads
fn resource_requirements(resource: &BigdataResource) -> ResourceRequirements {
    let mut quantities = BTreeMap::new();
    if !resource.cpu.is_empty() {
        quantities.insert("cpu".to_string(), Quantity(resource.cpu.clone()));
    }
    if !resource.memory.is_empty() {
        quantities.insert("memory".to_string(), Quantity(resource.memory.clone()));
    }
    ResourceRequirements {
        limits: Some(quantities.clone()),
        requests: Some(quantities),
        ..Default::default()
    }
}

/// Builds the cluster CRD for one task from its bigdata config
fn generate_flink_cluster(
    conf: &BigdataConf,
    flink: &FlinkConf,
    image_pull_secret: Option<String>,
    owner: OwnerReference,
) -> FlinkCluster {
    let job = (flink.kind == FLINK_KIND_JOB).then(|| FlinkJobSpec {
        jar_file: conf.spec.resource.clone(),
        class_name: (!conf.spec.class.is_empty()).then(|| conf.spec.class.clone()),
        args: (!conf.spec.args.is_empty()).then(|| conf.spec.args.clone()),
        parallelism: Some(flink.parallelism.max(1)),
        restart_policy: Some(JOB_RESTART_POLICY_NEVER.to_string()),
    });

    let spec = FlinkClusterSpec {
        image: FlinkImageSpec {
            name: conf.spec.image.clone(),
            pull_policy: Some(IMAGE_PULL_POLICY.to_string()),
            pull_secrets: image_pull_secret
                .map(|name| vec![LocalObjectReference { name: Some(name) }]),
        },
        job_manager: FlinkJobManagerSpec {
            replicas: Some(flink.job_manager_resource.replica.max(1)),
            access_scope: ACCESS_SCOPE_CLUSTER.to_string(),
            resources: resource_requirements(&flink.job_manager_resource),
        },
        task_manager: FlinkTaskManagerSpec {
            replicas: flink.task_manager_resource.replica.max(1),
            resources: resource_requirements(&flink.task_manager_resource),
        },
        job,
        env_vars: (!conf.spec.envs.is_empty()).then(|| conf.spec.envs.clone()),
        flink_properties: conf.spec.properties.clone(),
    };

    let mut cluster = FlinkCluster::new(&conf.name, spec);
    cluster.metadata.namespace = Some(conf.namespace.clone());
    cluster.metadata.owner_references = Some(vec![owner]);
    cluster
}

/// Executor that runs tasks as flink-operator clusters
pub struct K8sFlinkExecutor {
    kind: Kind,
    name: Name,
    client: Client,
}

impl K8sFlinkExecutor {
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

    fn clusters(&self, namespace: &str) -> Api<FlinkCluster> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ActionExecutor for K8sFlinkExecutor {
    fn kind(&self) -> Kind {
        self.kind.clone()
    }

    fn name(&self) -> Name {
        self.name.clone()
    }

    async fn create(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        self.validate(task)?;
        let conf = bigdata_conf(task)?;
        let flink = conf.spec.flink_conf.clone().ok_or_else(|| {
            ExecutorError::InvalidSpec("bigdata conf is missing the flinkConf section".to_string())
        })?;

        let ns = ensure_namespace(&self.client, &conf.namespace).await?;
        let pull_secret = copy_image_pull_secret(&self.client, &conf.namespace).await?;

        let cluster = generate_flink_cluster(&conf, &flink, pull_secret, owner_reference_for(&ns));
        match self
            .clusters(&conf.namespace)
            .create(&PostParams::default(), &cluster)
            .await
        {
            Ok(_) => debug!("created flink cluster {}/{}", conf.namespace, conf.name),
            Err(e) if is_already_exists(&e) => warn!(
                "flink cluster {}/{} already exists, take create as success",
                conf.namespace, conf.name
            ),
            Err(e) => return Err(e.into()),
        }
        Ok(serde_json::to_value(&conf)?)
    }

    /// The operator picks the cluster up on its own once the CRD is in
    /// place, so starting reduces to making sure it was created
    async fn start(&self, task: &PipelineTask, _promise: TaskPromise) -> ExecutorResult<Value> {
        self.validate(task)?;
        let existence = self.exist(task).await?;
        if !existence.created {
            warn!(
                "flink cluster not created yet, create before start, task {}",
                task.id
            );
            return self.create(task).await;
        }
        if existence.started {
            warn!("flink cluster already started, task {}", task.id);
        }
        Ok(Value::Null)
    }

    async fn status(&self, task: &PipelineTask) -> ExecutorResult<PipelineStatusDesc> {
        self.validate(task)?;
        let cluster = match self
            .clusters(&task.extra.namespace)
            .get(&task.extra.uuid)
            .await
        {
            Ok(cluster) => cluster,
            Err(e) if is_not_found(&e) => {
                warn!(
                    "flink cluster {}/{} not found in cluster",
                    task.extra.namespace, task.extra.uuid
                );
                return Ok(PipelineStatusDesc::new(PipelineStatus::NotFoundInCluster, ""));
            }
            Err(e) => return Err(e.into()),
        };

        let status = cluster.status.unwrap_or_default();
        // a job cluster is judged by its job, a session cluster by itself;
        // a job whose status has not shown up yet falls back to the
        // cluster state
        let job = if cluster.spec.job.is_some() {
            status.components.job
        } else {
            None
        };
        let (backend, raw_state) = match job {
            Some(job) => (job_state_to_backend(&job.state), job.state),
            None => (cluster_state_to_backend(&status.state), status.state),
        };

        let desc = if backend == job_status::UNKNOWN {
            format!("unknown status, flink state: {:?}", raw_state)
        } else {
            String::new()
        };
        let status = transfer_status(backend);
        debug!(
            "flink cluster {}/{} status: {:?} -> {}",
            task.extra.namespace, task.extra.uuid, raw_state, status
        );
        Ok(PipelineStatusDesc::new(status, desc))
    }

    async fn cancel(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        self.remove(task).await
    }

    async fn remove(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        remove_workload::<FlinkCluster>(&self.client, task).await
    }

    async fn delete_namespace(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        cleanup_namespace::<FlinkCluster>(&self.client, task).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::k8s::common::BigdataSpec;

    fn flink_conf(kind: &str) -> BigdataConf {
        let raw = r#"{
            "image": "registry/flink:1.12",
            "class": "io.gantry.Aggregate",
            "resource": "local:///opt/job.jar",
            "args": ["--window", "5m"],
            "envs": [{"name": "PROFILE", "value": "prod"}],
            "properties": {"taskmanager.numberOfTaskSlots": "2"},
            "flinkConf": {
                "kind": "job",
                "parallelism": 4,
                "jobManagerResource": {"cpu": "1", "memory": "1024m"},
                "taskManagerResource": {"replica": 2, "cpu": "2", "memory": "2048m"}
            }
        }"#;
        let mut spec: BigdataSpec = serde_json::from_str(raw).unwrap();
        spec.flink_conf.as_mut().unwrap().kind = kind.to_string();
        BigdataConf {
            name: "u200".to_string(),
            namespace: "pipeline-200".to_string(),
            spec,
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
    fn test_job_state_mapping() {
        let cases = [
            (job_state::PENDING, job_status::UNSCHEDULABLE),
            (job_state::RUNNING, job_status::RUNNING),
            (job_state::UPDATING, job_status::RUNNING),
            (job_state::SUCCEEDED, job_status::STOPPED_ON_OK),
            (job_state::FAILED, job_status::STOPPED_ON_FAILED),
            (job_state::CANCELLED, job_status::STOPPED_BY_KILLED),
            (job_state::UNKNOWN, job_status::UNKNOWN),
            ("Restarting", job_status::UNKNOWN),
        ];
        for (state, expected) in cases {
            assert_eq!(job_state_to_backend(state), expected, "state {:?}", state);
        }
    }

    #[test]
    fn test_cluster_state_mapping() {
        let cases = [
            ("", job_status::UNSCHEDULABLE),
            (cluster_state::CREATING, job_status::UNSCHEDULABLE),
            (cluster_state::RUNNING, job_status::RUNNING),
            (cluster_state::RECONCILING, job_status::RUNNING),
            (cluster_state::UPDATING, job_status::RUNNING),
            (cluster_state::STOPPING, job_status::RUNNING),
            (cluster_state::PARTIALLY_STOPPED, job_status::RUNNING),
            (cluster_state::STOPPED, job_status::STOPPED_ON_FAILED),
            ("Hibernating", job_status::UNKNOWN),
        ];
        for (state, expected) in cases {
            assert_eq!(
                cluster_state_to_backend(state),
                expected,
                "state {:?}",
                state
            );
        }
    }

    #[test]
    fn test_generate_job_cluster() {
        let conf = flink_conf("job");
        let flink = conf.spec.flink_conf.clone().unwrap();

        let cluster = generate_flink_cluster(
            &conf,
            &flink,
            Some("gantry-regcred".to_string()),
            namespace_owner(&conf.namespace),
        );

        assert_eq!(cluster.metadata.name.as_deref(), Some("u200"));
        assert_eq!(cluster.metadata.namespace.as_deref(), Some("pipeline-200"));
        assert_eq!(cluster.spec.image.name, "registry/flink:1.12");
        assert_eq!(
            cluster.spec.image.pull_secrets,
            Some(vec![LocalObjectReference {
                name: Some("gantry-regcred".to_string()),
            }])
        );
        // replica was omitted for the job manager, it defaults to one
        assert_eq!(cluster.spec.job_manager.replicas, Some(1));
        assert_eq!(cluster.spec.job_manager.access_scope, "Cluster");
        assert_eq!(cluster.spec.task_manager.replicas, 2);

        let limits = cluster.spec.task_manager.resources.limits.unwrap();
        assert_eq!(limits.get("cpu"), Some(&Quantity("2".to_string())));
        assert_eq!(limits.get("memory"), Some(&Quantity("2048m".to_string())));

        let job = cluster.spec.job.unwrap();
        assert_eq!(job.jar_file, "local:///opt/job.jar");
        assert_eq!(job.class_name.as_deref(), Some("io.gantry.Aggregate"));
        assert_eq!(job.parallelism, Some(4));
        assert_eq!(job.restart_policy.as_deref(), Some("Never"));
    }

    #[test]
    fn test_generate_session_cluster_has_no_job() {
        let conf = flink_conf("session");
        let flink = conf.spec.flink_conf.clone().unwrap();

        let cluster =
            generate_flink_cluster(&conf, &flink, None, namespace_owner(&conf.namespace));
        assert!(cluster.spec.job.is_none());
        assert_eq!(cluster.spec.image.pull_secrets, None);
        assert_eq!(
            cluster.spec.flink_properties.unwrap().get("taskmanager.numberOfTaskSlots"),
            Some(&"2".to_string())
        );
    }
}
