//! Executor registry
//!
//! Maps a `Kind` to a constructor and hands out one shared executor
//! instance per `(Kind, Name)` pair, built on demand from an options map.
//! Kubernetes-backed plugins bootstrap an API client in their
//! constructor, so construction is async throughout.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use gantry_core::domain::task::{PipelineTask, TaskInspect};
use gantry_core::status::PipelineStatusDesc;
use gantry_core::{Kind, Name};

use crate::error::ExecutorResult;
use crate::plugins::apitest::{self, ApiTestExecutor};
use crate::plugins::demo::{self, DemoExecutor};
use crate::plugins::k8s::flink::{self, K8sFlinkExecutor};
use crate::plugins::k8s::spark::{self, K8sSparkExecutor};
use crate::plugins::memory::{self, MemoryExecutor};
use crate::plugins::mysql_config_sheet::{self, MysqlConfigSheetExecutor};
use crate::plugins::scheduler::{self, SchedulerExecutor};
use crate::plugins::wait::{self, WaitExecutor};
use crate::types::{ActionExecutor, Existence, TaskPromise};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("executor kind {0} is already registered")]
    Duplicate(Kind),

    #[error("unknown executor kind {0}")]
    UnknownKind(Kind),

    #[error("failed to construct executor {kind}/{name}")]
    Construct {
        kind: Kind,
        name: Name,
        #[source]
        source: anyhow::Error,
    },
}

/// Every built-in backend as one dispatchable value
///
/// Dispatch stays an exhaustive match: adding a backend means adding a
/// variant here and a registration in `with_default_kinds`.
pub enum AnyExecutor {
    Scheduler(SchedulerExecutor),
    K8sFlink(K8sFlinkExecutor),
    K8sSpark(K8sSparkExecutor),
    Wait(WaitExecutor),
    ApiTest(ApiTestExecutor),
    MysqlConfigSheet(MysqlConfigSheetExecutor),
    Memory(MemoryExecutor),
    Demo(DemoExecutor),
}

impl AnyExecutor {
    fn as_dyn(&self) -> &dyn ActionExecutor {
        match self {
            AnyExecutor::Scheduler(e) => e,
            AnyExecutor::K8sFlink(e) => e,
            AnyExecutor::K8sSpark(e) => e,
            AnyExecutor::Wait(e) => e,
            AnyExecutor::ApiTest(e) => e,
            AnyExecutor::MysqlConfigSheet(e) => e,
            AnyExecutor::Memory(e) => e,
            AnyExecutor::Demo(e) => e,
        }
    }
}

#[async_trait]
impl ActionExecutor for AnyExecutor {
    fn kind(&self) -> Kind {
        self.as_dyn().kind()
    }

    fn name(&self) -> Name {
        self.as_dyn().name()
    }

    async fn exist(&self, task: &PipelineTask) -> ExecutorResult<Existence> {
        self.as_dyn().exist(task).await
    }

    async fn create(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        self.as_dyn().create(task).await
    }

    async fn start(&self, task: &PipelineTask, promise: TaskPromise) -> ExecutorResult<Value> {
        self.as_dyn().start(task, promise).await
    }

    async fn update(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        self.as_dyn().update(task).await
    }

    async fn status(&self, task: &PipelineTask) -> ExecutorResult<PipelineStatusDesc> {
        self.as_dyn().status(task).await
    }

    async fn inspect(&self, task: &PipelineTask) -> ExecutorResult<TaskInspect> {
        self.as_dyn().inspect(task).await
    }

    async fn cancel(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        self.as_dyn().cancel(task).await
    }

    async fn remove(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        self.as_dyn().remove(task).await
    }

    async fn destroy(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        self.as_dyn().destroy(task).await
    }

    async fn delete_namespace(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        self.as_dyn().delete_namespace(task).await
    }

    async fn batch_delete(&self, tasks: &[PipelineTask]) -> ExecutorResult<Value> {
        self.as_dyn().batch_delete(tasks).await
    }
}

/// Async builder turning `(Name, options)` into a ready executor
pub type Constructor = Box<
    dyn Fn(Name, HashMap<String, String>) -> BoxFuture<'static, anyhow::Result<AnyExecutor>>
        + Send
        + Sync,
>;

/// Executor factory and instance cache
///
/// Instances are singletons per `(Kind, Name)`: the memory executor keeps
/// task progress in the instance, and the Kubernetes executors carry a
/// connection worth sharing.
#[derive(Default)]
pub struct Registry {
    factories: RwLock<HashMap<Kind, Constructor>>,
    executors: RwLock<HashMap<(Kind, Name), Arc<AnyExecutor>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in backend registered
    pub async fn with_default_kinds() -> anyhow::Result<Self> {
        let registry = Self::new();
        registry
            .register(
                Kind::new(scheduler::KIND)?,
                Box::new(|name, options| {
                    Box::pin(async move {
                        SchedulerExecutor::new(name, &options).map(AnyExecutor::Scheduler)
                    })
                }),
            )
            .await?;
        registry
            .register(
                Kind::new(flink::KIND)?,
                Box::new(|name, options| {
                    Box::pin(async move {
                        K8sFlinkExecutor::new(name, &options)
                            .await
                            .map(AnyExecutor::K8sFlink)
                    })
                }),
            )
            .await?;
        registry
            .register(
                Kind::new(spark::KIND)?,
                Box::new(|name, options| {
                    Box::pin(async move {
                        K8sSparkExecutor::new(name, &options)
                            .await
                            .map(AnyExecutor::K8sSpark)
                    })
                }),
            )
            .await?;
        registry
            .register(
                Kind::new(wait::KIND)?,
                Box::new(|name, options| {
                    Box::pin(async move { WaitExecutor::new(name, &options).map(AnyExecutor::Wait) })
                }),
            )
            .await?;
        registry
            .register(
                Kind::new(apitest::KIND)?,
                Box::new(|name, options| {
                    Box::pin(async move {
                        ApiTestExecutor::new(name, &options).map(AnyExecutor::ApiTest)
                    })
                }),
            )
            .await?;
        registry
            .register(
                Kind::new(mysql_config_sheet::KIND)?,
                Box::new(|name, options| {
                    Box::pin(async move {
                        MysqlConfigSheetExecutor::new(name, &options)
                            .map(AnyExecutor::MysqlConfigSheet)
                    })
                }),
            )
            .await?;
        registry
            .register(
                Kind::new(memory::KIND)?,
                Box::new(|name, options| {
                    Box::pin(
                        async move { MemoryExecutor::new(name, &options).map(AnyExecutor::Memory) },
                    )
                }),
            )
            .await?;
        registry
            .register(
                Kind::new(demo::KIND)?,
                Box::new(|name, options| {
                    Box::pin(async move { DemoExecutor::new(name, &options).map(AnyExecutor::Demo) })
                }),
            )
            .await?;
        Ok(registry)
    }

    pub async fn register(&self, kind: Kind, constructor: Constructor) -> Result<(), RegistryError> {
        let mut factories = self.factories.write().await;
        if factories.contains_key(&kind) {
            return Err(RegistryError::Duplicate(kind));
        }
        debug!("registered executor kind {}", kind);
        factories.insert(kind, constructor);
        Ok(())
    }

    pub async fn kinds(&self) -> Vec<Kind> {
        self.factories.read().await.keys().cloned().collect()
    }

    /// Returns the shared executor for the pair, constructing it on first
    /// use from the given options
    pub async fn get_or_create(
        &self,
        kind: &Kind,
        name: &Name,
        options: HashMap<String, String>,
    ) -> Result<Arc<AnyExecutor>, RegistryError> {
        let key = (kind.clone(), name.clone());
        {
            let executors = self.executors.read().await;
            if let Some(executor) = executors.get(&key) {
                return Ok(executor.clone());
            }
        }

        // the factory lock is released before construction runs: the
        // Kubernetes constructors do network work
        let building = {
            let factories = self.factories.read().await;
            let constructor = factories
                .get(kind)
                .ok_or_else(|| RegistryError::UnknownKind(kind.clone()))?;
            constructor(name.clone(), options)
        };
        let executor = building.await.map_err(|source| RegistryError::Construct {
            kind: kind.clone(),
            name: name.clone(),
            source,
        })?;

        // two tasks may have built concurrently, the first insert wins
        let mut executors = self.executors.write().await;
        let entry = executors.entry(key).or_insert_with(|| Arc::new(executor));
        Ok(entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::status::PipelineStatus;

    fn memory_constructor() -> Constructor {
        Box::new(|name, options| {
            Box::pin(async move { MemoryExecutor::new(name, &options).map(AnyExecutor::Memory) })
        })
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_kind() {
        let registry = Registry::new();
        let kind = Kind::new("MEMORY").unwrap();
        registry
            .register(kind.clone(), memory_constructor())
            .await
            .unwrap();

        let err = registry.register(kind, memory_constructor()).await;
        assert!(matches!(err, Err(RegistryError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_get_or_create_unknown_kind() {
        let registry = Registry::new();
        let err = registry
            .get_or_create(
                &Kind::new("NOPE").unwrap(),
                &Name::new("X").unwrap(),
                HashMap::new(),
            )
            .await;
        assert!(matches!(err, Err(RegistryError::UnknownKind(_))));
    }

    #[tokio::test]
    async fn test_get_or_create_returns_singleton_per_pair() {
        let registry = Registry::new();
        let kind = Kind::new("MEMORY").unwrap();
        let name = Name::new("MEM1").unwrap();
        registry
            .register(kind.clone(), memory_constructor())
            .await
            .unwrap();

        let first = registry
            .get_or_create(&kind, &name, HashMap::new())
            .await
            .unwrap();
        let second = registry
            .get_or_create(&kind, &name, HashMap::new())
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let other = registry
            .get_or_create(&kind, &Name::new("MEM2").unwrap(), HashMap::new())
            .await
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[tokio::test]
    async fn test_default_kinds_cover_all_backends() {
        let registry = Registry::with_default_kinds().await.unwrap();
        let kinds = registry.kinds().await;
        let mut kinds: Vec<&str> = kinds.iter().map(Kind::as_str).collect();
        kinds.sort_unstable();
        assert_eq!(
            kinds,
            vec![
                "APITEST",
                "DEMO",
                "K8SFLINK",
                "K8SSPARK",
                "MEMORY",
                "MYSQLCONFIGSHEET",
                "SCHEDULER",
                "WAIT",
            ]
        );
    }

    #[tokio::test]
    async fn test_dispatch_through_enum() {
        let registry = Registry::with_default_kinds().await.unwrap();
        let executor = registry
            .get_or_create(
                &Kind::new("MEMORY").unwrap(),
                &Name::new("MEM1").unwrap(),
                HashMap::new(),
            )
            .await
            .unwrap();

        assert_eq!(executor.kind().as_str(), "MEMORY");
        let mut task = PipelineTask::default();
        task.extra.uuid = "r1".to_string();
        let desc = executor.status(&task).await.unwrap();
        assert_eq!(desc.status, PipelineStatus::Created);
    }
}
