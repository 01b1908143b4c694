//! Persistence for plans and plan runs

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    config::{SessionConfig, StorageClass},
    core::{Plan, PlanId, PlanRun, PlanRunId},
    error::{AgentError, Result},
};

#[async_trait]
pub trait Storage: Send + Sync + std::fmt::Debug {
    async fn save_plan(&self, plan: &Plan) -> Result<()>;

    async fn get_plan(&self, id: &PlanId) -> Result<Plan>;

    async fn save_plan_run(&self, run: &PlanRun) -> Result<()>;

    async fn get_plan_run(&self, id: &PlanRunId) -> Result<PlanRun>;
}

/// Backend selected by the session config
pub fn storage_for(config: &SessionConfig) -> Arc<dyn Storage> {
    match config.storage_class {
        StorageClass::Memory => Arc::new(InMemoryStorage::default()),
        StorageClass::Disk => Arc::new(DiskStorage::new(&config.storage_dir)),
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStorage {
    plans: RwLock<HashMap<PlanId, Plan>>,
    runs: RwLock<HashMap<PlanRunId, PlanRun>>,
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn save_plan(&self, plan: &Plan) -> Result<()> {
        self.plans.write().await.insert(plan.id.clone(), plan.clone());
        Ok(())
    }

    async fn get_plan(&self, id: &PlanId) -> Result<Plan> {
        self.plans
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AgentError::Storage(format!("plan {} not found", id)))
    }

    async fn save_plan_run(&self, run: &PlanRun) -> Result<()> {
        self.runs.write().await.insert(run.id.clone(), run.clone());
        Ok(())
    }

    async fn get_plan_run(&self, id: &PlanRunId) -> Result<PlanRun> {
        self.runs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AgentError::Storage(format!("plan run {} not found", id)))
    }
}

/// One pretty-printed JSON file per plan or run, named `<id>.json`
#[derive(Debug, Clone)]
pub struct DiskStorage {
    dir: PathBuf,
}

impl DiskStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    async fn write<T: Serialize>(&self, id: &str, value: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|err| {
            AgentError::Storage(format!("cannot create {}: {}", self.dir.display(), err))
        })?;

        let path = self.path_for(id);
        let json = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|err| AgentError::Storage(format!("cannot write {}: {}", path.display(), err)))?;
        debug!(path = %path.display(), "Saved");
        Ok(())
    }

    async fn read<T: DeserializeOwned>(&self, id: &str) -> Result<T> {
        let path = self.path_for(id);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|err| AgentError::Storage(format!("cannot read {}: {}", path.display(), err)))?;
        serde_json::from_slice(&bytes).map_err(|err| {
            AgentError::Storage(format!("corrupt record {}: {}", path.display(), err))
        })
    }
}

#[async_trait]
impl Storage for DiskStorage {
    async fn save_plan(&self, plan: &Plan) -> Result<()> {
        self.write(plan.id.as_str(), plan).await
    }

    async fn get_plan(&self, id: &PlanId) -> Result<Plan> {
        self.read(id.as_str()).await
    }

    async fn save_plan_run(&self, run: &PlanRun) -> Result<()> {
        self.write(run.id.as_str(), run).await
    }

    async fn get_plan_run(&self, id: &PlanRunId) -> Result<PlanRun> {
        self.read(id.as_str()).await
    }
}
