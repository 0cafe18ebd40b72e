//! Process-level ownership of project containers.
//!
//! There is deliberately no hidden singleton: every piece of shared
//! state (the file system handle, the size budget, the containers) lives
//! in a registry instance, so tests can run several isolated registries
//! side by side.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::warn;

use crate::config::ProjectConfig;
use crate::container::ProjectContainer;
use crate::engine::EngineFactory;
use crate::error::ProjectError;
use crate::fs::FileSystemShim;
use crate::shim::ComponentFileSystem;
use crate::store::SizeBudget;

/// File name used as the synthetic configuration key for projects
/// without a configuration file.
const DEFAULT_CONFIG_NAME: &str = ".project-default.json";

pub struct ProjectRegistry {
    fs: Arc<ComponentFileSystem>,
    budget: Arc<SizeBudget>,
    engine_factory: Arc<dyn EngineFactory>,
    containers: IndexMap<Utf8PathBuf, ProjectContainer>,
}

impl ProjectRegistry {
    pub fn new(fs: Arc<dyn FileSystemShim>, engine_factory: Arc<dyn EngineFactory>) -> Self {
        Self::with_budget(fs, engine_factory, Arc::new(SizeBudget::default()))
    }

    pub fn with_budget(
        fs: Arc<dyn FileSystemShim>,
        engine_factory: Arc<dyn EngineFactory>,
        budget: Arc<SizeBudget>,
    ) -> Self {
        Self {
            fs: Arc::new(ComponentFileSystem::new(fs)),
            budget,
            engine_factory,
            containers: IndexMap::new(),
        }
    }

    pub fn budget(&self) -> &Arc<SizeBudget> {
        &self.budget
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    /// The container for a configuration, created lazily. First sight of
    /// a configuration path loads it from disk; a missing or unreadable
    /// file falls back to the default configuration. Projects without a
    /// configuration file share a synthetic per-root key.
    pub async fn get_or_create(
        &mut self,
        config_path: Option<&Utf8Path>,
        root: &Utf8Path,
    ) -> Result<&mut ProjectContainer, ProjectError> {
        let key = match config_path {
            Some(path) => path.to_owned(),
            None => root.join(DEFAULT_CONFIG_NAME),
        };

        let fs = Arc::clone(&self.fs);
        let budget = Arc::clone(&self.budget);
        let factory = Arc::clone(&self.engine_factory);

        match self.containers.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let config = match config_path {
                    Some(path) => match tokio::fs::read_to_string(path).await {
                        Ok(text) => ProjectConfig::parse(path, &text)?,
                        Err(error) => {
                            warn!(%path, %error, "configuration unreadable, using defaults");
                            ProjectConfig::default()
                        }
                    },
                    None => ProjectConfig::default(),
                };
                let container = ProjectContainer::new(
                    entry.key().clone(),
                    root.to_owned(),
                    config,
                    fs,
                    budget,
                    factory,
                );
                Ok(entry.insert(container))
            }
        }
    }

    /// Test-only escape hatch: drops every container, disposing their
    /// engines and releasing their budget charges.
    pub fn reset(&mut self) {
        self.containers.clear();
        self.fs.invalidate_all();
    }
}
