//! Per-configuration project state: one engine, one snapshot cache, one
//! resolver.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashSet;
use sfc_document::{Document, TextEdit};
use sfc_virtual::{
    ensure_real_path, is_component_path, to_virtual_path, ScriptKind, Snapshot, SnapshotOptions,
};
use tracing::{debug, info, warn};

use crate::config::{is_project_file, ProjectConfig};
use crate::engine::{EngineFactory, EngineHost, LanguageEngine};
use crate::error::ProjectError;
use crate::resolver::{ModuleResolver, ResolvedModule};
use crate::shim::ComponentFileSystem;
use crate::store::{SizeBudget, SnapshotStore};

/// Invoked once when a container degrades to reduced mode.
pub type DegradedCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Owns everything the engine needs to see for one project
/// configuration. All mutation of snapshots and caches goes through the
/// methods here.
pub struct ProjectContainer {
    config_path: Utf8PathBuf,
    root: Utf8PathBuf,
    config: ProjectConfig,
    fs: Arc<ComponentFileSystem>,
    store: Arc<SnapshotStore>,
    resolver: ModuleResolver,
    engine_factory: Arc<dyn EngineFactory>,
    engine: Option<Box<dyn LanguageEngine>>,
    snapshot_options: SnapshotOptions,
    /// Enumerated from configuration, sorted.
    project_files: Vec<Utf8PathBuf>,
    /// Real paths of files explicitly opened by the editor.
    open_files: FxHashSet<Utf8PathBuf>,
    project_version: u64,
    budget: Arc<SizeBudget>,
    /// Bytes this container currently has charged against the budget.
    charged_bytes: u64,
    reduced_mode: bool,
    on_degraded: Option<DegradedCallback>,
}

impl ProjectContainer {
    pub fn new(
        config_path: Utf8PathBuf,
        root: Utf8PathBuf,
        config: ProjectConfig,
        fs: Arc<ComponentFileSystem>,
        budget: Arc<SizeBudget>,
        engine_factory: Arc<dyn EngineFactory>,
    ) -> Self {
        let store = Arc::new(SnapshotStore::new());
        let resolver = ModuleResolver::new(Arc::clone(&fs), Arc::clone(&store));
        Self {
            config_path,
            root,
            config,
            fs,
            store,
            resolver,
            engine_factory,
            engine: None,
            snapshot_options: SnapshotOptions::default(),
            project_files: Vec::new(),
            open_files: FxHashSet::default(),
            project_version: 0,
            budget,
            charged_bytes: 0,
            reduced_mode: false,
            on_degraded: None,
        }
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn project_version(&self) -> u64 {
        self.project_version
    }

    pub fn is_reduced_mode(&self) -> bool {
        self.reduced_mode
    }

    pub fn resolver(&self) -> &ModuleResolver {
        &self.resolver
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn fs(&self) -> &Arc<ComponentFileSystem> {
        &self.fs
    }

    /// Registers the one-time reduced-mode notification.
    pub fn set_degraded_callback(&mut self, callback: DegradedCallback) {
        self.on_degraded = Some(callback);
    }

    /// The engine-facing view of this container.
    pub fn host(&self) -> ContainerHost<'_> {
        ContainerHost { container: self }
    }

    /// Creates the engine if it does not exist yet.
    pub fn ensure_engine(&mut self) {
        if self.engine.is_none() {
            let factory = Arc::clone(&self.engine_factory);
            self.engine = Some(factory.create(&self.host()));
        }
    }

    /// Re-snapshots an open component document. Same path and version
    /// returns the cached instance untouched.
    pub fn update_document_snapshot(&mut self, document: &Document) -> Arc<Snapshot> {
        let path = ensure_real_path(document.path());
        if let Some(existing) = self.store.get(&path) {
            if existing.version() == document.version() {
                return existing;
            }
        }
        let snapshot = Arc::new(Snapshot::from_document(document, &self.snapshot_options));
        self.open_files.insert(path.clone());
        self.install(path, snapshot)
    }

    /// Snapshot for a path that is not open, loaded through the file
    /// system and cached.
    pub fn update_path_snapshot(&mut self, path: &Utf8Path) -> Result<Arc<Snapshot>, ProjectError> {
        let real = ensure_real_path(path);
        if let Some(existing) = self.store.get(&real) {
            return Ok(existing);
        }
        let fs = Arc::clone(&self.fs);
        let snapshot = Snapshot::from_path(&real, |p| fs.read_file(p), &self.snapshot_options)
            .map_err(|source| ProjectError::Io {
                path: real.clone(),
                source,
            })?;
        Ok(self.install(real, Arc::new(snapshot)))
    }

    /// Applies edits to a plain script file, producing its successor
    /// snapshot.
    pub fn update_script_file(
        &mut self,
        path: &Utf8Path,
        edits: &[TextEdit],
    ) -> Result<Arc<Snapshot>, ProjectError> {
        let real = ensure_real_path(path);
        let current = match self.store.get(&real) {
            Some(snapshot) => snapshot,
            None => self.update_path_snapshot(&real)?,
        };
        let successor = match current.as_ref() {
            Snapshot::Script(script) => Arc::new(Snapshot::Script(script.with_edits(edits))),
            Snapshot::Component(_) => {
                debug!(path = %real, "component edits go through their document");
                return Ok(current);
            }
        };
        self.open_files.insert(real.clone());
        Ok(self.install(real, successor))
    }

    /// Removes a file's snapshot and every cache entry keyed on it.
    pub fn delete_snapshot(&mut self, path: &Utf8Path) {
        let real = ensure_real_path(path);
        if let Some(old) = self.store.remove(&real) {
            old.destroy_fragment();
        }
        self.open_files.remove(&real);
        self.resolver.cache().delete_resolved_to(&real);
        self.fs.invalidate(&real);
        self.project_files.retain(|candidate| candidate != &real);
        self.bump_version();
    }

    /// Re-enumerates the configured file set and re-charges this
    /// container's share of the size budget.
    pub fn update_project_files(&mut self) {
        self.project_files = self.config.enumerate_files(&self.root);

        let non_script_bytes: u64 = self
            .project_files
            .iter()
            .filter(|path| !ScriptKind::from_extension(path).is_script())
            .map(|path| self.fs.file_size(path))
            .sum();
        self.budget.release(self.charged_bytes);
        self.budget.charge(non_script_bytes);
        self.charged_bytes = non_script_bytes;

        if self.budget.is_exceeded() && !self.reduced_mode {
            self.reduced_mode = true;
            warn!(
                config = %self.config_path,
                used = self.budget.used(),
                "size budget exceeded, withholding project files from the engine"
            );
            if let Some(callback) = &self.on_degraded {
                callback("project exceeds the memory budget; only open files are checked");
            }
        }
        self.bump_version();
    }

    /// Whether the engine should see this file at all. In reduced mode
    /// only explicitly opened files and snapshotted components remain.
    pub fn has_file(&self, path: &Utf8Path) -> bool {
        let real = ensure_real_path(path);
        if self.reduced_mode {
            self.open_files.contains(&real)
                || (is_component_path(&real) && self.store.contains(&real))
        } else {
            self.store.contains(&real) || self.project_files.binary_search(&real).is_ok()
        }
    }

    /// Whether the path falls under this project's root and is a file
    /// kind the project layer handles.
    pub fn file_belongs_to_project(&self, path: &Utf8Path) -> bool {
        let real = ensure_real_path(path);
        real.starts_with(&self.root) && is_project_file(&real)
    }

    /// Cache-first snapshot accessor.
    pub fn snapshot(&self, path: &Utf8Path) -> Option<Arc<Snapshot>> {
        self.store.get(&ensure_real_path(path))
    }

    pub(crate) fn release_budget(&mut self) {
        self.budget.release(self.charged_bytes);
        self.charged_bytes = 0;
    }

    fn install(&mut self, path: Utf8PathBuf, snapshot: Arc<Snapshot>) -> Arc<Snapshot> {
        let previous = self.store.insert(Arc::clone(&snapshot));
        let first_seen = previous.is_none();
        let kind_changed = previous
            .as_ref()
            .map(|old| old.script_kind() != snapshot.script_kind())
            .unwrap_or(false);
        if let Some(old) = previous {
            old.destroy_fragment();
        }

        if first_seen {
            // A new file may satisfy imports that failed before it
            // existed.
            self.resolver
                .cache()
                .delete_unresolved_matching_stem(&path);
            self.fs.invalidate(&path);
        }

        if kind_changed {
            self.restart_engine();
        } else {
            self.bump_version();
        }
        snapshot
    }

    /// The engine cannot change an opened file's script kind in place, so
    /// the whole instance is rebuilt and every cache keyed on the old one
    /// cleared.
    fn restart_engine(&mut self) {
        info!(config = %self.config_path, "script kind changed, restarting engine");
        if let Some(mut engine) = self.engine.take() {
            engine.dispose();
        }
        self.resolver.cache().clear();
        self.fs.invalidate_all();
        self.bump_version();
        self.ensure_engine();
    }

    fn bump_version(&mut self) {
        self.project_version += 1;
        if let Some(mut engine) = self.engine.take() {
            engine.project_updated(&self.host());
            self.engine = Some(engine);
        }
    }
}

impl Drop for ProjectContainer {
    fn drop(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.dispose();
        }
        self.release_budget();
    }
}

/// [`EngineHost`] implementation backed by a container. All paths handed
/// out are virtual; all lookups normalize back to real paths.
pub struct ContainerHost<'a> {
    container: &'a ProjectContainer,
}

impl EngineHost for ContainerHost<'_> {
    fn script_file_names(&self) -> Vec<Utf8PathBuf> {
        let container = self.container;
        let mut names: FxHashSet<Utf8PathBuf> = if container.reduced_mode {
            let mut names: FxHashSet<Utf8PathBuf> =
                container.open_files.iter().cloned().collect();
            names.extend(
                container
                    .store
                    .paths()
                    .into_iter()
                    .filter(|path| is_component_path(path)),
            );
            names
        } else {
            container.project_files.iter().cloned().collect()
        };
        if !container.reduced_mode {
            names.extend(container.store.paths());
        }

        let mut virtual_names: Vec<Utf8PathBuf> = names
            .into_iter()
            .map(|path| to_virtual_path(&path))
            .collect();
        virtual_names.sort();
        virtual_names
    }

    fn script_version(&self, path: &Utf8Path) -> Option<u64> {
        self.container.snapshot(path).map(|snapshot| snapshot.version())
    }

    fn script_snapshot(&self, path: &Utf8Path) -> Option<Arc<Snapshot>> {
        self.container.snapshot(path)
    }

    fn script_kind(&self, path: &Utf8Path) -> ScriptKind {
        if let Some(snapshot) = self.container.snapshot(path) {
            return snapshot.script_kind();
        }
        let real = ensure_real_path(path);
        if is_component_path(&real) {
            ScriptKind::Tsx
        } else {
            ScriptKind::from_extension(&real)
        }
    }

    fn project_version(&self) -> u64 {
        self.container.project_version
    }

    fn resolve_module(&self, importer: &Utf8Path, specifier: &str) -> Option<ResolvedModule> {
        self.container.resolver.resolve(importer, specifier)
    }

    fn file_exists(&self, path: &Utf8Path) -> bool {
        self.container.fs.file_exists(path)
    }

    fn read_file(&self, path: &Utf8Path) -> Option<String> {
        self.container.fs.read_file(path).ok()
    }

    fn read_directory(&self, path: &Utf8Path) -> Vec<Utf8PathBuf> {
        self.container.fs.read_directory(path)
    }
}
