//! Module resolution for imports that may target component files.
//!
//! The engine resolves imports as if every target were an ordinary
//! script. This resolver runs that native pass first and, when it comes
//! up empty or lands on a synthetic virtual companion path, retries
//! against real component files.

use std::sync::{Arc, Mutex, MutexGuard};

use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;
use sfc_virtual::{
    ensure_real_path, is_component_path, is_virtual_component_path, ScriptKind,
    COMPONENT_EXTENSION,
};
use tracing::trace;

use crate::shim::ComponentFileSystem;
use crate::store::SnapshotStore;

const SCRIPT_EXTENSIONS: [&str; 4] = ["ts", "tsx", "js", "jsx"];

/// A successfully resolved import target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    /// Real on-disk path, never the virtual form.
    pub path: Utf8PathBuf,
    pub script_kind: ScriptKind,
}

/// Cache of resolution outcomes keyed by `(importer, specifier)`.
///
/// A stored `None` is the cached "unresolved" outcome, distinct from a
/// key that has never been looked up.
#[derive(Default)]
pub struct ResolutionCache {
    entries: Mutex<FxHashMap<(Utf8PathBuf, String), Option<ResolvedModule>>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, importer: &Utf8Path, specifier: &str) -> Option<Option<ResolvedModule>> {
        self.lock()
            .get(&(importer.to_owned(), specifier.to_owned()))
            .cloned()
    }

    pub fn insert(
        &self,
        importer: &Utf8Path,
        specifier: &str,
        outcome: Option<ResolvedModule>,
    ) {
        self.lock()
            .insert((importer.to_owned(), specifier.to_owned()), outcome);
    }

    /// Removes entries that resolved to `path`. Called when the file is
    /// deleted or renamed away.
    pub fn delete_resolved_to(&self, path: &Utf8Path) {
        self.lock()
            .retain(|_, outcome| outcome.as_ref().map(|m| m.path.as_path()) != Some(path));
    }

    /// Removes cached "unresolved" outcomes whose specifier stem matches
    /// `path`'s stem. Called when a new file appears that might satisfy
    /// a previously failing import.
    pub fn delete_unresolved_matching_stem(&self, path: &Utf8Path) {
        let Some(stem) = path.file_stem() else {
            return;
        };
        self.lock().retain(|(_, specifier), outcome| {
            if outcome.is_some() {
                return true;
            }
            specifier_stem(specifier) != Some(stem)
        });
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(
        &self,
    ) -> MutexGuard<'_, FxHashMap<(Utf8PathBuf, String), Option<ResolvedModule>>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// The stem an import specifier names: `./nested/Widget` yields `Widget`,
/// `./Widget.sfc` also yields `Widget`.
fn specifier_stem(specifier: &str) -> Option<&str> {
    Utf8Path::new(specifier).file_stem()
}

pub struct ModuleResolver {
    fs: Arc<ComponentFileSystem>,
    store: Arc<SnapshotStore>,
    cache: ResolutionCache,
}

impl ModuleResolver {
    pub fn new(fs: Arc<ComponentFileSystem>, store: Arc<SnapshotStore>) -> Self {
        Self {
            fs,
            store,
            cache: ResolutionCache::new(),
        }
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Resolves `specifier` imported from `importer`, consulting the
    /// cache first. Both outcomes are cached, including "unresolved".
    pub fn resolve(&self, importer: &Utf8Path, specifier: &str) -> Option<ResolvedModule> {
        if let Some(cached) = self.cache.get(importer, specifier) {
            return cached;
        }
        let outcome = self.resolve_uncached(importer, specifier);
        trace!(%importer, specifier, resolved = outcome.is_some(), "module resolution");
        self.cache.insert(importer, specifier, outcome.clone());
        outcome
    }

    fn resolve_uncached(&self, importer: &Utf8Path, specifier: &str) -> Option<ResolvedModule> {
        // Non-relative specifiers belong to the engine's own library
        // resolution.
        if !specifier.starts_with("./") && !specifier.starts_with("../") {
            return None;
        }

        let importer = ensure_real_path(importer);
        let base = importer.parent()?;

        // The engine may hand us its own invented virtual companion name.
        if is_virtual_component_path(Utf8Path::new(specifier)) {
            let stripped = &specifier[..specifier.len() - ".ts".len()];
            return self.probe_component(base, stripped);
        }

        self.probe(base, specifier)
    }

    fn probe(&self, base: &Utf8Path, specifier: &str) -> Option<ResolvedModule> {
        let target = normalize(base.join(specifier));

        // Exact path with a script extension.
        if ScriptKind::from_extension(&target).is_script() && self.fs.file_exists(&target) {
            return Some(self.script_module(target));
        }

        // Script extension probing.
        for ext in SCRIPT_EXTENSIONS {
            let candidate = Utf8PathBuf::from(format!("{target}.{ext}"));
            if self.fs.file_exists(&candidate) {
                return Some(self.script_module(candidate));
            }
        }

        // Component pass.
        if let Some(resolved) = self.probe_component(base, specifier) {
            return Some(resolved);
        }

        // Directory import.
        for ext in SCRIPT_EXTENSIONS {
            let candidate = target.join(format!("index.{ext}"));
            if self.fs.file_exists(&candidate) {
                return Some(self.script_module(candidate));
            }
        }

        None
    }

    fn probe_component(&self, base: &Utf8Path, specifier: &str) -> Option<ResolvedModule> {
        let target = normalize(base.join(specifier));
        let candidate = if is_component_path(&target) {
            target
        } else {
            Utf8PathBuf::from(format!("{target}.{COMPONENT_EXTENSION}"))
        };
        if !self.fs.file_exists(&candidate) {
            return None;
        }
        let script_kind = self
            .store
            .get(&candidate)
            .map(|snapshot| snapshot.script_kind())
            .unwrap_or(ScriptKind::Tsx);
        Some(ResolvedModule {
            path: candidate,
            script_kind,
        })
    }

    fn script_module(&self, path: Utf8PathBuf) -> ResolvedModule {
        ResolvedModule {
            script_kind: ScriptKind::from_extension(&path),
            path,
        }
    }
}

/// Collapses `.` and `..` segments without touching the file system.
fn normalize(path: Utf8PathBuf) -> Utf8PathBuf {
    let mut parts: Vec<&str> = Vec::new();
    let mut leading = Utf8PathBuf::new();
    for component in path.components() {
        use camino::Utf8Component;
        match component {
            Utf8Component::Prefix(_) | Utf8Component::RootDir => {
                leading.push(component.as_str());
            }
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                if parts.pop().is_none() {
                    leading.push("..");
                }
            }
            Utf8Component::Normal(part) => parts.push(part),
        }
    }
    let mut result = leading;
    for part in parts {
        result.push(part);
    }
    result
}
