//! The host-side interface to the external type-checking engine.
//!
//! The engine itself is an external collaborator; this module fixes the
//! contract it is given. Everything the engine can ask about files goes
//! through an [`EngineHost`], which the container implements on top of
//! the snapshot store and the resolution shim.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use sfc_virtual::{ScriptKind, Snapshot};

use crate::resolver::ResolvedModule;

/// The view of a project the container hands the engine. All paths the
/// engine sees are virtual; answers are looked up under the real path.
pub trait EngineHost {
    /// The script names the engine should consider part of the program.
    fn script_file_names(&self) -> Vec<Utf8PathBuf>;
    fn script_version(&self, path: &Utf8Path) -> Option<u64>;
    fn script_snapshot(&self, path: &Utf8Path) -> Option<Arc<Snapshot>>;
    fn script_kind(&self, path: &Utf8Path) -> ScriptKind;
    /// Bumped on every structural change; the engine invalidates derived
    /// state when it moves.
    fn project_version(&self) -> u64;
    fn resolve_module(&self, importer: &Utf8Path, specifier: &str) -> Option<ResolvedModule>;
    fn file_exists(&self, path: &Utf8Path) -> bool;
    fn read_file(&self, path: &Utf8Path) -> Option<String>;
    fn read_directory(&self, path: &Utf8Path) -> Vec<Utf8PathBuf>;
}

/// One live engine instance. Recreated from scratch when a file's script
/// kind changes, because engines do not support live kind changes for an
/// already-opened file.
pub trait LanguageEngine: Send {
    /// Tells the engine the project changed; it re-reads what it needs
    /// from the host.
    fn project_updated(&mut self, host: &dyn EngineHost);

    /// Releases engine resources. Called exactly once, before the
    /// instance is dropped or replaced.
    fn dispose(&mut self);
}

/// Creates engine instances for a project.
pub trait EngineFactory: Send + Sync {
    fn create(&self, host: &dyn EngineHost) -> Box<dyn LanguageEngine>;
}
