//! Project layer: the per-configuration container that owns an engine
//! instance, the snapshot cache, the module-resolution shim and the
//! size-based degradation policy.

mod config;
mod container;
mod engine;
mod error;
mod fs;
mod registry;
mod resolver;
mod shim;
mod store;
mod tasks;

pub use config::{CompilerOptions, ProjectConfig};
pub use container::{ContainerHost, DegradedCallback, ProjectContainer};
pub use engine::{EngineFactory, EngineHost, LanguageEngine};
pub use error::ProjectError;
pub use fs::{FileSystemShim, MemoryFileSystem, OsFileSystem};
pub use registry::ProjectRegistry;
pub use resolver::{ModuleResolver, ResolutionCache, ResolvedModule};
pub use shim::ComponentFileSystem;
pub use store::{SizeBudget, SnapshotStore};
pub use tasks::{CancelToken, Debouncer};
