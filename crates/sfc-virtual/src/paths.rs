//! The virtual path convention.
//!
//! The engine only understands script files, so a component at
//! `widget.sfc` is presented to it as `widget.sfc.ts`. Every boundary
//! that receives a path normalizes between the two forms through the
//! helpers here.

use camino::{Utf8Path, Utf8PathBuf};

/// Extension of component files on disk.
pub const COMPONENT_EXTENSION: &str = "sfc";

/// Suffix of the synthetic paths the engine sees for components.
pub const VIRTUAL_SUFFIX: &str = ".sfc.ts";

/// True for a real component file path (`widget.sfc`).
pub fn is_component_path(path: &Utf8Path) -> bool {
    path.extension() == Some(COMPONENT_EXTENSION)
}

/// True for the synthetic engine-facing form (`widget.sfc.ts`).
pub fn is_virtual_component_path(path: &Utf8Path) -> bool {
    path.as_str().ends_with(VIRTUAL_SUFFIX)
}

/// The engine-facing name for a path. Component paths gain the script
/// extension; anything else passes through unchanged.
pub fn to_virtual_path(path: &Utf8Path) -> Utf8PathBuf {
    if is_component_path(path) {
        Utf8PathBuf::from(format!("{path}.ts"))
    } else {
        path.to_owned()
    }
}

/// The on-disk name for a path. Virtual component paths lose the
/// synthetic suffix; anything else passes through unchanged.
pub fn ensure_real_path(path: &Utf8Path) -> Utf8PathBuf {
    match path.as_str().strip_suffix(".ts") {
        Some(stripped) if stripped.ends_with(&format!(".{COMPONENT_EXTENSION}")) => {
            Utf8PathBuf::from(stripped)
        }
        _ => path.to_owned(),
    }
}
