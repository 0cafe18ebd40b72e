//! Virtual-file layer: the synthetic, purely-script views of component
//! files that the type-checking engine analyzes, and the fragments that
//! translate its answers back into component coordinates.

mod fragment;
mod paths;
mod script_kind;
mod snapshot;

pub use fragment::Fragment;
pub use paths::{
    ensure_real_path, is_component_path, is_virtual_component_path, to_virtual_path,
    COMPONENT_EXTENSION, VIRTUAL_SUFFIX,
};
pub use script_kind::ScriptKind;
pub use snapshot::{
    ComponentSnapshot, ScriptSnapshot, Snapshot, SnapshotOptions, INITIAL_VERSION,
};
