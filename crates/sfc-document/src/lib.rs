//! Document and region model for single-file components.
//!
//! A component file interleaves markup with up to one script block, one
//! module-script block, one style block and one explicit template block.
//! This crate extracts those typed regions from raw text and owns the
//! mutable, versioned [`Document`] the rest of the pipeline snapshots from.

mod document;
mod markup;
mod region;

pub use document::{Document, TextEdit};
pub use markup::shorthand_attribute_at;
pub use region::{extract_regions, Region, RegionKind, Regions};
