//! Transform adapter: turns a component document into a purely-script
//! view an ordinary type-checking engine can analyze.
//!
//! The transform is opaque to its consumers: input component text, output
//! generated script text plus an optional source map, a prepended-line
//! count, and exported-symbol metadata. It never fails outward; a
//! document that cannot be transformed yields its original text and a
//! soft parser diagnostic instead.

mod exports;
mod rewrite;
mod transform;

pub use exports::{classify_exports, ExportedNames};
pub use rewrite::Rewriter;
pub use transform::{transform, ParserDiagnostic, TransformOptions, TransformOutput};
