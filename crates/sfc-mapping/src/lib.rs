//! Position mapping between original component files and the generated
//! script views handed to the type-checking engine.
//!
//! Everything the engine reports comes back in generated coordinates; this
//! crate owns the machinery to translate those coordinates to the original
//! component file and back:
//!
//! - byte offsets, spans and line indexes,
//! - standard version-3 source maps (raw form, VLQ codec, builder, consumer),
//! - the three mapper strategies (`Identity`, `FragmentOffset`, `Consumer`).

mod builder;
mod consumer;
mod mapper;
mod offsets;
mod raw;
mod vlq;

pub use builder::MapBuilder;
pub use consumer::SourceMapConsumer;
pub use mapper::{ConsumerMapper, FragmentOffsetMapper, IdentityMapper, PositionMapper};
pub use offsets::{floor_char_boundary, ByteOffset, LineCol, LineIndex, Span};
pub use raw::{RawSourceMap, SourceMapError};
