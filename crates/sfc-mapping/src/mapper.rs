//! The three position-mapping strategies.
//!
//! A snapshot picks one strategy when its fragment is created:
//!
//! - [`IdentityMapper`] — generated coordinates equal original coordinates
//!   (passthrough scripts, or transforms that changed nothing).
//! - [`FragmentOffsetMapper`] — a single contiguous substitution moved the
//!   script region by a fixed offset; no source map exists.
//! - [`ConsumerMapper`] — a real v3 source map exists; lookups go through
//!   the decoded segment tables, adjusted for prepended lines.
//!
//! All mapping operations are total: out-of-range input produces a clamped
//! best-effort position, and only `is_in_generated` tells the caller whether
//! the answer is reliable.

use std::sync::Arc;

use crate::consumer::SourceMapConsumer;
use crate::offsets::{ByteOffset, LineCol, LineIndex, Span};

/// Maps positions 1:1.
#[derive(Debug, Default)]
pub struct IdentityMapper;

/// Maps by the fixed offset between the original script region and its
/// location in the generated text.
///
/// Only valid while the transform kept the region contents byte-identical
/// and in order; anything outside the region is not in generated content.
#[derive(Debug)]
pub struct FragmentOffsetMapper {
    original_index: Arc<LineIndex>,
    generated_index: Arc<LineIndex>,
    /// The script content span in the original text.
    original_span: Span,
    /// Where that content starts in the generated text.
    generated_start: ByteOffset,
}

impl FragmentOffsetMapper {
    /// Creates a mapper for a region moved as one block.
    pub fn new(
        original_index: Arc<LineIndex>,
        generated_index: Arc<LineIndex>,
        original_span: Span,
        generated_start: ByteOffset,
    ) -> Self {
        Self {
            original_index,
            generated_index,
            original_span,
            generated_start,
        }
    }

    fn generated_span(&self) -> Span {
        Span::new(
            self.generated_start,
            self.generated_start + self.original_span.len(),
        )
    }

    fn to_generated(&self, pos: LineCol) -> LineCol {
        let offset = self.original_span.clamp(self.original_index.offset_at(pos));
        let generated = self.generated_start + (offset - self.original_span.start);
        self.generated_index.position_at(generated)
    }

    fn to_original(&self, pos: LineCol) -> LineCol {
        let offset = self
            .generated_span()
            .clamp(self.generated_index.offset_at(pos));
        let original = self.original_span.start + (offset - self.generated_start);
        self.original_index.position_at(original)
    }

    fn is_in_generated(&self, pos: LineCol) -> bool {
        self.original_span
            .contains_inclusive(self.original_index.offset_at(pos))
    }
}

/// Maps through a decoded v3 source map.
#[derive(Debug)]
pub struct ConsumerMapper {
    consumer: SourceMapConsumer,
    /// Lines injected at the top of the generated text after the map was
    /// produced (e.g. a hoisted check directive).
    prepended_lines: u32,
}

impl ConsumerMapper {
    /// Wraps a decoded map, accounting for `prepended_lines`.
    pub fn new(consumer: SourceMapConsumer, prepended_lines: u32) -> Self {
        Self {
            consumer,
            prepended_lines,
        }
    }

    fn to_generated(&self, pos: LineCol) -> LineCol {
        match self.consumer.generated_position(pos) {
            Some(gen) => LineCol::new(gen.line + self.prepended_lines, gen.col),
            None => LineCol::new(pos.line + self.prepended_lines, pos.col),
        }
    }

    fn to_original(&self, pos: LineCol) -> LineCol {
        let line = pos.line.saturating_sub(self.prepended_lines);
        let adjusted = LineCol::new(line, pos.col);
        self.consumer.original_position(adjusted).unwrap_or(adjusted)
    }

    fn is_in_generated(&self, pos: LineCol) -> bool {
        self.consumer.generated_position(pos).is_some()
    }
}

/// The closed set of mapping strategies shared by every fragment.
#[derive(Debug)]
pub enum PositionMapper {
    /// Generated == original.
    Identity(IdentityMapper),
    /// Fixed-offset block move, no source map.
    FragmentOffset(FragmentOffsetMapper),
    /// Real source map.
    Consumer(ConsumerMapper),
}

impl PositionMapper {
    /// Maps an original position into generated coordinates.
    pub fn to_generated(&self, pos: LineCol) -> LineCol {
        match self {
            Self::Identity(_) => pos,
            Self::FragmentOffset(mapper) => mapper.to_generated(pos),
            Self::Consumer(mapper) => mapper.to_generated(pos),
        }
    }

    /// Maps a generated position back into original coordinates.
    pub fn to_original(&self, pos: LineCol) -> LineCol {
        match self {
            Self::Identity(_) => pos,
            Self::FragmentOffset(mapper) => mapper.to_original(pos),
            Self::Consumer(mapper) => mapper.to_original(pos),
        }
    }

    /// Whether an original position has a counterpart in the generated text.
    /// When this is false the mapped positions are best-effort only.
    pub fn is_in_generated(&self, pos: LineCol) -> bool {
        match self {
            Self::Identity(_) => true,
            Self::FragmentOffset(mapper) => mapper.is_in_generated(pos),
            Self::Consumer(mapper) => mapper.is_in_generated(pos),
        }
    }
}
