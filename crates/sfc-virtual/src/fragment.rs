//! The position-mapping handle bound to one snapshot.

use std::sync::Arc;

use sfc_mapping::{ByteOffset, LineCol, LineIndex, PositionMapper, Span};

/// Bidirectional position translation for one snapshot version.
///
/// Holds the mapper strategy the snapshot selected plus line indexes for
/// both coordinate spaces. Decoded source-map tables live inside the
/// mapper and are released when the fragment is dropped.
#[derive(Debug)]
pub struct Fragment {
    mapper: PositionMapper,
    original_index: Arc<LineIndex>,
    generated_index: Arc<LineIndex>,
    /// Original spans that never appear in generated content, regardless
    /// of what the mapper would answer (the style container).
    excluded: Vec<Span>,
}

impl Fragment {
    pub(crate) fn new(
        mapper: PositionMapper,
        original_index: Arc<LineIndex>,
        generated_index: Arc<LineIndex>,
        excluded: Vec<Span>,
    ) -> Self {
        Self {
            mapper,
            original_index,
            generated_index,
            excluded,
        }
    }

    /// Maps an original position into the generated text. Total: input
    /// outside mapped content yields a clamped best-effort position.
    pub fn to_generated(&self, pos: LineCol) -> LineCol {
        self.mapper.to_generated(pos)
    }

    /// Maps a generated position back into the original text.
    pub fn to_original(&self, pos: LineCol) -> LineCol {
        self.mapper.to_original(pos)
    }

    /// Whether an original position has a generated counterpart. False
    /// means mapped answers for it are unreliable and features should
    /// stay silent.
    pub fn is_in_generated(&self, pos: LineCol) -> bool {
        let offset = self.original_index.offset_at(pos);
        if self.excluded.iter().any(|span| span.contains(offset)) {
            return false;
        }
        self.mapper.is_in_generated(pos)
    }

    /// Offset form of [`to_generated`](Self::to_generated).
    pub fn to_generated_offset(&self, offset: ByteOffset) -> ByteOffset {
        let pos = self.original_index.position_at(offset);
        self.generated_index.offset_at(self.to_generated(pos))
    }

    /// Offset form of [`to_original`](Self::to_original).
    pub fn to_original_offset(&self, offset: ByteOffset) -> ByteOffset {
        let pos = self.generated_index.position_at(offset);
        self.original_index.offset_at(self.to_original(pos))
    }

    /// Maps a generated span back to original coordinates, keeping the
    /// result well-formed even when the endpoints map out of order.
    pub fn map_span_to_original(&self, span: Span) -> Span {
        let start = self.to_original_offset(span.start);
        let end = self.to_original_offset(span.end);
        Span::new(start.min(end), start.max(end))
    }

    /// Original-text position for an original byte offset.
    pub fn position_at(&self, offset: ByteOffset) -> LineCol {
        self.original_index.position_at(offset)
    }

    /// Original byte offset for an original-text position.
    pub fn offset_at(&self, pos: LineCol) -> ByteOffset {
        self.original_index.offset_at(pos)
    }
}
