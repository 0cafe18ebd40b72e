//! Decoded source map with bidirectional position lookup.

use crate::offsets::LineCol;
use crate::raw::{RawSourceMap, SourceMapError};
use crate::vlq;

#[derive(Debug, Clone, Copy)]
struct GeneratedSegment {
    gen_col: u32,
    /// `None` for a one-field segment: generated text with no original
    /// counterpart, which also bounds the run before it.
    orig: Option<LineCol>,
}

/// A fully decoded v3 source map.
///
/// Decoding happens once, at construction; lookups afterwards are binary
/// searches with no I/O. The decoded tables are the one heap-heavy mapping
/// resource in the system and are released when the consumer is dropped.
#[derive(Debug)]
pub struct SourceMapConsumer {
    /// Segments grouped by generated line, sorted by generated column.
    by_generated: Vec<Vec<GeneratedSegment>>,
    /// `(original, generated, run length)` triples sorted by original
    /// position. The length is in generated columns; `u32::MAX` means the
    /// segment is the last on its generated line and extends to its end.
    by_original: Vec<(LineCol, LineCol, u32)>,
}

impl SourceMapConsumer {
    /// Decodes a raw map into lookup tables.
    pub fn parse(raw: &RawSourceMap) -> Result<Self, SourceMapError> {
        if raw.version != 3 {
            return Err(SourceMapError::UnsupportedVersion(raw.version));
        }

        let mut by_generated: Vec<Vec<GeneratedSegment>> = Vec::new();
        let mut by_original: Vec<(LineCol, LineCol, u32)> = Vec::new();

        let mut src: i64 = 0;
        let mut orig_line: i64 = 0;
        let mut orig_col: i64 = 0;

        for (gen_line, line) in raw.mappings.split(';').enumerate() {
            let mut gen_col: i64 = 0;
            let mut segments = Vec::new();

            for segment in line.split(',') {
                if segment.is_empty() {
                    continue;
                }
                let fields = vlq::decode_segment(segment).ok_or(
                    SourceMapError::MalformedSegment {
                        line: gen_line as u32,
                    },
                )?;

                gen_col += fields[0];
                // A single-field segment is generated text with no original
                // counterpart; it is kept as a barrier so that the run
                // before it does not extend past its end.
                if fields.len() < 4 {
                    segments.push(GeneratedSegment {
                        gen_col: gen_col.max(0) as u32,
                        orig: None,
                    });
                    continue;
                }

                src += fields[1];
                if src < 0 || src as usize >= raw.sources.len().max(1) {
                    return Err(SourceMapError::SourceIndexOutOfRange {
                        index: src,
                        available: raw.sources.len(),
                    });
                }
                orig_line += fields[2];
                orig_col += fields[3];

                let orig = LineCol::new(orig_line.max(0) as u32, orig_col.max(0) as u32);
                segments.push(GeneratedSegment {
                    gen_col: gen_col.max(0) as u32,
                    orig: Some(orig),
                });
            }

            segments.sort_by_key(|seg| seg.gen_col);
            for (idx, seg) in segments.iter().enumerate() {
                let Some(orig) = seg.orig else { continue };
                let len = match segments.get(idx + 1) {
                    Some(next) => next.gen_col - seg.gen_col,
                    None => u32::MAX,
                };
                by_original.push((orig, LineCol::new(gen_line as u32, seg.gen_col), len));
            }
            by_generated.push(segments);
        }

        by_original.sort();
        Ok(Self {
            by_generated,
            by_original,
        })
    }

    /// Returns true if the map carries no mappings at all.
    pub fn is_empty(&self) -> bool {
        self.by_original.is_empty()
    }

    /// Maps a generated position to its original position.
    ///
    /// The lookup finds the nearest preceding segment on the same generated
    /// line and applies the column delta, which is exact inside verbatim
    /// runs. Returns `None` when the line carries no mapping at or before
    /// the position, or when that segment is an unmapped barrier.
    pub fn original_position(&self, generated: LineCol) -> Option<LineCol> {
        let row = self.by_generated.get(generated.line as usize)?;
        let idx = row.partition_point(|seg| seg.gen_col <= generated.col);
        let seg = row.get(idx.checked_sub(1)?)?;
        let orig = seg.orig?;
        Some(LineCol::new(
            orig.line,
            orig.col + (generated.col - seg.gen_col),
        ))
    }

    /// Maps an original position to its generated position.
    ///
    /// A hit requires a segment on the same original line at or before the
    /// position, and the position must fall inside that segment's run;
    /// anything else is unmapped (e.g. positions inside removed content).
    pub fn generated_position(&self, original: LineCol) -> Option<LineCol> {
        let idx = self
            .by_original
            .partition_point(|(orig, _, _)| *orig <= original);
        let (orig, gen, len) = self.by_original.get(idx.checked_sub(1)?)?;
        if orig.line != original.line {
            return None;
        }
        let delta = original.col - orig.col;
        if delta >= *len {
            return None;
        }
        Some(LineCol::new(gen.line, gen.col + delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MapBuilder;
    use pretty_assertions::assert_eq;

    fn consumer_for(build: impl FnOnce(&mut MapBuilder)) -> SourceMapConsumer {
        let mut builder = MapBuilder::new();
        build(&mut builder);
        SourceMapConsumer::parse(&builder.build("a.sfc", None)).unwrap()
    }

    #[test]
    fn empty_map_maps_nothing() {
        let consumer = consumer_for(|_| {});
        assert!(consumer.is_empty());
        assert_eq!(consumer.original_position(LineCol::new(0, 0)), None);
        assert_eq!(consumer.generated_position(LineCol::new(0, 0)), None);
    }

    #[test]
    fn rejects_wrong_version() {
        let raw = RawSourceMap {
            version: 2,
            ..RawSourceMap::new("a.sfc", None)
        };
        assert!(matches!(
            SourceMapConsumer::parse(&raw),
            Err(SourceMapError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn rejects_malformed_mappings() {
        let raw = RawSourceMap {
            mappings: "AA!A".to_string(),
            ..RawSourceMap::new("a.sfc", None)
        };
        assert!(matches!(
            SourceMapConsumer::parse(&raw),
            Err(SourceMapError::MalformedSegment { line: 0 })
        ));
    }

    #[test]
    fn unmapped_original_line_misses() {
        let consumer = consumer_for(|b| {
            b.add_verbatim(LineCol::new(5, 0), "code here");
        });
        // Line 4 of the original was never emitted.
        assert_eq!(consumer.generated_position(LineCol::new(4, 2)), None);
        assert_eq!(
            consumer.generated_position(LineCol::new(5, 4)),
            Some(LineCol::new(0, 4))
        );
    }

    #[test]
    fn runs_do_not_extend_past_their_recorded_end() {
        let consumer = consumer_for(|b| {
            b.add_verbatim(LineCol::new(0, 8), "let a = 1;");
            b.add_generated(";(<>\n");
        });

        // The run covers original columns [8, 18) and generated [0, 10).
        assert_eq!(
            consumer.generated_position(LineCol::new(0, 17)),
            Some(LineCol::new(0, 9))
        );
        assert_eq!(consumer.generated_position(LineCol::new(0, 18)), None);
        assert_eq!(
            consumer.original_position(LineCol::new(0, 9)),
            Some(LineCol::new(0, 17))
        );
        assert_eq!(consumer.original_position(LineCol::new(0, 10)), None);
    }

    #[test]
    fn roundtrips_inside_verbatim_runs() {
        let consumer = consumer_for(|b| {
            b.add_generated("prelude();\n");
            b.add_verbatim(LineCol::new(1, 8), "let count = state(0);\nuse(count);");
        });

        for (line, col) in [(1u32, 8u32), (1, 15), (2, 0), (2, 7)] {
            let orig = LineCol::new(line, col);
            let gen = consumer.generated_position(orig).unwrap();
            assert_eq!(consumer.original_position(gen), Some(orig));
        }
    }
}
