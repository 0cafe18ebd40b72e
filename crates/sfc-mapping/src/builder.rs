//! Incremental construction of a v3 source map during transformation.

use crate::offsets::LineCol;
use crate::raw::RawSourceMap;
use crate::vlq;

#[derive(Debug, Clone, Copy)]
struct Segment {
    gen_col: u32,
    /// `None` is a terminator: it closes the preceding run without mapping
    /// anything itself, and encodes as a one-field segment.
    orig: Option<LineCol>,
}

/// Builds `mappings` while the transform writes generated text.
///
/// The builder tracks the generated cursor itself: callers feed it every
/// piece of output in order and tell it whether the piece copies original
/// text verbatim, substitutes for an original span, or is purely synthetic.
#[derive(Debug, Default)]
pub struct MapBuilder {
    lines: Vec<Vec<Segment>>,
    gen_line: u32,
    gen_col: u32,
}

impl MapBuilder {
    /// Creates an empty builder positioned at generated 0:0.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current generated cursor.
    #[inline]
    pub fn generated_position(&self) -> LineCol {
        LineCol::new(self.gen_line, self.gen_col)
    }

    fn push_segment(&mut self, orig: Option<LineCol>) {
        let line = self.gen_line as usize;
        if self.lines.len() <= line {
            self.lines.resize_with(line + 1, Vec::new);
        }
        self.lines[line].push(Segment {
            gen_col: self.gen_col,
            orig,
        });
    }

    fn advance(&mut self, text: &str) {
        for byte in text.bytes() {
            if byte == b'\n' {
                self.gen_line += 1;
                self.gen_col = 0;
            } else {
                self.gen_col += 1;
            }
        }
    }

    /// Records synthetic output with no original counterpart.
    pub fn add_generated(&mut self, text: &str) {
        self.advance(text);
    }

    /// Records text copied verbatim from the original at `orig`.
    ///
    /// One segment is emitted at the start of the run and one after every
    /// newline, so any position inside the run maps exactly by column delta.
    /// A terminator after the run marks where it ends; positions past it are
    /// not part of the run.
    pub fn add_verbatim(&mut self, orig: LineCol, text: &str) {
        if text.is_empty() {
            return;
        }
        self.push_segment(Some(orig));
        let mut orig_line = orig.line;
        let bytes = text.as_bytes();
        for (i, byte) in bytes.iter().enumerate() {
            if *byte == b'\n' {
                self.gen_line += 1;
                self.gen_col = 0;
                orig_line += 1;
                // A verbatim run crosses original newlines in lockstep, so
                // the text after this newline starts at column 0 there.
                if i + 1 < bytes.len() {
                    self.push_segment(Some(LineCol::new(orig_line, 0)));
                }
            } else {
                self.gen_col += 1;
            }
        }
        self.push_segment(None);
    }

    /// Records replacement text standing in for the original position `orig`.
    /// The whole substitution maps to that single original point.
    pub fn add_substitution(&mut self, orig: LineCol, text: &str) {
        if text.is_empty() {
            return;
        }
        self.push_segment(Some(orig));
        self.advance(text);
        self.push_segment(None);
    }

    /// Encodes the accumulated segments into a raw v3 map.
    pub fn build(self, source: impl Into<String>, file: Option<String>) -> RawSourceMap {
        let mut mappings = String::new();
        let mut prev_orig_line: i64 = 0;
        let mut prev_orig_col: i64 = 0;
        let mut prev_src: i64 = 0;

        for (line_idx, mut line) in self.lines.into_iter().enumerate() {
            if line_idx > 0 {
                mappings.push(';');
            }
            line.sort_by_key(|seg| seg.gen_col);
            let mut prev_gen_col: i64 = 0;
            for (seg_idx, seg) in line.iter().enumerate() {
                if seg_idx > 0 {
                    mappings.push(',');
                }
                vlq::encode(seg.gen_col as i64 - prev_gen_col, &mut mappings);
                prev_gen_col = seg.gen_col as i64;
                if let Some(orig) = seg.orig {
                    vlq::encode(0 - prev_src, &mut mappings);
                    vlq::encode(orig.line as i64 - prev_orig_line, &mut mappings);
                    vlq::encode(orig.col as i64 - prev_orig_col, &mut mappings);
                    prev_src = 0;
                    prev_orig_line = orig.line as i64;
                    prev_orig_col = orig.col as i64;
                }
            }
        }

        RawSourceMap {
            mappings,
            ..RawSourceMap::new(source, file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::SourceMapConsumer;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_builder_builds_empty_map() {
        let map = MapBuilder::new().build("a.sfc", None);
        assert!(map.mappings.is_empty());
        assert_eq!(map.sources, vec!["a.sfc".to_string()]);
    }

    #[test]
    fn verbatim_run_maps_by_column_delta() {
        let mut builder = MapBuilder::new();
        builder.add_generated("// header\n");
        builder.add_verbatim(LineCol::new(4, 2), "let x = 1;");

        let map = builder.build("a.sfc", None);
        let consumer = SourceMapConsumer::parse(&map).unwrap();

        assert_eq!(
            consumer.original_position(LineCol::new(1, 0)),
            Some(LineCol::new(4, 2))
        );
        assert_eq!(
            consumer.original_position(LineCol::new(1, 6)),
            Some(LineCol::new(4, 8))
        );
        // The header line carries no mapping at all.
        assert_eq!(consumer.original_position(LineCol::new(0, 3)), None);
    }

    #[test]
    fn verbatim_run_tracks_newlines() {
        let mut builder = MapBuilder::new();
        builder.add_verbatim(LineCol::new(2, 0), "aa\nbbb\ncc");

        let map = builder.build("a.sfc", None);
        let consumer = SourceMapConsumer::parse(&map).unwrap();

        assert_eq!(
            consumer.original_position(LineCol::new(1, 2)),
            Some(LineCol::new(3, 2))
        );
        assert_eq!(
            consumer.generated_position(LineCol::new(4, 1)),
            Some(LineCol::new(2, 1))
        );
    }

    #[test]
    fn substitution_maps_to_single_point() {
        let mut builder = MapBuilder::new();
        builder.add_substitution(LineCol::new(0, 0), ";(");
        builder.add_verbatim(LineCol::new(0, 8), "body");

        let map = builder.build("a.sfc", None);
        let consumer = SourceMapConsumer::parse(&map).unwrap();

        assert_eq!(
            consumer.original_position(LineCol::new(0, 2)),
            Some(LineCol::new(0, 8))
        );
    }
}
