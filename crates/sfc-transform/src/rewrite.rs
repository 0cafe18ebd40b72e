//! Incremental rewriting of component text into generated script text.

use sfc_mapping::{LineCol, MapBuilder, RawSourceMap};

/// Accumulates generated text while recording which runs came verbatim
/// from the original document.
#[derive(Debug, Default)]
pub struct Rewriter {
    out: String,
    builder: MapBuilder,
}

impl Rewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Byte length of the generated text so far.
    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Appends synthetic text with no original counterpart.
    pub fn raw(&mut self, text: &str) {
        self.out.push_str(text);
        self.builder.add_generated(text);
    }

    /// Appends a run copied unchanged from the original, mapping every
    /// generated line of it back to `orig`.
    pub fn verbatim(&mut self, orig: LineCol, text: &str) {
        self.out.push_str(text);
        self.builder.add_verbatim(orig, text);
    }

    /// Appends replacement text standing in for original content at `orig`.
    pub fn substitution(&mut self, orig: LineCol, text: &str) {
        self.out.push_str(text);
        self.builder.add_substitution(orig, text);
    }

    /// Finishes, encoding the recorded runs into a map that names `source`
    /// as its single original file.
    pub fn finish(self, source: &str, file: Option<String>) -> (String, RawSourceMap) {
        let map = self.builder.build(source, file);
        (self.out, map)
    }

    /// Finishes without producing a map.
    pub fn into_text(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfc_mapping::SourceMapConsumer;

    #[test]
    fn verbatim_runs_map_back_to_their_origin() {
        let mut rewriter = Rewriter::new();
        rewriter.raw("// header\n");
        rewriter.verbatim(LineCol::new(1, 4), "ccc");

        let (text, map) = rewriter.finish("a.sfc", None);
        assert_eq!(text, "// header\nccc");

        let consumer = SourceMapConsumer::parse(&map).unwrap();
        assert_eq!(
            consumer.original_position(LineCol::new(1, 2)),
            Some(LineCol::new(1, 6))
        );
    }

    #[test]
    fn raw_only_output_has_no_mappings() {
        let mut rewriter = Rewriter::new();
        rewriter.raw("synthetic\n");
        let (_, map) = rewriter.finish("a.sfc", None);
        let consumer = SourceMapConsumer::parse(&map).unwrap();
        assert!(consumer.is_empty());
    }
}
