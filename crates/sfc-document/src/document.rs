use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use sfc_mapping::{floor_char_boundary, ByteOffset, LineCol, LineIndex};

use crate::region::{extract_regions, Region, RegionKind, Regions};

/// A single text change. `range == None` replaces the whole document.
#[derive(Debug, Clone)]
pub struct TextEdit {
    pub range: Option<(LineCol, LineCol)>,
    pub text: String,
}

impl TextEdit {
    pub fn full(text: impl Into<String>) -> Self {
        TextEdit {
            range: None,
            text: text.into(),
        }
    }

    pub fn range(start: LineCol, end: LineCol, text: impl Into<String>) -> Self {
        TextEdit {
            range: Some((start, end)),
            text: text.into(),
        }
    }
}

/// An open component file: its text plus everything derived from it.
///
/// The line index and extracted regions are rebuilt eagerly on every
/// mutation, so observers always see text, index, and regions in
/// agreement. Versions increase monotonically and never repeat for
/// different content of the same document.
#[derive(Debug, Clone)]
pub struct Document {
    path: Utf8PathBuf,
    text: String,
    version: u64,
    line_index: Arc<LineIndex>,
    regions: Regions,
}

impl Document {
    pub fn new(path: impl Into<Utf8PathBuf>, text: impl Into<String>, version: u64) -> Self {
        let text = text.into();
        let line_index = Arc::new(LineIndex::new(&text));
        let regions = extract_regions(&text);
        Document {
            path: path.into(),
            text,
            version,
            line_index,
            regions,
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn line_index(&self) -> &Arc<LineIndex> {
        &self.line_index
    }

    pub fn regions(&self) -> &Regions {
        &self.regions
    }

    pub fn region(&self, kind: RegionKind) -> Option<&Region> {
        self.regions.get(kind)
    }

    /// Replaces the whole text and bumps the version.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.rebuilt();
    }

    /// Applies a batch of edits as one atomic update: a single version
    /// bump, with the derived state rebuilt once at the end. Each edit's
    /// range is resolved against the text as the previous edits left it.
    pub fn apply_edits(&mut self, edits: &[TextEdit]) {
        for edit in edits {
            match edit.range {
                None => self.text = edit.text.clone(),
                Some((start, end)) => {
                    let index = LineIndex::new(&self.text);
                    let start =
                        floor_char_boundary(&self.text, index.offset_at(start).into());
                    let end = floor_char_boundary(
                        &self.text,
                        usize::from(index.offset_at(end)).max(start),
                    );
                    self.text.replace_range(start..end, &edit.text);
                }
            }
        }
        self.rebuilt();
    }

    pub fn offset_at(&self, position: LineCol) -> ByteOffset {
        self.line_index.offset_at(position)
    }

    pub fn position_at(&self, offset: ByteOffset) -> LineCol {
        self.line_index.position_at(offset)
    }

    fn rebuilt(&mut self) {
        self.version += 1;
        self.line_index = Arc::new(LineIndex::new(&self.text));
        self.regions = extract_regions(&self.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(text: &str) -> Document {
        Document::new("/app/widget.sfc", text, 1)
    }

    #[test]
    fn derived_state_tracks_the_text() {
        let mut document = doc("<script>let a = 1;</script>");
        assert!(document.region(RegionKind::Script).is_some());

        document.set_text("<style>.a{}</style>");
        assert!(document.region(RegionKind::Script).is_none());
        assert!(document.region(RegionKind::Style).is_some());
        assert_eq!(document.version(), 2);
    }

    #[test]
    fn edit_batch_bumps_version_once() {
        let mut document = doc("let a = 1;\nlet b = 2;\n");
        document.apply_edits(&[
            TextEdit::range(LineCol::new(0, 4), LineCol::new(0, 5), "first"),
            TextEdit::range(LineCol::new(1, 4), LineCol::new(1, 5), "second"),
        ]);
        assert_eq!(document.text(), "let first = 1;\nlet second = 2;\n");
        assert_eq!(document.version(), 2);
    }

    #[test]
    fn full_replacement_edit() {
        let mut document = doc("old");
        document.apply_edits(&[TextEdit::full("brand new")]);
        assert_eq!(document.text(), "brand new");
        assert_eq!(document.version(), 2);
    }

    #[test]
    fn edit_offsets_inside_multibyte_chars_round_down() {
        let mut document = doc("<p>héllo</p>");
        // Column 5 is the middle byte of 'é'.
        document.apply_edits(&[TextEdit::range(
            LineCol::new(0, 5),
            LineCol::new(0, 6),
            "e",
        )]);
        assert_eq!(document.text(), "<p>hello</p>");
    }

    #[test]
    fn positions_round_trip_through_the_index() {
        let document = doc("let a = 1;\nlet b = 2;\n");
        let offset = document.offset_at(LineCol::new(1, 4));
        assert_eq!(document.position_at(offset), LineCol::new(1, 4));
    }
}
