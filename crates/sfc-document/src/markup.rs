//! Markup-level queries that do not need a full template parse.

use sfc_mapping::Span;

use crate::region::scan_open_tag;

/// Returns the span of the brace-delimited shorthand attribute containing
/// `offset`, if the offset sits inside one.
///
/// A shorthand attribute is a `{expr}` token in attribute position, as in
/// `<input {value}>`. Expressions appearing as the value of a named
/// attribute (`disabled={flag}`) are not shorthands and yield `None`.
pub fn shorthand_attribute_at(text: &str, offset: u32) -> Option<Span> {
    let bytes = text.as_bytes();
    let offset_usize = offset as usize;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        if text[i..].starts_with("<!--") {
            i = match text[i + 4..].find("-->") {
                Some(end) => i + 4 + end + 3,
                None => bytes.len(),
            };
            continue;
        }
        let Some(tag) = scan_open_tag(text, i) else {
            i += 1;
            continue;
        };
        let tag_end = tag.open_end.unwrap_or(bytes.len());
        if offset_usize < tag_end {
            return tag
                .attrs
                .iter()
                .find(|attr| {
                    attr.shorthand
                        && u32::from(attr.span.start) <= offset
                        && offset < u32::from(attr.span.end)
                })
                .map(|attr| attr.span);
        }
        i = tag_end;
    }

    None
}
