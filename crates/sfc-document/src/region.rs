//! Region extraction: turning raw component text into typed spans.

use std::collections::HashMap;

use sfc_mapping::Span;

/// The four region kinds a component file may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// The instance script block.
    Script,
    /// The auxiliary `<script context="module">` block.
    ModuleScript,
    /// The style block.
    Style,
    /// An explicit `<template>` block.
    Template,
}

/// A labeled contiguous span within a component document.
///
/// `container` covers the enclosing tag including its delimiters; `content`
/// covers only the inner text. By construction
/// `container.start <= content.start <= content.end <= container.end` and
/// regions of different kinds never overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// What kind of region this is.
    pub kind: RegionKind,
    /// The language of the region content. Always present: when the tag
    /// carries no `lang`/`type` attribute a per-kind default is injected.
    pub lang: String,
    /// Attributes from the opening tag, with the defaulted `lang` included.
    pub attributes: HashMap<String, String>,
    /// The whole tag, delimiters included.
    pub container: Span,
    /// The inner text only.
    pub content: Span,
    /// True when the tag was unterminated and the region was recovered
    /// best-effort to the end of the file.
    pub malformed: bool,
}

impl Region {
    /// Slices the region content out of the owning document's text.
    pub fn content_text<'a>(&self, text: &'a str) -> &'a str {
        &text[u32::from(self.content.start) as usize..u32::from(self.content.end) as usize]
    }
}

/// The regions extracted from one component file, each nullable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Regions {
    /// The instance script region.
    pub script: Option<Region>,
    /// The module script region.
    pub module_script: Option<Region>,
    /// The style region.
    pub style: Option<Region>,
    /// The explicit template region.
    pub template: Option<Region>,
}

impl Regions {
    /// Returns the single region of the given kind, if present.
    pub fn get(&self, kind: RegionKind) -> Option<&Region> {
        match kind {
            RegionKind::Script => self.script.as_ref(),
            RegionKind::ModuleScript => self.module_script.as_ref(),
            RegionKind::Style => self.style.as_ref(),
            RegionKind::Template => self.template.as_ref(),
        }
    }

    /// The script region, falling back to the module script.
    pub fn script_or_module(&self) -> Option<&Region> {
        self.script.as_ref().or(self.module_script.as_ref())
    }

    /// True if any region was recovered from an unterminated tag.
    pub fn any_malformed(&self) -> bool {
        self.iter().any(|region| region.malformed)
    }

    /// Iterates over the present regions.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        [
            self.script.as_ref(),
            self.module_script.as_ref(),
            self.style.as_ref(),
            self.template.as_ref(),
        ]
        .into_iter()
        .flatten()
    }

    fn slot(&mut self, kind: RegionKind) -> &mut Option<Region> {
        match kind {
            RegionKind::Script => &mut self.script,
            RegionKind::ModuleScript => &mut self.module_script,
            RegionKind::Style => &mut self.style,
            RegionKind::Template => &mut self.template,
        }
    }
}

/// One attribute-position token inside an opening tag.
#[derive(Debug, Clone)]
pub(crate) struct AttrToken {
    /// The token's span in the document text.
    pub span: Span,
    /// Attribute name and its text, absent for `{expr}` shorthands.
    pub name: Option<String>,
    /// The value text with quotes stripped, if a value was present.
    pub value: Option<String>,
    /// True for a brace-delimited expression in attribute position.
    pub shorthand: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct ScannedTag {
    pub name: String,
    pub attrs: Vec<AttrToken>,
    /// Offset just past the `>`, or `None` for an unterminated tag.
    pub open_end: Option<usize>,
    pub self_closing: bool,
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b':' || byte == b'_'
}

/// Skips a brace-delimited expression starting at `{`, honoring nested
/// braces and string literals. Returns the offset just past the closing
/// brace, or the text length if unterminated.
fn skip_braced(bytes: &[u8], start: usize) -> usize {
    debug_assert_eq!(bytes[start], b'{');
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = start;
    while i < bytes.len() {
        let byte = bytes[i];
        match quote {
            Some(q) => {
                if byte == b'\\' {
                    i += 1;
                } else if byte == q {
                    quote = None;
                }
            }
            None => match byte {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return i + 1;
                    }
                }
                b'"' | b'\'' | b'`' => quote = Some(byte),
                _ => {}
            },
        }
        i += 1;
    }
    bytes.len()
}

/// Scans an opening tag at `lt` (which must point at `<`).
///
/// Returns `None` when the text at `lt` is not a tag at all.
pub(crate) fn scan_open_tag(text: &str, lt: usize) -> Option<ScannedTag> {
    let bytes = text.as_bytes();
    let name_start = lt + 1;
    if name_start >= bytes.len() || !bytes[name_start].is_ascii_alphabetic() {
        return None;
    }

    let mut i = name_start;
    while i < bytes.len() && is_name_byte(bytes[i]) {
        i += 1;
    }
    let name = text[name_start..i].to_string();
    let mut attrs = Vec::new();

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            return Some(ScannedTag {
                name,
                attrs,
                open_end: None,
                self_closing: false,
            });
        }
        match bytes[i] {
            b'>' => {
                return Some(ScannedTag {
                    name,
                    attrs,
                    open_end: Some(i + 1),
                    self_closing: false,
                });
            }
            b'/' if bytes.get(i + 1) == Some(&b'>') => {
                return Some(ScannedTag {
                    name,
                    attrs,
                    open_end: Some(i + 2),
                    self_closing: true,
                });
            }
            b'{' => {
                let end = skip_braced(bytes, i);
                attrs.push(AttrToken {
                    span: Span::new(i as u32, end as u32),
                    name: None,
                    value: None,
                    shorthand: true,
                });
                i = end;
            }
            _ => {
                let attr_start = i;
                while i < bytes.len()
                    && !bytes[i].is_ascii_whitespace()
                    && bytes[i] != b'='
                    && bytes[i] != b'>'
                    && bytes[i] != b'{'
                    && !(bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>'))
                {
                    i += 1;
                }
                if i == attr_start {
                    // Stray byte; step over it so the scan always advances.
                    i += 1;
                    continue;
                }
                let attr_name = text[attr_start..i].to_string();

                let mut j = i;
                while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                let mut value = None;
                if bytes.get(j) == Some(&b'=') {
                    j += 1;
                    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                        j += 1;
                    }
                    match bytes.get(j) {
                        Some(&q @ (b'"' | b'\'')) => {
                            let value_start = j + 1;
                            let mut k = value_start;
                            while k < bytes.len() && bytes[k] != q {
                                k += 1;
                            }
                            value = Some(text[value_start..k.min(bytes.len())].to_string());
                            j = (k + 1).min(bytes.len());
                        }
                        Some(&b'{') => {
                            let end = skip_braced(bytes, j);
                            value = Some(text[j..end].to_string());
                            j = end;
                        }
                        Some(_) => {
                            let value_start = j;
                            while j < bytes.len()
                                && !bytes[j].is_ascii_whitespace()
                                && bytes[j] != b'>'
                            {
                                j += 1;
                            }
                            value = Some(text[value_start..j].to_string());
                        }
                        None => {}
                    }
                    i = j;
                }
                attrs.push(AttrToken {
                    span: Span::new(attr_start as u32, i as u32),
                    name: Some(attr_name),
                    value,
                    shorthand: false,
                });
            }
        }
    }
}

fn default_lang(kind: RegionKind) -> &'static str {
    match kind {
        RegionKind::Script | RegionKind::ModuleScript => "ts",
        RegionKind::Style => "css",
        RegionKind::Template => "html",
    }
}

fn build_region(
    kind: RegionKind,
    tag: &ScannedTag,
    container: Span,
    content: Span,
    malformed: bool,
) -> Region {
    let mut attributes: HashMap<String, String> = tag
        .attrs
        .iter()
        .filter_map(|attr| {
            let name = attr.name.clone()?;
            Some((name, attr.value.clone().unwrap_or_default()))
        })
        .collect();

    let lang = attributes
        .get("lang")
        .or_else(|| attributes.get("type"))
        .map(|value| value.trim_start_matches("text/").to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default_lang(kind).to_string());
    attributes
        .entry("lang".to_string())
        .or_insert_with(|| lang.clone());

    Region {
        kind,
        lang,
        attributes,
        container,
        content,
        malformed,
    }
}

fn region_kind_for(tag: &ScannedTag) -> Option<RegionKind> {
    match tag.name.as_str() {
        "script" => {
            let is_module = tag.attrs.iter().any(|attr| {
                attr.name.as_deref() == Some("context")
                    && attr.value.as_deref() == Some("module")
            });
            Some(if is_module {
                RegionKind::ModuleScript
            } else {
                RegionKind::Script
            })
        }
        "style" => Some(RegionKind::Style),
        "template" => Some(RegionKind::Template),
        _ => None,
    }
}

/// Extracts the typed regions from raw component text.
///
/// Deterministic and pure: identical text always yields identical
/// boundaries. Markup comments never produce regions. Unterminated tags
/// recover best-effort to the end of the file. A file containing no markup
/// tags at all is treated as one script region spanning the whole file.
pub fn extract_regions(text: &str) -> Regions {
    let bytes = text.as_bytes();
    let mut regions = Regions::default();
    let mut saw_tag = false;
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
        if text[i..].starts_with("</") {
            saw_tag = true;
            i = match text[i..].find('>') {
                Some(gt) => i + gt + 1,
                None => bytes.len(),
            };
            continue;
        }

        let Some(tag) = scan_open_tag(text, i) else {
            i += 1;
            continue;
        };
        saw_tag = true;

        let Some(kind) = region_kind_for(&tag) else {
            // Plain markup tag: resume right after it so regions nested in
            // markup are still found.
            i = tag.open_end.unwrap_or(bytes.len());
            continue;
        };

        let (container, content, malformed, resume) = match tag.open_end {
            None => {
                // `<script` with no closing `>`.
                let eof = Span::empty(bytes.len() as u32);
                (
                    Span::new(i as u32, bytes.len() as u32),
                    eof,
                    true,
                    bytes.len(),
                )
            }
            Some(open_end) if tag.self_closing => (
                Span::new(i as u32, open_end as u32),
                Span::empty(open_end as u32),
                false,
                open_end,
            ),
            Some(open_end) => {
                let close_pat = format!("</{}", tag.name);
                match text[open_end..].find(&close_pat) {
                    Some(rel) => {
                        let content_end = open_end + rel;
                        let container_end = match text[content_end..].find('>') {
                            Some(gt) => content_end + gt + 1,
                            None => bytes.len(),
                        };
                        (
                            Span::new(i as u32, container_end as u32),
                            Span::new(open_end as u32, content_end as u32),
                            false,
                            container_end,
                        )
                    }
                    None => (
                        Span::new(i as u32, bytes.len() as u32),
                        Span::new(open_end as u32, bytes.len() as u32),
                        true,
                        bytes.len(),
                    ),
                }
            }
        };

        let slot = regions.slot(kind);
        if slot.is_none() {
            *slot = Some(build_region(kind, &tag, container, content, malformed));
        }
        i = resume;
    }

    if !saw_tag && regions.script.is_none() {
        // No markup at all: the whole file is script content.
        let whole = Span::new(0u32, bytes.len() as u32);
        regions.script = Some(Region {
            kind: RegionKind::Script,
            lang: default_lang(RegionKind::Script).to_string(),
            attributes: HashMap::from([(
                "lang".to_string(),
                default_lang(RegionKind::Script).to_string(),
            )]),
            container: whole,
            content: whole,
            malformed: false,
        });
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn span(start: u32, end: u32) -> Span {
        Span::new(start, end)
    }

    #[test]
    fn extracts_all_four_regions() {
        let text = concat!(
            "<script context=\"module\">export const id = 1;</script>\n",
            "<script lang=\"ts\">let x = state(1);</script>\n",
            "<template><div>{x}</div></template>\n",
            "<style>.a { color: red; }</style>\n",
        );
        let regions = extract_regions(text);

        let module = regions.module_script.as_ref().unwrap();
        assert_eq!(module.content_text(text), "export const id = 1;");

        let script = regions.script.as_ref().unwrap();
        assert_eq!(script.content_text(text), "let x = state(1);");
        assert_eq!(script.lang, "ts");

        let template = regions.template.as_ref().unwrap();
        assert_eq!(template.content_text(text), "<div>{x}</div>");

        let style = regions.style.as_ref().unwrap();
        assert_eq!(style.content_text(text), ".a { color: red; }");
        assert_eq!(style.lang, "css");
    }

    #[test]
    fn region_invariants_hold() {
        let text = "<div>x</div><script>let a = 1;</script>";
        let regions = extract_regions(text);
        for region in regions.iter() {
            assert!(region.container.start <= region.content.start);
            assert!(region.content.start <= region.content.end);
            assert!(region.content.end <= region.container.end);
        }
    }

    #[test]
    fn extraction_is_idempotent() {
        let text = "<script>let a = 1;</script><style>.x{}</style><p>{a}</p>";
        assert_eq!(extract_regions(text), extract_regions(text));
    }

    #[test]
    fn comments_do_not_produce_regions() {
        let text = "<!-- <script>let hidden = 1;</script> --><div>x</div>";
        let regions = extract_regions(text);
        assert!(regions.script.is_none());
    }

    #[test]
    fn unterminated_script_recovers_to_eof() {
        let text = "<div>a</div><script>let x = 1;";
        let regions = extract_regions(text);
        let script = regions.script.as_ref().unwrap();
        assert!(script.malformed);
        assert_eq!(script.container, span(12, text.len() as u32));
        assert_eq!(script.content_text(text), "let x = 1;");
    }

    #[test]
    fn default_languages_are_injected() {
        let text = "<script>let a = 1;</script><style></style>";
        let regions = extract_regions(text);
        assert_eq!(regions.script.as_ref().unwrap().lang, "ts");
        assert_eq!(
            regions.script.as_ref().unwrap().attributes.get("lang"),
            Some(&"ts".to_string())
        );
        assert_eq!(regions.style.as_ref().unwrap().lang, "css");
    }

    #[test]
    fn type_attribute_media_prefix_is_stripped() {
        let text = "<script type=\"text/javascript\">var a;</script>";
        let regions = extract_regions(text);
        assert_eq!(regions.script.as_ref().unwrap().lang, "javascript");
    }

    #[test]
    fn first_region_of_a_kind_wins() {
        let text = "<style>.a{}</style><style>.b{}</style>";
        let regions = extract_regions(text);
        assert_eq!(regions.style.as_ref().unwrap().content_text(text), ".a{}");
    }

    #[test]
    fn tagless_file_is_all_script() {
        let text = "let x = state(1);\nexport const y = x;\n";
        let regions = extract_regions(text);
        let script = regions.script.as_ref().unwrap();
        assert_eq!(script.container, span(0, text.len() as u32));
        assert_eq!(script.content, script.container);
        assert!(regions.style.is_none());
        assert!(regions.template.is_none());
        assert!(regions.module_script.is_none());
    }

    #[test]
    fn module_script_is_distinguished() {
        let text = "<script context=\"module\">const a = 1;</script>";
        let regions = extract_regions(text);
        assert!(regions.script.is_none());
        assert!(regions.module_script.is_some());
    }

    #[test]
    fn attribute_values_with_braces_are_skipped() {
        let text = "<div onclick={() => { go('}'); }}><script>let a;</script></div>";
        let regions = extract_regions(text);
        // The brace expression must not swallow the following script tag.
        assert_eq!(regions.script.as_ref().unwrap().content_text(text), "let a;");
    }
}
