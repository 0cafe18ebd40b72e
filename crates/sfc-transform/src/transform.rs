//! The component-to-script transform.

use sfc_document::{Document, Region, Regions};
use sfc_mapping::{ByteOffset, RawSourceMap, Span};
use tracing::debug;

use crate::exports::{classify_exports, ExportedNames};
use crate::rewrite::Rewriter;

/// Options controlling a single transform invocation.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// The file name recorded in the emitted source map.
    pub filename: Option<String>,
    /// Whether to build a source map at all. Without one, consumers fall
    /// back to offset-based mapping anchored on the script region.
    pub source_maps: bool,
}

/// A soft diagnostic produced when the transform had to recover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserDiagnostic {
    pub message: String,
    pub span: Span,
    pub code: &'static str,
}

/// The normalized result of transforming one component document.
#[derive(Debug)]
pub struct TransformOutput {
    /// The generated script text handed to the engine.
    pub text: String,
    pub source_map: Option<RawSourceMap>,
    /// Lines prepended after the map was built. Mappers subtract this
    /// count before consulting the map.
    pub prepended_lines: u32,
    /// Where the script region's content begins within `text`, when the
    /// transform carried a script region over contiguously. Falls back to
    /// the module script when no instance script exists.
    pub script_offset: Option<ByteOffset>,
    pub exports: ExportedNames,
    pub parser_diagnostic: Option<ParserDiagnostic>,
}

/// Transforms a component document into a purely-script view.
///
/// The generated text keeps script and module-script content verbatim,
/// drops their container tags and the style region, strips markup
/// comments, and wraps the remaining markup in a trailing fragment
/// expression. Never fails: on a malformed document the original text is
/// returned untransformed together with a soft diagnostic.
pub fn transform(document: &Document, options: &TransformOptions) -> TransformOutput {
    let text = document.text();
    let regions = document.regions();

    if let Some(malformed) = regions.iter().find(|region| region.malformed) {
        debug!(path = %document.path(), "transform fell back to original text");
        return fallback(document, malformed);
    }

    let exports = exported_names(text, regions);

    let mut rewriter = Rewriter::new();
    let mut script_offset = None;
    let mut first = true;

    if let Some(module) = &regions.module_script {
        if regions.script.is_none() {
            script_offset = Some(ByteOffset::from(rewriter.len() as u32));
        }
        emit_region_content(&mut rewriter, document, module);
        first = false;
    }

    if let Some(script) = &regions.script {
        if !first {
            rewriter.raw("\n");
        }
        script_offset = Some(ByteOffset::from(rewriter.len() as u32));
        emit_region_content(&mut rewriter, document, script);
        first = false;
    }

    let markup = markup_spans(text, regions);
    if markup
        .iter()
        .any(|span| !span_text(text, *span).trim().is_empty())
    {
        if !first {
            rewriter.raw("\n");
        }
        rewriter.raw(";(<>\n");
        for span in &markup {
            rewriter.verbatim(document.position_at(span.start), span_text(text, *span));
        }
        rewriter.raw("\n</>);");
    }

    let (mut out, source_map) = if options.source_maps {
        let source = options.filename.as_deref().unwrap_or("component");
        let file = options.filename.as_ref().map(|name| format!("{name}.ts"));
        let (out, map) = rewriter.finish(source, file);
        (out, Some(map))
    } else {
        (rewriter.into_text(), None)
    };

    let mut prepended_lines = 0;
    if let Some(directive) = hoisted_directive(regions, text) {
        out = format!("{directive}\n{out}");
        prepended_lines = 1;
        script_offset = script_offset
            .map(|offset| offset + ByteOffset::from(directive.len() as u32 + 1));
    }

    TransformOutput {
        text: out,
        source_map,
        prepended_lines,
        script_offset,
        exports,
        parser_diagnostic: None,
    }
}

fn fallback(document: &Document, malformed: &Region) -> TransformOutput {
    TransformOutput {
        text: document.text().to_string(),
        source_map: None,
        prepended_lines: 0,
        script_offset: None,
        exports: exported_names(document.text(), document.regions()),
        parser_diagnostic: Some(ParserDiagnostic {
            message: "unterminated region tag".to_string(),
            span: malformed.container,
            code: "unterminated-tag",
        }),
    }
}

fn exported_names(text: &str, regions: &Regions) -> ExportedNames {
    regions
        .script_or_module()
        .map(|region| classify_exports(region.content_text(text)))
        .unwrap_or_default()
}

fn emit_region_content(rewriter: &mut Rewriter, document: &Document, region: &Region) {
    let content = region.content_text(document.text());
    rewriter.verbatim(document.position_at(region.content.start), content);
}

/// A `// @ts-check` or `// @ts-nocheck` comment on the first script line,
/// hoisted to the top of the generated text so the engine honors it.
fn hoisted_directive<'a>(regions: &Regions, text: &'a str) -> Option<&'a str> {
    let script = regions.script_or_module()?;
    let content = script.content_text(text);
    let first_line = content.lines().next()?;
    let trimmed = first_line.trim_start();
    (trimmed.starts_with("// @ts-check") || trimmed.starts_with("// @ts-nocheck"))
        .then(|| first_line.trim())
}

fn span_text(text: &str, span: Span) -> &str {
    &text[u32::from(span.start) as usize..u32::from(span.end) as usize]
}

/// The markup left over once script, module-script and style containers
/// and markup comments are removed. The explicit template container is
/// kept; its tags are valid in the generated fragment expression.
fn markup_spans(text: &str, regions: &Regions) -> Vec<Span> {
    let mut excluded: Vec<Span> = [&regions.script, &regions.module_script, &regions.style]
        .into_iter()
        .flatten()
        .map(|region| region.container)
        .collect();
    excluded.sort_by_key(|span| span.start);

    let mut spans = Vec::new();
    let mut cursor = 0u32;
    for container in excluded {
        let start: u32 = container.start.into();
        if start > cursor {
            strip_comments(text, Span::new(cursor, start), &mut spans);
        }
        cursor = container.end.into();
    }
    if (cursor as usize) < text.len() {
        strip_comments(text, Span::new(cursor, text.len() as u32), &mut spans);
    }
    spans
}

fn strip_comments(text: &str, chunk: Span, out: &mut Vec<Span>) {
    let start: usize = u32::from(chunk.start) as usize;
    let end: usize = u32::from(chunk.end) as usize;
    let mut cursor = start;
    while let Some(rel) = text[cursor..end].find("<!--") {
        let comment_start = cursor + rel;
        if comment_start > cursor {
            out.push(Span::new(cursor as u32, comment_start as u32));
        }
        cursor = match text[comment_start + 4..end].find("-->") {
            Some(close) => comment_start + 4 + close + 3,
            None => end,
        };
    }
    if cursor < end {
        out.push(Span::new(cursor as u32, end as u32));
    }
}
