//! Engine-facing snapshots.
//!
//! A snapshot is the immutable association between a path, a version and
//! generated text that the engine's versioning protocol keys on: two
//! calls with the same path and version must see identical content.
//! Edits never mutate a snapshot; they produce a successor instance.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use camino::{Utf8Path, Utf8PathBuf};
use sfc_document::{Document, Regions, TextEdit};
use sfc_mapping::{
    floor_char_boundary, ByteOffset, ConsumerMapper, FragmentOffsetMapper, IdentityMapper,
    LineCol, LineIndex, PositionMapper, RawSourceMap, SourceMapConsumer,
};
use sfc_transform::{transform, ExportedNames, ParserDiagnostic, TransformOptions};
use tracing::warn;

use crate::fragment::Fragment;
use crate::paths::is_component_path;
use crate::script_kind::ScriptKind;

/// Version assigned to snapshots loaded from disk rather than from an
/// open document.
pub const INITIAL_VERSION: u64 = 0;

/// Options applied when a snapshot is built from a document.
#[derive(Debug, Clone)]
pub struct SnapshotOptions {
    /// Whether the transform should emit a source map. Without one the
    /// fragment falls back to offset-based mapping.
    pub source_maps: bool,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self { source_maps: true }
    }
}

/// An immutable, versioned, engine-facing view of one file.
#[derive(Debug)]
pub enum Snapshot {
    /// A component document transformed into a script view.
    Component(ComponentSnapshot),
    /// A plain script file passed through unchanged.
    Script(ScriptSnapshot),
}

impl Snapshot {
    /// Builds a transformed snapshot from an open component document.
    pub fn from_document(document: &Document, options: &SnapshotOptions) -> Self {
        Snapshot::Component(ComponentSnapshot::new(document, options))
    }

    /// Builds a snapshot for a path not currently open, reading its text
    /// through `loader`. Disk-loaded snapshots start at
    /// [`INITIAL_VERSION`].
    pub fn from_path(
        path: &Utf8Path,
        loader: impl FnOnce(&Utf8Path) -> io::Result<String>,
        options: &SnapshotOptions,
    ) -> io::Result<Self> {
        let text = loader(path)?;
        if is_component_path(path) {
            let document = Document::new(path, text, INITIAL_VERSION);
            Ok(Snapshot::from_document(&document, options))
        } else {
            Ok(Snapshot::Script(ScriptSnapshot::new(
                path,
                text,
                INITIAL_VERSION,
            )))
        }
    }

    pub fn path(&self) -> &Utf8Path {
        match self {
            Snapshot::Component(snapshot) => &snapshot.path,
            Snapshot::Script(snapshot) => &snapshot.path,
        }
    }

    pub fn version(&self) -> u64 {
        match self {
            Snapshot::Component(snapshot) => snapshot.version,
            Snapshot::Script(snapshot) => snapshot.version,
        }
    }

    pub fn script_kind(&self) -> ScriptKind {
        match self {
            Snapshot::Component(snapshot) => snapshot.script_kind,
            Snapshot::Script(snapshot) => snapshot.script_kind,
        }
    }

    /// The full engine-visible text.
    pub fn full_text(&self) -> &str {
        match self {
            Snapshot::Component(snapshot) => &snapshot.generated,
            Snapshot::Script(snapshot) => &snapshot.text,
        }
    }

    pub fn len(&self) -> usize {
        self.full_text().len()
    }

    pub fn is_empty(&self) -> bool {
        self.full_text().is_empty()
    }

    /// A clamped slice of the engine-visible text. Offsets inside a
    /// multibyte character round down to its start.
    pub fn text(&self, start: ByteOffset, end: ByteOffset) -> &str {
        let full = self.full_text();
        let start = floor_char_boundary(full, u32::from(start) as usize);
        let end = floor_char_boundary(full, (u32::from(end) as usize).max(start));
        &full[start..end]
    }

    pub fn position_at(&self, offset: ByteOffset) -> LineCol {
        self.index().position_at(offset)
    }

    pub fn offset_at(&self, pos: LineCol) -> ByteOffset {
        self.index().offset_at(pos)
    }

    /// Exported-symbol metadata, available without re-running the
    /// transform. Empty for passthrough snapshots.
    pub fn exports(&self) -> Option<&ExportedNames> {
        match self {
            Snapshot::Component(snapshot) => Some(&snapshot.exports),
            Snapshot::Script(_) => None,
        }
    }

    pub fn parser_diagnostic(&self) -> Option<&ParserDiagnostic> {
        match self {
            Snapshot::Component(snapshot) => snapshot.parser_diagnostic.as_ref(),
            Snapshot::Script(_) => None,
        }
    }

    pub fn regions(&self) -> Option<&Regions> {
        match self {
            Snapshot::Component(snapshot) => Some(&snapshot.regions),
            Snapshot::Script(_) => None,
        }
    }

    /// The mapping fragment for this snapshot, materialized at most once
    /// and cached. Async because building a consumer-backed fragment
    /// parses a source map.
    pub async fn fragment(&self) -> Arc<Fragment> {
        match self {
            Snapshot::Component(snapshot) => snapshot.fragment(),
            Snapshot::Script(snapshot) => snapshot.fragment(),
        }
    }

    /// Drops the cached fragment, releasing its decoded map tables.
    /// Repeated calls are no-ops; the tables are also released when the
    /// last fragment handle is dropped.
    pub fn destroy_fragment(&self) {
        match self {
            Snapshot::Component(snapshot) => {
                lock(&snapshot.fragment).take();
            }
            Snapshot::Script(snapshot) => {
                lock(&snapshot.fragment).take();
            }
        }
    }

    fn index(&self) -> &Arc<LineIndex> {
        match self {
            Snapshot::Component(snapshot) => &snapshot.generated_index,
            Snapshot::Script(snapshot) => &snapshot.index,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Snapshot of a component document: the generated script view plus
/// everything its fragment needs.
#[derive(Debug)]
pub struct ComponentSnapshot {
    path: Utf8PathBuf,
    version: u64,
    script_kind: ScriptKind,
    generated: String,
    generated_index: Arc<LineIndex>,
    original: String,
    original_index: Arc<LineIndex>,
    regions: Regions,
    raw_map: Option<RawSourceMap>,
    prepended_lines: u32,
    script_offset: Option<ByteOffset>,
    exports: ExportedNames,
    parser_diagnostic: Option<ParserDiagnostic>,
    fragment: Mutex<Option<Arc<Fragment>>>,
}

impl ComponentSnapshot {
    fn new(document: &Document, options: &SnapshotOptions) -> Self {
        let output = transform(
            document,
            &TransformOptions {
                filename: document.path().file_name().map(str::to_string),
                source_maps: options.source_maps,
            },
        );
        let script_kind = document
            .regions()
            .script_or_module()
            .map(|region| ScriptKind::from_component_lang(&region.lang))
            .unwrap_or(ScriptKind::Tsx);

        ComponentSnapshot {
            path: document.path().to_owned(),
            version: document.version(),
            script_kind,
            generated_index: Arc::new(LineIndex::new(&output.text)),
            generated: output.text,
            original: document.text().to_string(),
            original_index: Arc::clone(document.line_index()),
            regions: document.regions().clone(),
            raw_map: output.source_map,
            prepended_lines: output.prepended_lines,
            script_offset: output.script_offset,
            exports: output.exports,
            parser_diagnostic: output.parser_diagnostic,
            fragment: Mutex::new(None),
        }
    }

    pub fn original_text(&self) -> &str {
        &self.original
    }

    pub fn prepended_lines(&self) -> u32 {
        self.prepended_lines
    }

    fn fragment(&self) -> Arc<Fragment> {
        let mut cache = lock(&self.fragment);
        if let Some(fragment) = cache.as_ref() {
            return Arc::clone(fragment);
        }
        let fragment = Arc::new(self.build_fragment());
        *cache = Some(Arc::clone(&fragment));
        fragment
    }

    fn build_fragment(&self) -> Fragment {
        let mapper = if self.generated == self.original {
            // The transform changed nothing, so there is nothing to shift.
            PositionMapper::Identity(IdentityMapper)
        } else if let Some(raw) = &self.raw_map {
            match SourceMapConsumer::parse(raw) {
                Ok(consumer) => PositionMapper::Consumer(ConsumerMapper::new(
                    consumer,
                    self.prepended_lines,
                )),
                Err(error) => {
                    warn!(path = %self.path, %error, "discarding unreadable source map");
                    self.offset_mapper()
                }
            }
        } else {
            self.offset_mapper()
        };

        let excluded = self
            .regions
            .style
            .iter()
            .map(|region| region.container)
            .collect();
        Fragment::new(
            mapper,
            Arc::clone(&self.original_index),
            Arc::clone(&self.generated_index),
            excluded,
        )
    }

    fn offset_mapper(&self) -> PositionMapper {
        match (self.regions.script_or_module(), self.script_offset) {
            (Some(script), Some(start)) => {
                PositionMapper::FragmentOffset(FragmentOffsetMapper::new(
                    Arc::clone(&self.original_index),
                    Arc::clone(&self.generated_index),
                    script.content,
                    start,
                ))
            }
            _ => PositionMapper::Identity(IdentityMapper),
        }
    }
}

/// Passthrough snapshot of a plain script file. It is its own identity
/// mapper.
#[derive(Debug)]
pub struct ScriptSnapshot {
    path: Utf8PathBuf,
    version: u64,
    script_kind: ScriptKind,
    text: String,
    index: Arc<LineIndex>,
    fragment: Mutex<Option<Arc<Fragment>>>,
}

impl ScriptSnapshot {
    pub fn new(path: impl Into<Utf8PathBuf>, text: impl Into<String>, version: u64) -> Self {
        let path = path.into();
        let text = text.into();
        ScriptSnapshot {
            script_kind: ScriptKind::from_extension(&path),
            index: Arc::new(LineIndex::new(&text)),
            path,
            version,
            text,
            fragment: Mutex::new(None),
        }
    }

    /// Builds the successor snapshot with `edits` applied. Each edit's
    /// range is resolved against the text as the previous edits left it.
    pub fn with_edits(&self, edits: &[TextEdit]) -> ScriptSnapshot {
        let mut text = self.text.clone();
        for edit in edits {
            match edit.range {
                None => text = edit.text.clone(),
                Some((start, end)) => {
                    let index = LineIndex::new(&text);
                    let start = floor_char_boundary(&text, index.offset_at(start).into());
                    let end = floor_char_boundary(
                        &text,
                        usize::from(index.offset_at(end)).max(start),
                    );
                    text.replace_range(start..end, &edit.text);
                }
            }
        }
        ScriptSnapshot::new(self.path.clone(), text, self.version + 1)
    }

    fn fragment(&self) -> Arc<Fragment> {
        let mut cache = lock(&self.fragment);
        if let Some(fragment) = cache.as_ref() {
            return Arc::clone(fragment);
        }
        let fragment = Arc::new(Fragment::new(
            PositionMapper::Identity(IdentityMapper),
            Arc::clone(&self.index),
            Arc::clone(&self.index),
            Vec::new(),
        ));
        *cache = Some(Arc::clone(&fragment));
        fragment
    }
}
