//! Snapshot and fragment behavior across the transform boundary.

use std::sync::Arc;

use camino::Utf8Path;
use pretty_assertions::assert_eq;
use sfc_document::Document;
use sfc_mapping::{ByteOffset, LineCol};
use sfc_virtual::{Snapshot, SnapshotOptions, INITIAL_VERSION};

fn component(text: &str) -> Document {
    Document::new("/app/widget.sfc", text, 1)
}

fn no_maps() -> SnapshotOptions {
    SnapshotOptions { source_maps: false }
}

#[tokio::test]
async fn offset_mapper_shifts_script_positions_by_a_constant() {
    // Script content starts at offset 15 in the original; the generated
    // view starts with that content at offset 0, a shift of -15.
    let text = "<i></i><script>let x = state(1);</script>";
    let document = component(text);
    let snapshot = Snapshot::from_document(&document, &no_maps());
    let fragment = snapshot.fragment().await;

    let x_original = ByteOffset::from(text.find("x =").unwrap() as u32);
    let x_generated = fragment.to_generated_offset(x_original);
    assert_eq!(u32::from(x_generated), u32::from(x_original) - 15);
    assert_eq!(fragment.to_original_offset(x_generated), x_original);
    assert!(fragment.is_in_generated(document.position_at(x_original)));
}

#[tokio::test]
async fn script_only_file_gets_an_identity_fragment() {
    let text = "let x = state(1);\nexport const y = x;\n";
    let document = component(text);
    let snapshot = Snapshot::from_document(&document, &no_maps());

    assert_eq!(snapshot.full_text(), text);

    let fragment = snapshot.fragment().await;
    for offset in [0u32, 4, 17, 20] {
        let offset = ByteOffset::from(offset);
        assert_eq!(fragment.to_generated_offset(offset), offset);
        assert_eq!(fragment.to_original_offset(offset), offset);
    }
}

#[tokio::test]
async fn style_positions_are_never_in_generated() {
    let text = "<script>let a = 1;</script>\n<style>.a { color: red; }</style>\n";
    let document = component(text);
    let snapshot = Snapshot::from_document(&document, &SnapshotOptions::default());
    let fragment = snapshot.fragment().await;

    let in_style = document.position_at(ByteOffset::from(text.find("color").unwrap() as u32));
    assert!(!fragment.is_in_generated(in_style));

    let in_script = document.position_at(ByteOffset::from(text.find("let a").unwrap() as u32));
    assert!(fragment.is_in_generated(in_script));
}

#[tokio::test]
async fn consumer_fragment_round_trips_script_positions() {
    let text = "<div>top</div>\n<script>let count = state(0);</script>\n<p>{count}</p>\n";
    let document = component(text);
    let snapshot = Snapshot::from_document(&document, &SnapshotOptions::default());
    let fragment = snapshot.fragment().await;

    let original = document.position_at(ByteOffset::from(text.find("count").unwrap() as u32));
    let generated = fragment.to_generated(original);
    assert_eq!(fragment.to_original(generated), original);
}

#[tokio::test]
async fn hoisted_directive_offsets_mapping_by_one_line() {
    let text = "<script>// @ts-nocheck\nlet a = state(1);</script>";
    let document = component(text);
    let snapshot = Snapshot::from_document(&document, &SnapshotOptions::default());
    assert!(snapshot.full_text().starts_with("// @ts-nocheck\n"));

    let fragment = snapshot.fragment().await;
    // `let a` sits on original line 1; the prepended directive pushes the
    // generated copy down one line.
    let original = document.position_at(ByteOffset::from(text.find("let a").unwrap() as u32));
    let generated = fragment.to_generated(original);
    assert_eq!(generated.line, original.line + 1);
    assert_eq!(fragment.to_original(generated), original);
}

#[tokio::test]
async fn fragment_is_materialized_once_and_destroy_is_idempotent() {
    let document = component("<script>let a = 1;</script>");
    let snapshot = Snapshot::from_document(&document, &SnapshotOptions::default());

    let first = snapshot.fragment().await;
    let second = snapshot.fragment().await;
    assert!(Arc::ptr_eq(&first, &second));

    snapshot.destroy_fragment();
    snapshot.destroy_fragment();

    let rebuilt = snapshot.fragment().await;
    assert!(!Arc::ptr_eq(&first, &rebuilt));
}

#[tokio::test]
async fn snapshot_carries_document_version_and_kind() {
    let mut document = component("<script lang=\"ts\">let a = 1;</script>");
    let snapshot = Snapshot::from_document(&document, &SnapshotOptions::default());
    assert_eq!(snapshot.version(), 1);
    assert_eq!(snapshot.script_kind(), sfc_virtual::ScriptKind::Tsx);

    document.set_text("<script>let b = 2;</script>");
    let successor = Snapshot::from_document(&document, &SnapshotOptions::default());
    assert_eq!(successor.version(), 2);
}

#[tokio::test]
async fn passthrough_snapshot_is_its_own_identity_mapper() {
    let snapshot = Snapshot::from_path(
        Utf8Path::new("/app/util.ts"),
        |_| Ok("export const n = 1;\n".to_string()),
        &SnapshotOptions::default(),
    )
    .unwrap();

    assert_eq!(snapshot.version(), INITIAL_VERSION);
    assert_eq!(snapshot.script_kind(), sfc_virtual::ScriptKind::Ts);

    let fragment = snapshot.fragment().await;
    let pos = LineCol::new(0, 13);
    assert_eq!(fragment.to_generated(pos), pos);
    assert_eq!(fragment.to_original(pos), pos);
}

#[tokio::test]
async fn exports_are_queryable_without_retransforming() {
    let document = component(
        "<script>let count = state(0);\nexport let label = prop('x');\nconst ping = emitter();</script>",
    );
    let snapshot = Snapshot::from_document(&document, &SnapshotOptions::default());
    let exports = snapshot.exports().unwrap();
    assert!(exports.has_state("count"));
    assert!(exports.has_prop("label"));
    assert!(exports.has_emitter("ping"));
}

#[test]
fn script_edits_build_a_successor_snapshot() {
    use sfc_document::TextEdit;
    use sfc_virtual::ScriptSnapshot;

    let snapshot = ScriptSnapshot::new("/app/util.ts", "let n = 1;\n", 3);
    let successor = snapshot.with_edits(&[TextEdit::range(
        LineCol::new(0, 8),
        LineCol::new(0, 9),
        "42",
    )]);

    let successor = Snapshot::Script(successor);
    assert_eq!(successor.full_text(), "let n = 42;\n");
    assert_eq!(successor.version(), 4);
}

#[test]
fn text_slicing_clamps_out_of_range_requests() {
    let snapshot = Snapshot::from_path(
        Utf8Path::new("/app/util.ts"),
        |_| Ok("abc".to_string()),
        &SnapshotOptions::default(),
    )
    .unwrap();

    assert_eq!(snapshot.text(ByteOffset::from(1u32), ByteOffset::from(3u32)), "bc");
    assert_eq!(snapshot.text(ByteOffset::from(2u32), ByteOffset::from(99u32)), "c");
    assert_eq!(snapshot.text(ByteOffset::from(9u32), ByteOffset::from(1u32)), "");
}

#[test]
fn text_slicing_rounds_down_to_char_boundaries() {
    let snapshot = Snapshot::from_path(
        Utf8Path::new("/app/util.ts"),
        |_| Ok("const s = \"héllo\";".to_string()),
        &SnapshotOptions::default(),
    )
    .unwrap();

    // Offset 13 is the middle byte of 'é'; the slice starts at the
    // character instead of panicking.
    assert_eq!(
        snapshot.text(ByteOffset::from(13u32), ByteOffset::from(15u32)),
        "él"
    );
}
