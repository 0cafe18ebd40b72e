//! The raw, serializable form of a version-3 source map.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A standard version-3 source map as produced by the transform adapter.
///
/// Only the fields this subsystem consumes are modeled; `mappings` carries
/// the base64-VLQ segment string defined by the source-map spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSourceMap {
    /// Always 3.
    pub version: u32,
    /// The generated file name, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Original source paths. This subsystem always emits exactly one.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Original source contents, parallel to `sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    /// Symbol names referenced by segments. Unused by this subsystem.
    #[serde(default)]
    pub names: Vec<String>,
    /// Base64-VLQ encoded mapping segments.
    pub mappings: String,
}

impl RawSourceMap {
    /// Creates an empty map for the given source/generated file pair.
    pub fn new(source: impl Into<String>, file: Option<String>) -> Self {
        Self {
            version: 3,
            file,
            sources: vec![source.into()],
            sources_content: None,
            names: Vec::new(),
            mappings: String::new(),
        }
    }
}

/// Failures while decoding a raw source map.
#[derive(Debug, Clone, Error)]
pub enum SourceMapError {
    /// The `version` field was not 3.
    #[error("unsupported source map version: {0}")]
    UnsupportedVersion(u32),

    /// A segment could not be VLQ-decoded.
    #[error("malformed mappings at generated line {line}")]
    MalformedSegment {
        /// The 0-indexed generated line of the bad segment.
        line: u32,
    },

    /// A segment referenced a source index that does not exist.
    #[error("segment references source index {index} out of {available}")]
    SourceIndexOutOfRange {
        /// The referenced index.
        index: i64,
        /// Number of sources the map declares.
        available: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let map = RawSourceMap {
            sources_content: Some(vec![Some("let x = 1;".to_string())]),
            ..RawSourceMap::new("widget.sfc", Some("widget.sfc.ts".to_string()))
        };
        let json = serde_json::to_string(&map).unwrap();
        assert!(json.contains("\"sourcesContent\""));
        assert!(json.contains("\"version\":3"));

        let back: RawSourceMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn tolerates_missing_optional_fields() {
        let map: RawSourceMap =
            serde_json::from_str(r#"{"version":3,"mappings":"AAAA"}"#).unwrap();
        assert!(map.sources.is_empty());
        assert!(map.file.is_none());
    }
}
