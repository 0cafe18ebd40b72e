//! Project configuration loading and file enumeration.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use sfc_virtual::{ScriptKind, COMPONENT_EXTENSION};
use tracing::warn;
use walkdir::WalkDir;

use crate::error::ProjectError;

/// Directories never worth scanning, whatever the configuration says.
const DEFAULT_EXCLUDED_DIRS: [&str; 5] = ["node_modules", "dist", "build", "target", ".git"];

/// Engine options forwarded from the configuration file. Purely a
/// passthrough subset; the engine interprets them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerOptions {
    pub strict: bool,
    pub target: Option<String>,
    pub module: Option<String>,
}

/// The JSONC project configuration (`include`/`exclude` globs plus
/// compiler options).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub compiler_options: CompilerOptions,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*".to_string()],
            exclude: Vec::new(),
            compiler_options: CompilerOptions::default(),
        }
    }
}

impl ProjectConfig {
    /// Parses configuration text, tolerating `//` and `/* */` comments.
    pub fn parse(path: &Utf8Path, text: &str) -> Result<Self, ProjectError> {
        let cleaned = remove_json_comments(text);
        serde_json::from_str(&cleaned).map_err(|source| ProjectError::Config {
            path: path.to_owned(),
            source,
        })
    }

    /// Loads configuration from disk.
    pub fn load(path: &Utf8Path) -> Result<Self, ProjectError> {
        let text = fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(path, &text)
    }

    /// Enumerates the script and component files under `root` matched by
    /// the include globs and not excluded.
    pub fn enumerate_files(&self, root: &Utf8Path) -> Vec<Utf8PathBuf> {
        let include = match build_glob_set(&self.include) {
            Some(set) => set,
            None => return Vec::new(),
        };
        let exclude = build_glob_set(&self.exclude);

        let mut files = Vec::new();
        let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !(entry.file_type().is_dir() && DEFAULT_EXCLUDED_DIRS.contains(&name.as_ref()))
        });

        for entry in walker.flatten() {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(path) = Utf8PathBuf::from_path_buf(entry.into_path()) else {
                continue;
            };
            if !is_project_file(&path) {
                continue;
            }
            let relative = path.strip_prefix(root).unwrap_or(&path);
            if !include.is_match(relative) {
                continue;
            }
            if exclude
                .as_ref()
                .map(|set| set.is_match(relative))
                .unwrap_or(false)
            {
                continue;
            }
            files.push(path);
        }
        files.sort();
        files
    }
}

/// Whether a path is one the project layer cares about at all.
pub fn is_project_file(path: &Utf8Path) -> bool {
    ScriptKind::from_extension(path).is_script()
        || path.extension() == Some(COMPONENT_EXTENSION)
}

fn build_glob_set(patterns: &[String]) -> Option<GlobSet> {
    if patterns.is_empty() {
        return None;
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(error) => {
                warn!(pattern, %error, "skipping invalid glob");
            }
        }
    }
    builder.build().ok()
}

/// Removes single-line and multi-line comments from JSON, leaving string
/// contents alone.
fn remove_json_comments(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if c == '"' {
                in_string = false;
            } else if c == '\\' {
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            }
        } else if c == '"' {
            result.push(c);
            in_string = true;
        } else if c == '/' {
            match chars.peek() {
                Some('/') => {
                    chars.next();
                    while let Some(&next) = chars.peek() {
                        if next == '\n' {
                            break;
                        }
                        chars.next();
                    }
                }
                Some('*') => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == '*' && chars.peek() == Some(&'/') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => result.push(c),
            }
        } else {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_jsonc_with_comments() {
        let text = r#"{
            // project files
            "include": ["src/**/*"],
            "exclude": ["src/gen/**"], /* generated */
            "compilerOptions": { "strict": true }
        }"#;
        let config = ProjectConfig::parse("/app/project.json".into(), text).unwrap();
        assert_eq!(config.include, vec!["src/**/*"]);
        assert_eq!(config.exclude, vec!["src/gen/**"]);
        assert!(config.compiler_options.strict);
    }

    #[test]
    fn comment_markers_inside_strings_survive() {
        let text = r#"{ "include": ["a//b/*"] }"#;
        let config = ProjectConfig::parse("/p.json".into(), text).unwrap();
        assert_eq!(config.include, vec!["a//b/*"]);
    }

    #[test]
    fn invalid_config_is_an_error() {
        assert!(ProjectConfig::parse("/p.json".into(), "{ include: oops").is_err());
    }

    #[test]
    fn project_file_filter() {
        assert!(is_project_file("/a/b.ts".into()));
        assert!(is_project_file("/a/b.sfc".into()));
        assert!(!is_project_file("/a/b.css".into()));
    }
}
