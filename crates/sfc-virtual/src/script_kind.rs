use camino::Utf8Path;

/// The script dialect the engine should assume for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    Js,
    Jsx,
    Ts,
    Tsx,
    /// Anything the engine cannot parse as a script.
    External,
}

impl ScriptKind {
    /// The kind implied by a real file's extension.
    pub fn from_extension(path: &Utf8Path) -> Self {
        match path.extension() {
            Some("js" | "mjs" | "cjs") => ScriptKind::Js,
            Some("jsx") => ScriptKind::Jsx,
            Some("ts" | "mts" | "cts") => ScriptKind::Ts,
            Some("tsx") => ScriptKind::Tsx,
            _ => ScriptKind::External,
        }
    }

    /// The kind a component's generated view takes, from the script
    /// region's language tag.
    pub fn from_component_lang(lang: &str) -> Self {
        match lang {
            "ts" | "tsx" | "typescript" => ScriptKind::Tsx,
            _ => ScriptKind::Jsx,
        }
    }

    /// The file extension the engine associates with this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            ScriptKind::Js => "js",
            ScriptKind::Jsx => "jsx",
            ScriptKind::Ts => "ts",
            ScriptKind::Tsx => "tsx",
            ScriptKind::External => "",
        }
    }

    pub fn is_script(&self) -> bool {
        !matches!(self, ScriptKind::External)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_mapping() {
        assert_eq!(ScriptKind::from_extension("a.ts".into()), ScriptKind::Ts);
        assert_eq!(ScriptKind::from_extension("a.mjs".into()), ScriptKind::Js);
        assert_eq!(ScriptKind::from_extension("a.tsx".into()), ScriptKind::Tsx);
        assert_eq!(
            ScriptKind::from_extension("a.sfc".into()),
            ScriptKind::External
        );
    }

    #[test]
    fn component_lang_mapping() {
        assert_eq!(ScriptKind::from_component_lang("ts"), ScriptKind::Tsx);
        assert_eq!(ScriptKind::from_component_lang("js"), ScriptKind::Jsx);
        assert_eq!(ScriptKind::from_component_lang("coffee"), ScriptKind::Jsx);
    }
}
