//! Syntactic classification of a component's exported symbols.

use std::sync::Arc;

use swc_common::{FileName, SourceMap};
use swc_ecma_ast::{Callee, Decl, Expr, Module, ModuleDecl, ModuleItem, Pat, Stmt, VarDecl};
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};

/// Names exported by a component's script, bucketed by the shape of the
/// declaration's initializer.
///
/// The classification is purely syntactic. A top-level
/// `let x = state(0)` is a state, `let x = prop()` a property and
/// `let x = emitter()` an event emitter, regardless of what those
/// identifiers resolve to. Feature providers query these buckets without
/// re-running the transform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportedNames {
    pub states: Vec<String>,
    pub props: Vec<String>,
    pub emitters: Vec<String>,
}

impl ExportedNames {
    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.props.is_empty() && self.emitters.is_empty()
    }

    pub fn has_state(&self, name: &str) -> bool {
        self.states.iter().any(|n| n == name)
    }

    pub fn has_prop(&self, name: &str) -> bool {
        self.props.iter().any(|n| n == name)
    }

    pub fn has_emitter(&self, name: &str) -> bool {
        self.emitters.iter().any(|n| n == name)
    }
}

/// Classifies the top-level variable declarations of `script`.
///
/// A script that fails to parse yields empty buckets rather than an error.
pub fn classify_exports(script: &str) -> ExportedNames {
    let Some(module) = parse_module(script) else {
        return ExportedNames::default();
    };

    let mut names = ExportedNames::default();
    for item in module.body {
        match item {
            ModuleItem::Stmt(Stmt::Decl(Decl::Var(var_decl))) => {
                classify_var_decl(&var_decl, &mut names);
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export_decl)) => {
                if let Decl::Var(var_decl) = &export_decl.decl {
                    classify_var_decl(var_decl, &mut names);
                }
            }
            _ => {}
        }
    }
    names
}

fn classify_var_decl(var_decl: &VarDecl, names: &mut ExportedNames) {
    if var_decl.declare {
        return;
    }
    for declarator in &var_decl.decls {
        let Pat::Ident(ident) = &declarator.name else {
            continue;
        };
        let Some(init) = &declarator.init else {
            continue;
        };
        let Some(callee) = call_target(init) else {
            continue;
        };
        let name = ident.id.sym.to_string();
        match callee {
            "state" => names.states.push(name),
            "prop" => names.props.push(name),
            "emitter" => names.emitters.push(name),
            _ => {}
        }
    }
}

/// The identifier a direct call expression invokes, if the initializer is
/// one.
fn call_target(expr: &Expr) -> Option<&str> {
    let Expr::Call(call) = expr else {
        return None;
    };
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    match callee.as_ref() {
        Expr::Ident(ident) => Some(ident.sym.as_ref()),
        _ => None,
    }
}

fn parse_module(script: &str) -> Option<Module> {
    let cm: Arc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        FileName::Custom("component-script".into()).into(),
        script.to_string(),
    );
    let syntax = Syntax::Typescript(TsSyntax {
        tsx: false,
        ..Default::default()
    });
    let mut parser = Parser::new(syntax, StringInput::from(&*fm), None);
    parser.parse_module().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classifies_by_initializer_shape() {
        let names = classify_exports(
            "let count = state(0);\n\
             export let label = prop('hi');\n\
             const changed = emitter();\n\
             let plain = 1;\n",
        );
        assert_eq!(names.states, vec!["count"]);
        assert_eq!(names.props, vec!["label"]);
        assert_eq!(names.emitters, vec!["changed"]);
        assert!(names.has_prop("label"));
        assert!(!names.has_prop("count"));
    }

    #[test]
    fn method_calls_and_destructuring_are_ignored() {
        let names = classify_exports(
            "let a = runtime.state(0);\nlet { b } = state(0);\n",
        );
        assert!(names.is_empty());
    }

    #[test]
    fn unparsable_script_yields_empty_buckets() {
        let names = classify_exports("let = = broken((");
        assert!(names.is_empty());
    }

    #[test]
    fn declare_statements_are_skipped() {
        let names = classify_exports("declare const x: number;\nexport declare let y = state(0);\n");
        assert!(names.is_empty());
    }
}
