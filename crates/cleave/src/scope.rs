//! Module-level scope analysis.
//!
//! Classifies every top-level binding as plain value, function, or mutable-state
//! container, then records for each top-level function which module bindings it
//! references (`free_vars`), which module functions it calls directly
//! (`called_functions`), and which mutable containers it captures.

mod free_vars;

use std::collections::HashMap;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::surface::{Node, Pattern};
use crate::syntax;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVar {
    pub name: String,
    pub is_mutable_state: bool,
    pub is_function: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureInfo {
    pub name: String,
    pub free_vars: IndexSet<String>,
    pub called_functions: IndexSet<String>,
    pub captures_mutable: IndexSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub closures: Vec<ClosureInfo>,
    pub module_vars: Vec<ModuleVar>,
    pub exports: Vec<String>,
}

impl AnalysisResult {
    pub fn closure(&self, name: &str) -> Option<&ClosureInfo> {
        self.closures.iter().find(|closure| closure.name == name)
    }

    pub fn module_var(&self, name: &str) -> Option<&ModuleVar> {
        self.module_vars.iter().find(|var| var.name == name)
    }

    pub fn is_exported(&self, name: &str) -> bool {
        self.exports.iter().any(|export| export == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("expected a program node at the root, found {found}")]
    ExpectedProgramNode { found: &'static str },
}

/// Runs the three declaration passes over a program root.
pub fn analyze(root: &Node) -> Result<AnalysisResult, AnalysisError> {
    let Node::Program { body, .. } = root else {
        return Err(AnalysisError::ExpectedProgramNode {
            found: root.kind_name(),
        });
    };

    let module_vars = collect_module_vars(body);
    let scope = ModuleScope::new(&module_vars);
    let closures = collect_closures(body, &scope);
    let exports = collect_exports(body);

    log::debug!(
        "scope analysis: {} module bindings, {} closures, {} exports",
        module_vars.len(),
        closures.len(),
        exports.len()
    );

    Ok(AnalysisResult {
        closures,
        module_vars,
        exports,
    })
}

struct ModuleScope<'a> {
    vars: HashMap<&'a str, &'a ModuleVar>,
}

impl<'a> ModuleScope<'a> {
    fn new(module_vars: &'a [ModuleVar]) -> Self {
        Self {
            vars: module_vars
                .iter()
                .map(|var| (var.name.as_str(), var))
                .collect(),
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    fn is_function(&self, name: &str) -> bool {
        self.vars.get(name).is_some_and(|var| var.is_function)
    }

    fn is_mutable_state(&self, name: &str) -> bool {
        self.vars.get(name).is_some_and(|var| var.is_mutable_state)
    }
}

/// The binding name and initializer of a declaration with exactly one identifier target.
///
/// Destructuring targets and multi-declarator statements yield `None`.
fn single_binding(stmt: &Node) -> Option<(&str, Option<&Node>)> {
    let Node::VarDecl { declarators, .. } = stmt else {
        return None;
    };
    let [declarator] = declarators.as_slice() else {
        log::debug!(
            "skipping declaration with {} declarators at {}:{}",
            declarators.len(),
            stmt.span().start.line,
            stmt.span().start.column
        );
        return None;
    };
    let Some(name) = declarator.target.as_ident() else {
        log::debug!(
            "skipping destructuring declaration at {}:{}",
            stmt.span().start.line,
            stmt.span().start.column
        );
        return None;
    };
    Some((name, declarator.init.as_ref()))
}

fn is_container_construction(init: &Node) -> bool {
    match init {
        Node::New { callee, .. } => callee
            .ident_name()
            .is_some_and(syntax::is_container_constructor),
        _ => false,
    }
}

fn collect_module_vars(body: &[Node]) -> Vec<ModuleVar> {
    let mut seen = IndexSet::new();
    let mut vars = Vec::new();
    for stmt in body {
        let Some((name, init)) = single_binding(stmt) else {
            continue;
        };
        if !seen.insert(name.to_string()) {
            log::warn!("duplicate module binding `{name}`; keeping the first declaration");
            continue;
        }
        let is_mutable_state = init.is_some_and(is_container_construction);
        let is_function = matches!(init, Some(Node::Arrow { .. }));
        vars.push(ModuleVar {
            name: name.to_string(),
            is_mutable_state,
            is_function,
        });
    }
    vars
}

fn collect_closures(body: &[Node], scope: &ModuleScope<'_>) -> Vec<ClosureInfo> {
    let mut seen = IndexSet::new();
    let mut closures = Vec::new();
    for stmt in body {
        let Some((name, Some(Node::Arrow { params, body, .. }))) = single_binding(stmt) else {
            continue;
        };
        if !seen.insert(name.to_string()) {
            continue;
        }
        let closure = analyze_closure(name, params, body, scope);
        log::trace!(
            "closure `{}`: free {:?}, calls {:?}, captures {:?}",
            closure.name,
            closure.free_vars,
            closure.called_functions,
            closure.captures_mutable
        );
        closures.push(closure);
    }
    closures
}

fn analyze_closure(
    name: &str,
    params: &[Pattern],
    body: &Node,
    scope: &ModuleScope<'_>,
) -> ClosureInfo {
    let bound = free_vars::collect_bound(params, body);

    let free_vars: IndexSet<String> = free_vars::collect_references(body)
        .into_iter()
        .filter(|name| !bound.contains(name) && scope.contains(name))
        .collect();

    let called_functions: IndexSet<String> = free_vars::collect_direct_calls(body)
        .into_iter()
        .filter(|name| !bound.contains(name) && scope.is_function(name))
        .collect();

    let captures_mutable: IndexSet<String> = free_vars
        .iter()
        .filter(|name| scope.is_mutable_state(name))
        .cloned()
        .collect();

    ClosureInfo {
        name: name.to_string(),
        free_vars,
        called_functions,
        captures_mutable,
    }
}

fn collect_exports(body: &[Node]) -> Vec<String> {
    let mut exports = IndexSet::new();
    for stmt in body {
        if let Node::Export { specifiers, .. } = stmt {
            for specifier in specifiers {
                exports.insert(specifier.local.name.clone());
            }
        }
    }
    exports.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::surface::parse_program;

    fn analyze_src(src: &str) -> AnalysisResult {
        let (program, diags) = parse_program(Path::new("test.js"), src);
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        analyze(&program).expect("analysis")
    }

    fn names(set: &IndexSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn classifies_module_bindings() {
        let result = analyze_src(
            r#"
const store = new Map();
const seen = new Set();
const list = new Array();
const client = new Client();
const limit = 10;
const get = (k) => store.get(k);
let pending;
"#,
        );
        let summary: Vec<(&str, bool, bool)> = result
            .module_vars
            .iter()
            .map(|v| (v.name.as_str(), v.is_mutable_state, v.is_function))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("store", true, false),
                ("seen", true, false),
                ("list", true, false),
                ("client", false, false),
                ("limit", false, false),
                ("get", false, true),
                ("pending", false, false),
            ]
        );
    }

    #[test]
    fn free_vars_follow_first_occurrence_and_drop_unresolved() {
        let result = analyze_src(
            r#"
const store = new Map();
const limit = 10;
const f = (k) => console.log(limit, store.get(k), limit, missing);
"#,
        );
        let f = result.closure("f").expect("closure f");
        assert_eq!(names(&f.free_vars), vec!["limit", "store"]);
        assert_eq!(names(&f.captures_mutable), vec!["store"]);
        assert!(f.called_functions.is_empty());
    }

    #[test]
    fn member_property_names_are_not_references() {
        let result = analyze_src(
            r#"
const get = 1;
const store = new Map();
const f = (k) => store.get(k);
"#,
        );
        let f = result.closure("f").expect("closure f");
        assert_eq!(names(&f.free_vars), vec!["store"]);
    }

    #[test]
    fn computed_index_is_a_reference() {
        let result = analyze_src(
            r#"
const key = "a";
const table = new Map();
const f = (obj) => obj[key];
"#,
        );
        assert_eq!(names(&result.closure("f").unwrap().free_vars), vec!["key"]);
    }

    #[test]
    fn params_and_locals_shadow_module_bindings() {
        let result = analyze_src(
            r#"
const store = new Map();
const cache = new Map();
const f = (store) => {
  const cache = store.get(1);
  if (cache) { const hit = cache; return hit; } else { let miss = 0; return miss; }
};
const hit = 1;
const miss = 2;
"#,
        );
        let f = result.closure("f").expect("closure f");
        assert!(f.free_vars.is_empty(), "got {:?}", f.free_vars);
        assert!(f.captures_mutable.is_empty());
    }

    #[test]
    fn deeper_nested_locals_surface_as_free_vars() {
        let result = analyze_src(
            r#"
const x = new Map();
const f = (k) => {
  if (k) {
    if (k > 1) { const x = 2; return x; }
  }
  return 0;
};
"#,
        );
        let f = result.closure("f").expect("closure f");
        assert_eq!(names(&f.free_vars), vec!["x"]);
        assert_eq!(names(&f.captures_mutable), vec!["x"]);
    }

    #[test]
    fn nested_lambdas_are_opaque() {
        let result = analyze_src(
            r#"
const store = new Map();
const helper = (k) => k;
const f = (k) => [k].map((v) => helper(store.get(v)));
"#,
        );
        let f = result.closure("f").expect("closure f");
        assert!(f.free_vars.is_empty(), "got {:?}", f.free_vars);
        assert!(f.called_functions.is_empty());
    }

    #[test]
    fn called_functions_only_count_direct_calls_to_module_functions() {
        let result = analyze_src(
            r#"
const store = new Map();
const limit = 3;
const get = (k) => store.get(k);
const put = (k, v) => store.set(k, v);
const f = (k, cb) => {
  put(k, get(k));
  cb(k);
  store.get(k);
  limit(k);
  return get(k);
};
"#,
        );
        let f = result.closure("f").expect("closure f");
        assert_eq!(names(&f.called_functions), vec!["put", "get"]);
        assert_eq!(names(&f.free_vars), vec!["put", "get", "store", "limit"]);
    }

    #[test]
    fn shadowed_function_is_not_a_call() {
        let result = analyze_src(
            r#"
const get = (k) => k;
const f = (get) => get(1);
"#,
        );
        let f = result.closure("f").expect("closure f");
        assert!(f.called_functions.is_empty());
        assert!(f.free_vars.is_empty());
    }

    #[test]
    fn destructuring_and_multi_declarators_are_skipped() {
        let result = analyze_src(
            r#"
const { a, b } = source;
const x = 1, g = (k) => k;
const f = (k) => a + x;
"#,
        );
        let names: Vec<&str> = result.module_vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["f"]);
        assert!(result.closure("g").is_none());
        assert!(result.closure("f").unwrap().free_vars.is_empty());
    }

    #[test]
    fn exports_are_collected_in_order_without_duplicates() {
        let result = analyze_src(
            r#"
const f = (k) => k;
export const g = (k) => f(k);
export { f, g as renamed };
"#,
        );
        assert_eq!(result.exports, vec!["g".to_string(), "f".to_string()]);
        assert!(result.is_exported("f"));
        assert!(!result.is_exported("renamed"));
    }

    #[test]
    fn non_program_root_is_rejected() {
        let node = Node::Ident {
            span: crate::diagnostics::Span::point(1, 1),
            name: "x".to_string(),
        };
        assert_eq!(
            analyze(&node),
            Err(AnalysisError::ExpectedProgramNode { found: "Ident" })
        );
    }
}
