//! Module-level validation run between parsing and analysis.

use std::collections::HashMap;
use std::path::Path;

use crate::diagnostics::{Diagnostic, FileDiagnostic, Span};
use crate::surface::{Node, Pattern};
use crate::syntax;

pub fn check_program(path: &Path, program: &Node) -> Vec<FileDiagnostic> {
    let Node::Program { body, .. } = program else {
        return Vec::new();
    };
    let path = path.display().to_string();
    let mut diagnostics = Vec::new();

    let mut declared: HashMap<&str, &Span> = HashMap::new();
    for stmt in body {
        let Node::VarDecl { declarators, .. } = stmt else {
            continue;
        };
        for declarator in declarators {
            let mut binders = Vec::new();
            binders_with_spans(&declarator.target, &mut binders);
            for (name, span) in binders {
                if let Some(first) = declared.get(name) {
                    diagnostics.push(
                        Diagnostic::error(
                            "E3001",
                            format!("`{name}` is declared more than once at module level"),
                            span.clone(),
                        )
                        .with_label("first declared here", (*first).clone()),
                    );
                } else {
                    declared.insert(name, span);
                }
            }

            if declarator.target.as_ident().is_none() {
                if let Some(ctor) = declarator.init.as_ref().and_then(container_constructor) {
                    diagnostics.push(unbound_container(ctor, declarator.target.span()));
                }
            }
        }
    }

    for stmt in body {
        match stmt {
            Node::Export { specifiers, .. } => {
                for specifier in specifiers {
                    if !declared.contains_key(specifier.local.name.as_str()) {
                        diagnostics.push(Diagnostic::error(
                            "E3002",
                            format!(
                                "cannot export `{}`: no module-level binding with that name",
                                specifier.local.name
                            ),
                            specifier.local.span.clone(),
                        ));
                    }
                }
            }
            Node::VarDecl { .. } => {}
            expr => {
                if let Some(ctor) = container_constructor(expr) {
                    diagnostics.push(unbound_container(ctor, expr.span()));
                }
            }
        }
    }

    log::debug!("check: {} diagnostics", diagnostics.len());
    diagnostics
        .into_iter()
        .map(|diagnostic| FileDiagnostic {
            path: path.clone(),
            diagnostic,
        })
        .collect()
}

fn binders_with_spans<'a>(pattern: &'a Pattern, out: &mut Vec<(&'a str, &'a Span)>) {
    match pattern {
        Pattern::Ident { name, span } => out.push((name, span)),
        Pattern::Object { properties, .. } => {
            for prop in properties {
                binders_with_spans(&prop.value, out);
            }
        }
        Pattern::Array { elements, .. } => {
            for element in elements {
                binders_with_spans(element, out);
            }
        }
    }
}

fn container_constructor(node: &Node) -> Option<&str> {
    let Node::New { callee, .. } = node else {
        return None;
    };
    callee
        .ident_name()
        .filter(|name| syntax::is_container_constructor(name))
}

fn unbound_container(ctor: &str, span: &Span) -> Diagnostic {
    Diagnostic::warning(
        "E3003",
        format!("`new {ctor}()` is not bound to a single name and cannot be shared as state"),
        span.clone(),
    )
}
