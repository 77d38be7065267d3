use indexmap::IndexSet;

use crate::surface::{Node, Pattern};

/// Visits every node of a function body that can contribute a reference.
///
/// Literals, the property name of a member access, and nested lambdas are not entered:
/// nested lambdas are analyzed only when they are bound at module level themselves.
pub(crate) fn walk_scope<'a, F>(node: &'a Node, visit: &mut F)
where
    F: FnMut(&'a Node),
{
    visit(node);
    match node {
        Node::Ident { .. } | Node::Literal { .. } | Node::Export { .. } | Node::Arrow { .. } => {}
        Node::Program { body, .. } | Node::Block { body, .. } => {
            for stmt in body {
                walk_scope(stmt, visit);
            }
        }
        Node::VarDecl { declarators, .. } => {
            for declarator in declarators {
                if let Some(init) = &declarator.init {
                    walk_scope(init, visit);
                }
            }
        }
        Node::Call { callee, args, .. } | Node::New { callee, args, .. } => {
            walk_scope(callee, visit);
            for arg in args {
                walk_scope(arg, visit);
            }
        }
        Node::Member { object, .. } => walk_scope(object, visit),
        Node::Index { object, index, .. } => {
            walk_scope(object, visit);
            walk_scope(index, visit);
        }
        Node::Unary { operand, .. } => walk_scope(operand, visit),
        Node::Binary { left, right, .. } | Node::Logical { left, right, .. } => {
            walk_scope(left, visit);
            walk_scope(right, visit);
        }
        Node::Conditional {
            test,
            consequent,
            alternate,
            ..
        } => {
            walk_scope(test, visit);
            walk_scope(consequent, visit);
            walk_scope(alternate, visit);
        }
        Node::Array { elements, .. } => {
            for element in elements {
                walk_scope(element, visit);
            }
        }
        Node::Object { properties, .. } => {
            for property in properties {
                walk_scope(&property.value, visit);
            }
        }
        Node::If {
            test,
            consequent,
            alternate,
            ..
        } => {
            walk_scope(test, visit);
            walk_scope(consequent, visit);
            if let Some(alternate) = alternate {
                walk_scope(alternate, visit);
            }
        }
        Node::Return { argument, .. } => {
            if let Some(argument) = argument {
                walk_scope(argument, visit);
            }
        }
    }
}

/// Identifiers referenced anywhere in `body`, in first-occurrence order.
pub(crate) fn collect_references(body: &Node) -> IndexSet<String> {
    let mut out = IndexSet::new();
    walk_scope(body, &mut |node| {
        if let Node::Ident { name, .. } = node {
            out.insert(name.clone());
        }
    });
    out
}

/// Callee names of direct calls `f(x)`; method calls `obj.f(x)` are not direct calls.
pub(crate) fn collect_direct_calls(body: &Node) -> IndexSet<String> {
    let mut out = IndexSet::new();
    walk_scope(body, &mut |node| {
        if let Node::Call { callee, .. } = node {
            if let Node::Ident { name, .. } = callee.as_ref() {
                out.insert(name.clone());
            }
        }
    });
    out
}

/// Parameter names plus the function's own local declarations.
///
/// Locals are collected from the top level of a block body and one level into the
/// branches of an `if` statement. Declarations nested any deeper (a second `if`, an
/// `else if` chain, a bare inner block) are not seen here and therefore surface as free
/// references when they shadow a module binding.
pub(crate) fn collect_bound(params: &[Pattern], body: &Node) -> IndexSet<String> {
    let mut bound = IndexSet::new();
    for param in params {
        let mut binders = Vec::new();
        param.collect_binders(&mut binders);
        bound.extend(binders.into_iter().map(str::to_string));
    }

    let Node::Block { body: stmts, .. } = body else {
        return bound;
    };
    for stmt in stmts {
        match stmt {
            Node::VarDecl { .. } => declare_locals(stmt, &mut bound),
            Node::If {
                consequent,
                alternate,
                ..
            } => {
                collect_branch_locals(consequent, &mut bound);
                if let Some(alternate) = alternate {
                    collect_branch_locals(alternate, &mut bound);
                }
            }
            _ => {}
        }
    }
    bound
}

fn collect_branch_locals(branch: &Node, bound: &mut IndexSet<String>) {
    match branch {
        Node::Block { body, .. } => {
            for stmt in body {
                if let Node::VarDecl { .. } = stmt {
                    declare_locals(stmt, bound);
                }
            }
        }
        Node::VarDecl { .. } => declare_locals(branch, bound),
        _ => {}
    }
}

fn declare_locals(decl: &Node, bound: &mut IndexSet<String>) {
    let Node::VarDecl { declarators, .. } = decl else {
        return;
    };
    for declarator in declarators {
        let mut binders = Vec::new();
        declarator.target.collect_binders(&mut binders);
        bound.extend(binders.into_iter().map(str::to_string));
    }
}
