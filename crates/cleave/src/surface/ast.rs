use serde::{Deserialize, Serialize};

use crate::diagnostics::Span;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpannedName {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Const,
    Let,
    Var,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declarator {
    pub target: Pattern,
    pub init: Option<Node>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSpecifier {
    pub local: SpannedName,
    pub exported: Option<SpannedName>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub key: SpannedName,
    pub value: Node,
    pub shorthand: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Literal {
    Number(String),
    String(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternProperty {
    pub key: SpannedName,
    pub value: Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Pattern {
    Ident {
        span: Span,
        name: String,
    },
    Object {
        span: Span,
        properties: Vec<PatternProperty>,
    },
    Array {
        span: Span,
        elements: Vec<Pattern>,
    },
}

impl Pattern {
    pub fn span(&self) -> &Span {
        match self {
            Pattern::Ident { span, .. }
            | Pattern::Object { span, .. }
            | Pattern::Array { span, .. } => span,
        }
    }

    /// The bound name when the pattern is a plain identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Pattern::Ident { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn collect_binders<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Pattern::Ident { name, .. } => out.push(name),
            Pattern::Object { properties, .. } => {
                for prop in properties {
                    prop.value.collect_binders(out);
                }
            }
            Pattern::Array { elements, .. } => {
                for element in elements {
                    element.collect_binders(out);
                }
            }
        }
    }
}

/// One node of a parsed source program.
///
/// Statements and expressions share the type: a block body is a list of nodes, and any
/// expression may appear there as an expression statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Node {
    Program {
        span: Span,
        body: Vec<Node>,
    },
    VarDecl {
        span: Span,
        decl_kind: DeclKind,
        declarators: Vec<Declarator>,
    },
    Export {
        span: Span,
        specifiers: Vec<ExportSpecifier>,
    },
    Ident {
        span: Span,
        name: String,
    },
    Literal {
        span: Span,
        value: Literal,
    },
    Arrow {
        span: Span,
        is_async: bool,
        params: Vec<Pattern>,
        body: Box<Node>,
    },
    Call {
        span: Span,
        callee: Box<Node>,
        args: Vec<Node>,
    },
    New {
        span: Span,
        callee: Box<Node>,
        args: Vec<Node>,
    },
    Member {
        span: Span,
        object: Box<Node>,
        property: SpannedName,
    },
    Index {
        span: Span,
        object: Box<Node>,
        index: Box<Node>,
    },
    Unary {
        span: Span,
        op: String,
        operand: Box<Node>,
    },
    Binary {
        span: Span,
        op: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    Logical {
        span: Span,
        op: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    Conditional {
        span: Span,
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },
    Array {
        span: Span,
        elements: Vec<Node>,
    },
    Object {
        span: Span,
        properties: Vec<Property>,
    },
    Block {
        span: Span,
        body: Vec<Node>,
    },
    If {
        span: Span,
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Option<Box<Node>>,
    },
    Return {
        span: Span,
        argument: Option<Box<Node>>,
    },
}

impl Node {
    pub fn span(&self) -> &Span {
        match self {
            Node::Program { span, .. }
            | Node::VarDecl { span, .. }
            | Node::Export { span, .. }
            | Node::Ident { span, .. }
            | Node::Literal { span, .. }
            | Node::Arrow { span, .. }
            | Node::Call { span, .. }
            | Node::New { span, .. }
            | Node::Member { span, .. }
            | Node::Index { span, .. }
            | Node::Unary { span, .. }
            | Node::Binary { span, .. }
            | Node::Logical { span, .. }
            | Node::Conditional { span, .. }
            | Node::Array { span, .. }
            | Node::Object { span, .. }
            | Node::Block { span, .. }
            | Node::If { span, .. }
            | Node::Return { span, .. } => span,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Program { .. } => "Program",
            Node::VarDecl { .. } => "VarDecl",
            Node::Export { .. } => "Export",
            Node::Ident { .. } => "Ident",
            Node::Literal { .. } => "Literal",
            Node::Arrow { .. } => "Arrow",
            Node::Call { .. } => "Call",
            Node::New { .. } => "New",
            Node::Member { .. } => "Member",
            Node::Index { .. } => "Index",
            Node::Unary { .. } => "Unary",
            Node::Binary { .. } => "Binary",
            Node::Logical { .. } => "Logical",
            Node::Conditional { .. } => "Conditional",
            Node::Array { .. } => "Array",
            Node::Object { .. } => "Object",
            Node::Block { .. } => "Block",
            Node::If { .. } => "If",
            Node::Return { .. } => "Return",
        }
    }

    pub fn ident_name(&self) -> Option<&str> {
        match self {
            Node::Ident { name, .. } => Some(name),
            _ => None,
        }
    }
}
