use std::path::Path;

use crate::diagnostics::{Diagnostic, FileDiagnostic, Span};
use crate::lexer::{lex, Token, TokenKind};
use crate::syntax;

use super::ast::*;

/// Parses a whole source file into a `Program` node.
///
/// A program node is always produced; lexer and parser problems are returned as
/// diagnostics and the offending statements are skipped.
pub fn parse_program(path: &Path, content: &str) -> (Node, Vec<FileDiagnostic>) {
    let (tokens, lex_diags) = lex(content);
    let mut parser = Parser::new(tokens, path);
    let program = parser.parse_program();
    let mut diagnostics: Vec<FileDiagnostic> = lex_diags
        .into_iter()
        .map(|diag| FileDiagnostic {
            path: path.display().to_string(),
            diagnostic: diag,
        })
        .collect();
    diagnostics.append(&mut parser.diagnostics);
    (program, diagnostics)
}

/// Deepest statement, expression or pattern nesting the parser descends into.
const MAX_NESTING: usize = 64;

fn binary_prec(op: &str) -> u8 {
    match op {
        "??" => 1,
        "||" => 2,
        "&&" => 3,
        "==" | "!=" | "===" | "!==" => 4,
        "<" | ">" | "<=" | ">=" => 5,
        "+" | "-" => 6,
        "*" | "/" | "%" => 7,
        _ => 0,
    }
}

fn is_logical_op(op: &str) -> bool {
    matches!(op, "&&" | "||" | "??")
}

fn decode_escape(ch: char) -> Option<char> {
    match ch {
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        '0' => Some('\0'),
        '\\' => Some('\\'),
        '"' => Some('"'),
        '\'' => Some('\''),
        '`' => Some('`'),
        _ => None,
    }
}

fn decode_string_literal(text: &str) -> String {
    let mut chars = text.chars();
    let quote = chars.next();
    let inner: Vec<char> = chars.collect();
    let inner = match (quote, inner.last()) {
        (Some(q), Some(last)) if *last == q => &inner[..inner.len() - 1],
        _ => &inner[..],
    };
    let mut out = String::new();
    let mut i = 0usize;
    while i < inner.len() {
        let ch = inner[i];
        if ch == '\\' && i + 1 < inner.len() {
            let esc = inner[i + 1];
            out.push(decode_escape(esc).unwrap_or(esc));
            i += 2;
            continue;
        }
        out.push(ch);
        i += 1;
    }
    out
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    diagnostics: Vec<FileDiagnostic>,
    path: String,
}

impl Parser {
    fn new(tokens: Vec<Token>, path: &Path) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            diagnostics: Vec::new(),
            path: path.display().to_string(),
        }
    }

    fn parse_program(&mut self) -> Node {
        let start = self.current_span();
        let mut body = Vec::new();
        while !self.is_eof() {
            if self.peek_symbol("}") {
                let span = self.current_span();
                self.error("E2000", "unexpected '}'", span);
                self.pos += 1;
                continue;
            }
            if !self.parse_statement(&mut body) {
                self.recover();
            }
        }
        let end = self.prev_span();
        Node::Program {
            span: start.merge(&end),
            body,
        }
    }

    // ---- statements ----

    /// Parses one statement into `out`. Returns `false` when recovery is needed.
    fn parse_statement(&mut self, out: &mut Vec<Node>) -> bool {
        self.nested(|parser| Some(parser.parse_statement_inner(out)))
            .unwrap_or(false)
    }

    fn parse_statement_inner(&mut self, out: &mut Vec<Node>) -> bool {
        let Some(token) = self.peek() else {
            return false;
        };
        if token.kind == TokenKind::Ident {
            match token.text.as_str() {
                "const" | "let" | "var" => {
                    let Some(decl) = self.parse_var_decl() else {
                        return false;
                    };
                    self.eat_symbol(";");
                    out.push(decl);
                    return true;
                }
                "export" => return self.parse_export(out),
                "if" => {
                    let Some(node) = self.parse_if() else {
                        return false;
                    };
                    out.push(node);
                    return true;
                }
                "return" => {
                    let start = self.bump_span();
                    let argument = if self.is_eof() || self.peek_symbol(";") || self.peek_symbol("}")
                    {
                        None
                    } else {
                        match self.parse_expression() {
                            Some(expr) => Some(Box::new(expr)),
                            None => return false,
                        }
                    };
                    self.eat_symbol(";");
                    out.push(Node::Return {
                        span: start.merge(&self.prev_span()),
                        argument,
                    });
                    return true;
                }
                _ => {}
            }
        }
        if self.peek_symbol("{") {
            let Some(block) = self.parse_block() else {
                return false;
            };
            out.push(block);
            return true;
        }
        if self.eat_symbol(";") {
            return true;
        }
        let Some(expr) = self.parse_expression() else {
            return false;
        };
        self.eat_symbol(";");
        out.push(expr);
        true
    }

    fn parse_single_statement(&mut self) -> Option<Node> {
        let start = self.current_span();
        let mut nodes = Vec::new();
        if !self.parse_statement(&mut nodes) {
            return None;
        }
        if nodes.len() == 1 {
            return nodes.pop();
        }
        Some(Node::Block {
            span: start.merge(&self.prev_span()),
            body: nodes,
        })
    }

    fn parse_block(&mut self) -> Option<Node> {
        let start = self.expect_symbol("{")?;
        let mut body = Vec::new();
        loop {
            if self.is_eof() {
                let span = self.prev_span();
                self.error("E2002", "unexpected end of input, expected '}'", span);
                return None;
            }
            if self.eat_symbol("}") {
                break;
            }
            if !self.parse_statement(&mut body) {
                self.recover();
            }
        }
        Some(Node::Block {
            span: start.merge(&self.prev_span()),
            body,
        })
    }

    fn parse_var_decl(&mut self) -> Option<Node> {
        let keyword = self.bump()?;
        let start = keyword.span.clone();
        let decl_kind = match keyword.text.as_str() {
            "const" => DeclKind::Const,
            "let" => DeclKind::Let,
            _ => DeclKind::Var,
        };
        let mut declarators = Vec::new();
        loop {
            let target = self.parse_pattern()?;
            let init = if self.eat_symbol("=") {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            let span = target.span().merge(&self.prev_span());
            declarators.push(Declarator { target, init, span });
            if !self.eat_symbol(",") {
                break;
            }
        }
        Some(Node::VarDecl {
            span: start.merge(&self.prev_span()),
            decl_kind,
            declarators,
        })
    }

    fn parse_export(&mut self, out: &mut Vec<Node>) -> bool {
        let start = self.bump_span();
        if self.peek_symbol("{") {
            self.pos += 1;
            let mut specifiers = Vec::new();
            while !self.peek_symbol("}") {
                let Some(local) = self.expect_name("exported binding") else {
                    return false;
                };
                let exported = if self.peek_ident("as") {
                    self.pos += 1;
                    match self.expect_name("export alias") {
                        Some(alias) => Some(alias),
                        None => return false,
                    }
                } else {
                    None
                };
                specifiers.push(ExportSpecifier { local, exported });
                if !self.eat_symbol(",") {
                    break;
                }
            }
            if self.expect_symbol("}").is_none() {
                return false;
            }
            self.eat_symbol(";");
            out.push(Node::Export {
                span: start.merge(&self.prev_span()),
                specifiers,
            });
            return true;
        }

        if self.peek_ident("const") || self.peek_ident("let") || self.peek_ident("var") {
            let Some(decl) = self.parse_var_decl() else {
                return false;
            };
            self.eat_symbol(";");
            let mut specifiers = Vec::new();
            if let Node::VarDecl { declarators, .. } = &decl {
                for declarator in declarators {
                    let mut binders = Vec::new();
                    declarator.target.collect_binders(&mut binders);
                    for name in binders {
                        specifiers.push(ExportSpecifier {
                            local: SpannedName {
                                name: name.to_string(),
                                span: declarator.target.span().clone(),
                            },
                            exported: None,
                        });
                    }
                }
            }
            let span = start.merge(&self.prev_span());
            out.push(decl);
            out.push(Node::Export { span, specifiers });
            return true;
        }

        let span = self.current_span();
        self.error(
            "E2005",
            "unsupported export form; use `export { ... }` or `export const`",
            span,
        );
        false
    }

    fn parse_if(&mut self) -> Option<Node> {
        let start = self.bump_span();
        self.expect_symbol("(")?;
        let test = self.parse_expression()?;
        self.expect_symbol(")")?;
        let consequent = self.parse_single_statement()?;
        let alternate = if self.peek_ident("else") {
            self.pos += 1;
            Some(Box::new(self.parse_single_statement()?))
        } else {
            None
        };
        Some(Node::If {
            span: start.merge(&self.prev_span()),
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate,
        })
    }

    // ---- patterns ----

    fn parse_pattern(&mut self) -> Option<Pattern> {
        if self.peek_symbol("{") {
            let start = self.bump_span();
            let mut properties = Vec::new();
            while !self.peek_symbol("}") {
                let key = self.expect_name("property name")?;
                let value = if self.eat_symbol(":") {
                    self.nested(Self::parse_pattern)?
                } else {
                    Pattern::Ident {
                        span: key.span.clone(),
                        name: key.name.clone(),
                    }
                };
                properties.push(PatternProperty { key, value });
                if !self.eat_symbol(",") {
                    break;
                }
            }
            self.expect_symbol("}")?;
            return Some(Pattern::Object {
                span: start.merge(&self.prev_span()),
                properties,
            });
        }
        if self.peek_symbol("[") {
            let start = self.bump_span();
            let mut elements = Vec::new();
            while !self.peek_symbol("]") {
                elements.push(self.nested(Self::parse_pattern)?);
                if !self.eat_symbol(",") {
                    break;
                }
            }
            self.expect_symbol("]")?;
            return Some(Pattern::Array {
                span: start.merge(&self.prev_span()),
                elements,
            });
        }
        let name = self.expect_binding_name()?;
        Some(Pattern::Ident {
            span: name.span,
            name: name.name,
        })
    }

    // ---- expressions ----

    fn parse_expression(&mut self) -> Option<Node> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Option<Node> {
        self.nested(Self::parse_assignment_inner)
    }

    fn parse_assignment_inner(&mut self) -> Option<Node> {
        if self.is_arrow_start() {
            return self.parse_arrow();
        }
        let left = self.parse_conditional()?;
        if self.peek_symbol("=") {
            let op_span = self.bump_span();
            if !matches!(
                left,
                Node::Ident { .. } | Node::Member { .. } | Node::Index { .. }
            ) {
                self.error("E2004", "invalid assignment target", op_span);
            }
            let right = self.parse_assignment()?;
            return Some(Node::Binary {
                span: left.span().merge(right.span()),
                op: "=".to_string(),
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Some(left)
    }

    fn parse_conditional(&mut self) -> Option<Node> {
        let test = self.parse_binary(1)?;
        if !self.eat_symbol("?") {
            return Some(test);
        }
        let consequent = self.parse_assignment()?;
        self.expect_symbol(":")?;
        let alternate = self.parse_assignment()?;
        Some(Node::Conditional {
            span: test.span().merge(alternate.span()),
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_binary(&mut self, min_prec: u8) -> Option<Node> {
        let mut left = self.parse_unary()?;
        loop {
            let Some(token) = self.peek() else {
                break;
            };
            if token.kind != TokenKind::Symbol {
                break;
            }
            let prec = binary_prec(&token.text);
            if prec == 0 || prec < min_prec {
                break;
            }
            let op = token.text.clone();
            self.pos += 1;
            let right = self.parse_binary(prec + 1)?;
            let span = left.span().merge(right.span());
            left = if is_logical_op(&op) {
                Node::Logical {
                    span,
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            } else {
                Node::Binary {
                    span,
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            };
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<Node> {
        let is_unary = match self.peek() {
            Some(token) if token.kind == TokenKind::Symbol => {
                matches!(token.text.as_str(), "!" | "-" | "+")
            }
            Some(token) if token.kind == TokenKind::Ident => {
                matches!(token.text.as_str(), "await" | "typeof")
            }
            _ => false,
        };
        if !is_unary {
            return self.parse_postfix();
        }
        let token = self.bump()?;
        let operand = self.nested(Self::parse_unary)?;
        Some(Node::Unary {
            span: token.span.merge(operand.span()),
            op: token.text,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Option<Node> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat_symbol(".") {
                let property = self.expect_name("property name")?;
                expr = Node::Member {
                    span: expr.span().merge(&property.span),
                    object: Box::new(expr),
                    property,
                };
            } else if self.eat_symbol("[") {
                let index = self.parse_expression()?;
                self.expect_symbol("]")?;
                expr = Node::Index {
                    span: expr.span().merge(&self.prev_span()),
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.peek_symbol("(") {
                let args = self.parse_arguments()?;
                expr = Node::Call {
                    span: expr.span().merge(&self.prev_span()),
                    callee: Box::new(expr),
                    args,
                };
            } else {
                break;
            }
        }
        Some(expr)
    }

    fn parse_arguments(&mut self) -> Option<Vec<Node>> {
        self.expect_symbol("(")?;
        let mut args = Vec::new();
        while !self.peek_symbol(")") {
            args.push(self.parse_assignment()?);
            if !self.eat_symbol(",") {
                break;
            }
        }
        self.expect_symbol(")")?;
        Some(args)
    }

    fn parse_primary(&mut self) -> Option<Node> {
        let Some(token) = self.peek().cloned() else {
            let span = self.prev_span();
            self.error("E2002", "unexpected end of input, expected expression", span);
            return None;
        };
        match token.kind {
            TokenKind::Number => {
                self.pos += 1;
                Some(Node::Literal {
                    span: token.span,
                    value: Literal::Number(token.text),
                })
            }
            TokenKind::String => {
                self.pos += 1;
                Some(Node::Literal {
                    span: token.span,
                    value: Literal::String(decode_string_literal(&token.text)),
                })
            }
            TokenKind::Ident => match token.text.as_str() {
                "true" | "false" => {
                    self.pos += 1;
                    Some(Node::Literal {
                        span: token.span,
                        value: Literal::Bool(token.text == "true"),
                    })
                }
                "null" => {
                    self.pos += 1;
                    Some(Node::Literal {
                        span: token.span,
                        value: Literal::Null,
                    })
                }
                "new" => self.parse_new(),
                text if syntax::is_keyword(text) => {
                    self.error(
                        "E2000",
                        format!("unexpected keyword '{text}', expected expression"),
                        token.span,
                    );
                    None
                }
                _ => {
                    self.pos += 1;
                    Some(Node::Ident {
                        span: token.span,
                        name: token.text,
                    })
                }
            },
            TokenKind::Symbol => match token.text.as_str() {
                "(" => {
                    self.pos += 1;
                    let expr = self.parse_expression()?;
                    self.expect_symbol(")")?;
                    Some(expr)
                }
                "[" => {
                    let start = self.bump_span();
                    let mut elements = Vec::new();
                    while !self.peek_symbol("]") {
                        elements.push(self.parse_assignment()?);
                        if !self.eat_symbol(",") {
                            break;
                        }
                    }
                    self.expect_symbol("]")?;
                    Some(Node::Array {
                        span: start.merge(&self.prev_span()),
                        elements,
                    })
                }
                "{" => self.parse_object(),
                other => {
                    self.error(
                        "E2000",
                        format!("unexpected '{other}', expected expression"),
                        token.span,
                    );
                    None
                }
            },
        }
    }

    fn parse_new(&mut self) -> Option<Node> {
        let start = self.bump_span();
        let mut callee = self.nested(Self::parse_primary)?;
        loop {
            if self.eat_symbol(".") {
                let property = self.expect_name("property name")?;
                callee = Node::Member {
                    span: callee.span().merge(&property.span),
                    object: Box::new(callee),
                    property,
                };
            } else if self.eat_symbol("[") {
                let index = self.parse_expression()?;
                self.expect_symbol("]")?;
                callee = Node::Index {
                    span: callee.span().merge(&self.prev_span()),
                    object: Box::new(callee),
                    index: Box::new(index),
                };
            } else {
                break;
            }
        }
        let args = if self.peek_symbol("(") {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Some(Node::New {
            span: start.merge(&self.prev_span()),
            callee: Box::new(callee),
            args,
        })
    }

    fn parse_object(&mut self) -> Option<Node> {
        let start = self.expect_symbol("{")?;
        let mut properties = Vec::new();
        while !self.peek_symbol("}") {
            let key = match self.peek().cloned() {
                Some(token) if token.kind == TokenKind::String => {
                    self.pos += 1;
                    SpannedName {
                        name: decode_string_literal(&token.text),
                        span: token.span,
                    }
                }
                Some(token) if token.kind == TokenKind::Number => {
                    self.pos += 1;
                    SpannedName {
                        name: token.text,
                        span: token.span,
                    }
                }
                _ => self.expect_name("property name")?,
            };
            let (value, shorthand) = if self.eat_symbol(":") {
                (self.parse_assignment()?, false)
            } else {
                (
                    Node::Ident {
                        span: key.span.clone(),
                        name: key.name.clone(),
                    },
                    true,
                )
            };
            properties.push(Property {
                key,
                value,
                shorthand,
            });
            if !self.eat_symbol(",") {
                break;
            }
        }
        self.expect_symbol("}")?;
        Some(Node::Object {
            span: start.merge(&self.prev_span()),
            properties,
        })
    }

    fn is_arrow_start(&self) -> bool {
        let mut index = self.pos;
        if self.token_at(index).is_some_and(|t| t.is_ident("async"))
            && self
                .token_at(index + 1)
                .is_some_and(|t| t.kind == TokenKind::Ident || t.is_symbol("("))
        {
            index += 1;
        }
        let Some(token) = self.token_at(index) else {
            return false;
        };
        if token.kind == TokenKind::Ident && !syntax::is_keyword(&token.text) {
            return self.token_at(index + 1).is_some_and(|t| t.is_symbol("=>"));
        }
        if !token.is_symbol("(") {
            return false;
        }
        let mut depth = 0usize;
        while let Some(token) = self.token_at(index) {
            if token.kind == TokenKind::Symbol {
                match token.text.as_str() {
                    "(" | "[" | "{" => {
                        depth += 1;
                        if depth > MAX_NESTING {
                            return false;
                        }
                    }
                    ";" => return false,
                    ")" | "]" | "}" => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            return self.token_at(index + 1).is_some_and(|t| t.is_symbol("=>"));
                        }
                    }
                    _ => {}
                }
            }
            index += 1;
        }
        false
    }

    fn parse_arrow(&mut self) -> Option<Node> {
        let start = self.current_span();
        let is_async = if self.peek_ident("async") {
            self.pos += 1;
            true
        } else {
            false
        };
        let mut params = Vec::new();
        if self.eat_symbol("(") {
            while !self.peek_symbol(")") {
                params.push(self.parse_pattern()?);
                if !self.eat_symbol(",") {
                    break;
                }
            }
            self.expect_symbol(")")?;
        } else {
            let name = self.expect_binding_name()?;
            params.push(Pattern::Ident {
                span: name.span,
                name: name.name,
            });
        }
        self.expect_symbol("=>")?;
        let body = if self.peek_symbol("{") {
            self.parse_block()?
        } else {
            self.parse_assignment()?
        };
        Some(Node::Arrow {
            span: start.merge(body.span()),
            is_async,
            params,
            body: Box::new(body),
        })
    }

    // ---- token helpers ----

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn token_at(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    fn peek_symbol(&self, text: &str) -> bool {
        self.peek().is_some_and(|t| t.is_symbol(text))
    }

    fn peek_ident(&self, text: &str) -> bool {
        self.peek().is_some_and(|t| t.is_ident(text))
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn bump_span(&mut self) -> Span {
        let span = self.current_span();
        self.pos += 1;
        span
    }

    fn eat_symbol(&mut self, text: &str) -> bool {
        if self.peek_symbol(text) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, text: &str) -> Option<Span> {
        if self.peek_symbol(text) {
            return Some(self.bump_span());
        }
        match self.peek().cloned() {
            Some(token) => self.error(
                "E2001",
                format!("expected '{text}', found '{}'", token.text),
                token.span,
            ),
            None => {
                let span = self.prev_span();
                self.error(
                    "E2002",
                    format!("unexpected end of input, expected '{text}'"),
                    span,
                );
            }
        }
        None
    }

    /// Any identifier, keywords included (property names and export aliases).
    fn expect_name(&mut self, what: &str) -> Option<SpannedName> {
        match self.peek().cloned() {
            Some(token) if token.kind == TokenKind::Ident => {
                self.pos += 1;
                Some(SpannedName {
                    name: token.text,
                    span: token.span,
                })
            }
            Some(token) => {
                self.error(
                    "E2001",
                    format!("expected {what}, found '{}'", token.text),
                    token.span,
                );
                None
            }
            None => {
                let span = self.prev_span();
                self.error(
                    "E2002",
                    format!("unexpected end of input, expected {what}"),
                    span,
                );
                None
            }
        }
    }

    fn expect_binding_name(&mut self) -> Option<SpannedName> {
        if let Some(token) = self.peek() {
            if token.kind == TokenKind::Ident && syntax::is_keyword(&token.text) {
                let span = token.span.clone();
                let text = token.text.clone();
                self.error(
                    "E2003",
                    format!("'{text}' is reserved and cannot be used as a binding name"),
                    span,
                );
                return None;
            }
        }
        self.expect_name("binding name")
    }

    fn current_span(&self) -> Span {
        match self.peek() {
            Some(token) => token.span.clone(),
            None => self.prev_span(),
        }
    }

    fn prev_span(&self) -> Span {
        if self.pos == 0 {
            return self
                .tokens
                .first()
                .map(|t| t.span.clone())
                .unwrap_or_else(|| Span::point(1, 1));
        }
        self.tokens
            .get(self.pos - 1)
            .or_else(|| self.tokens.last())
            .map(|t| t.span.clone())
            .unwrap_or_else(|| Span::point(1, 1))
    }

    /// Runs `parse` one nesting level deeper, or reports E2006 once the limit is hit.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        if self.depth >= MAX_NESTING {
            let span = self.current_span();
            self.error("E2006", "expression nested too deeply", span);
            return None;
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Skips to the next statement boundary after a parse failure.
    ///
    /// A `}` is left in place: it closes the enclosing block, and the top-level loop
    /// reports stray ones itself.
    fn recover(&mut self) {
        let start = self.pos;
        while let Some(token) = self.peek() {
            if token.is_symbol(";") {
                self.pos += 1;
                return;
            }
            if token.is_symbol("}") {
                return;
            }
            let starts_statement = token.kind == TokenKind::Ident
                && matches!(
                    token.text.as_str(),
                    "const" | "let" | "var" | "export" | "if" | "return"
                );
            if starts_statement && self.pos > start {
                return;
            }
            self.pos += 1;
        }
    }

    fn error(&mut self, code: &str, message: impl Into<String>, span: Span) {
        self.diagnostics.push(FileDiagnostic {
            path: self.path.clone(),
            diagnostic: Diagnostic::error(code, message, span),
        });
    }
}
