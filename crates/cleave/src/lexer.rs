use crate::diagnostics::{Diagnostic, Position, Span};
use crate::syntax;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    String,
    Symbol,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn is_symbol(&self, text: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == text
    }

    pub fn is_ident(&self, text: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == text
    }
}

/// Tokenizes `content`, dropping whitespace and comments.
///
/// Lexing never stops early: unexpected characters and unterminated literals are reported
/// and scanning continues so the parser can still produce diagnostics for the rest.
pub fn lex(content: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let mut tokens = Vec::new();
    let mut diagnostics = Vec::new();

    let chars: Vec<char> = content.chars().collect();
    let mut index = 0usize;
    let mut line = 1usize;
    let mut col = 1usize;

    while index < chars.len() {
        let ch = chars[index];

        if ch == '\n' {
            index += 1;
            line += 1;
            col = 1;
            continue;
        }

        if ch.is_whitespace() {
            index += 1;
            col += 1;
            continue;
        }

        if ch == '/' && chars.get(index + 1) == Some(&'/') {
            while index < chars.len() && chars[index] != '\n' {
                index += 1;
                col += 1;
            }
            continue;
        }

        if ch == '/' && chars.get(index + 1) == Some(&'*') {
            let start_line = line;
            let start_col = col;
            index += 2;
            col += 2;
            let mut closed = false;
            while index < chars.len() {
                if chars[index] == '*' && chars.get(index + 1) == Some(&'/') {
                    index += 2;
                    col += 2;
                    closed = true;
                    break;
                }
                if chars[index] == '\n' {
                    line += 1;
                    col = 1;
                } else {
                    col += 1;
                }
                index += 1;
            }
            if !closed {
                diagnostics.push(
                    Diagnostic::error(
                        "E1002",
                        "unterminated block comment",
                        span_single(start_line, start_col, 2),
                    )
                    .with_label("comment started here", span_single(start_line, start_col, 2)),
                );
            }
            continue;
        }

        if ch == '"' || ch == '\'' || ch == '`' {
            let quote = ch;
            let start = index;
            let start_line = line;
            let start_col = col;
            index += 1;
            col += 1;
            let mut closed = false;
            while index < chars.len() {
                if chars[index] == '\n' && quote != '`' {
                    break;
                }
                if chars[index] == '\\' && index + 1 < chars.len() && chars[index + 1] != '\n' {
                    index += 2;
                    col += 2;
                    continue;
                }
                if chars[index] == quote {
                    index += 1;
                    col += 1;
                    closed = true;
                    break;
                }
                if chars[index] == '\n' {
                    line += 1;
                    col = 1;
                } else {
                    col += 1;
                }
                index += 1;
            }
            let text: String = chars[start..index.min(chars.len())].iter().collect();
            let span = if start_line == line {
                span_single(line, start_col, index - start)
            } else {
                Span {
                    start: Position {
                        line: start_line,
                        column: start_col,
                    },
                    end: Position {
                        line,
                        column: col.saturating_sub(1).max(1),
                    },
                }
            };
            if !closed {
                diagnostics.push(
                    Diagnostic::error("E1001", "unterminated string literal", span.clone())
                        .with_label(
                            "string literal started here",
                            span_single(start_line, start_col, 1),
                        ),
                );
            }
            tokens.push(Token {
                kind: TokenKind::String,
                text,
                span,
            });
            continue;
        }

        if is_ident_start(ch) {
            let start = index;
            let start_col = col;
            index += 1;
            col += 1;
            while index < chars.len() && is_ident_continue(chars[index]) {
                index += 1;
                col += 1;
            }
            let text: String = chars[start..index].iter().collect();
            tokens.push(Token {
                kind: TokenKind::Ident,
                text,
                span: span_single(line, start_col, index - start),
            });
            continue;
        }

        if ch.is_ascii_digit() {
            let start = index;
            let start_col = col;
            index += 1;
            col += 1;
            while index < chars.len() && chars[index].is_ascii_digit() {
                index += 1;
                col += 1;
            }
            if index + 1 < chars.len() && chars[index] == '.' && chars[index + 1].is_ascii_digit() {
                index += 1;
                col += 1;
                while index < chars.len() && chars[index].is_ascii_digit() {
                    index += 1;
                    col += 1;
                }
            }
            let text: String = chars[start..index].iter().collect();
            tokens.push(Token {
                kind: TokenKind::Number,
                text,
                span: span_single(line, start_col, index - start),
            });
            continue;
        }

        if let Some((symbol, len)) = match_symbol(&chars, index) {
            tokens.push(Token {
                kind: TokenKind::Symbol,
                text: symbol,
                span: span_single(line, col, len),
            });
            index += len;
            col += len;
            continue;
        }

        diagnostics.push(Diagnostic::error(
            "E1000",
            format!("unexpected character '{ch}'"),
            span_single(line, col, 1),
        ));
        index += 1;
        col += 1;
    }

    diagnostics.extend(check_braces(&tokens));

    (tokens, diagnostics)
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_continue(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

fn match_symbol(chars: &[char], index: usize) -> Option<(String, usize)> {
    if index + 2 < chars.len() {
        for (needle, symbol) in syntax::SYMBOLS_3 {
            if chars[index] == needle[0]
                && chars[index + 1] == needle[1]
                && chars[index + 2] == needle[2]
            {
                return Some(((*symbol).to_string(), 3));
            }
        }
    }

    if index + 1 < chars.len() {
        for (needle, symbol) in syntax::SYMBOLS_2 {
            if chars[index] == needle[0] && chars[index + 1] == needle[1] {
                return Some(((*symbol).to_string(), 2));
            }
        }
    }

    let ch = chars[index];
    if syntax::SYMBOLS_1.contains(&ch) {
        return Some((ch.to_string(), 1));
    }

    None
}

fn check_braces(tokens: &[Token]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut stack: Vec<(String, Span)> = Vec::new();

    for token in tokens {
        if token.kind != TokenKind::Symbol {
            continue;
        }
        match token.text.as_str() {
            "{" | "(" | "[" => stack.push((token.text.clone(), token.span.clone())),
            "}" | ")" | "]" => {
                let Some((open, open_span)) = stack.pop() else {
                    diagnostics.push(Diagnostic::error(
                        "E1005",
                        format!("unmatched closing '{}'", token.text),
                        token.span.clone(),
                    ));
                    continue;
                };
                if !matches_pair(&open, &token.text) {
                    diagnostics.push(
                        Diagnostic::error(
                            "E1003",
                            format!("mismatched '{}' and '{}'", open, token.text),
                            token.span.clone(),
                        )
                        .with_label("opening here", open_span),
                    );
                }
            }
            _ => {}
        }
    }

    for (open, span) in stack {
        diagnostics.push(Diagnostic::error(
            "E1004",
            format!("unclosed '{}'", open),
            span,
        ));
    }

    diagnostics
}

fn matches_pair(open: &str, close: &str) -> bool {
    matches!((open, close), ("{", "}") | ("(", ")") | ("[", "]"))
}

fn span_single(line: usize, column: usize, len: usize) -> Span {
    Span {
        start: Position { line, column },
        end: Position {
            line,
            column: if len == 0 { column } else { column + len - 1 },
        },
    }
}
