pub const KEYWORDS_DECL: &[&str] = &["const", "let", "var"];

pub const KEYWORDS_CONTROL: &[&str] = &["if", "else", "return", "new", "async", "await", "typeof"];

pub const KEYWORDS_OTHER: &[&str] = &["export", "as"];

pub const LITERAL_KEYWORDS: &[&str] = &["true", "false", "null"];

/// Constructors whose `new` expression at module level marks a binding as mutable state.
pub const CONTAINER_CONSTRUCTORS: &[&str] = &["Map", "Set", "Array"];

pub const SYMBOLS_3: &[([char; 3], &str)] = &[(['=', '=', '='], "==="), (['!', '=', '='], "!==")];

pub const SYMBOLS_2: &[([char; 2], &str)] = &[
    (['=', '>'], "=>"),
    (['=', '='], "=="),
    (['!', '='], "!="),
    (['<', '='], "<="),
    (['>', '='], ">="),
    (['&', '&'], "&&"),
    (['|', '|'], "||"),
    (['?', '?'], "??"),
];

pub const SYMBOLS_1: &[char] = &[
    '{', '}', '(', ')', '[', ']', ',', '.', ':', ';', '=', '+', '-', '*', '/', '!', '<', '>',
    '?', '%',
];

pub fn is_keyword(text: &str) -> bool {
    KEYWORDS_DECL.contains(&text)
        || KEYWORDS_CONTROL.contains(&text)
        || KEYWORDS_OTHER.contains(&text)
        || LITERAL_KEYWORDS.contains(&text)
}

pub fn is_container_constructor(name: &str) -> bool {
    CONTAINER_CONSTRUCTORS.contains(&name)
}
