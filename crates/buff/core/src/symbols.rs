//! Symbol table of named sub-formulas in one source text block.
//!
//! Source blocks declare intermediate formulas as bindings
//! (`const dmg = sum(...)`) and reference them by name elsewhere. The builder
//! indexes every top-level binding so the translator can inline them.

use std::collections::BTreeMap;

use tracing::trace;

use crate::scan;

/// Keywords that may precede a binding name.
const DECLARATION_KEYWORDS: &[&str] = &["export", "const", "let", "var"];

/// Where a source expression came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin<'a> {
    /// The right-hand side of a named binding.
    Binding(&'a str),
    /// An argument of a recognized call form.
    Argument { form: &'a str, index: usize },
    /// A value inside a buff section (`premod: { key: value }`).
    Section { section: &'a str, key: &'a str },
    /// A fragment handed in directly by the caller.
    Fragment,
}

/// An immutable source text fragment plus its provenance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceExpr<'a> {
    pub text: &'a str,
    pub origin: Origin<'a>,
}

impl<'a> SourceExpr<'a> {
    pub fn fragment(text: &'a str) -> Self {
        Self {
            text,
            origin: Origin::Fragment,
        }
    }

    pub fn argument(text: &'a str, form: &'a str, index: usize) -> Self {
        Self {
            text,
            origin: Origin::Argument { form, index },
        }
    }

    pub fn section(text: &'a str, section: &'a str, key: &'a str) -> Self {
        Self {
            text,
            origin: Origin::Section { section, key },
        }
    }
}

/// Name → raw expression text for one translation unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolTable {
    entries: BTreeMap<String, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes every top-level binding in `text`.
    ///
    /// The binding named `excluded` (the full parameter table) is skipped; it
    /// is read through the parameter resolver instead. Later bindings for the
    /// same name overwrite earlier ones.
    pub fn build(text: &str, excluded: &str) -> Self {
        let text = scan::strip_comments(text);
        let text = text.as_ref();
        let bytes = text.as_bytes();

        let mut table = Self::new();
        let mut depth = 0usize;
        let mut at_statement_start = true;
        let mut i = 0usize;
        while i < bytes.len() {
            if at_statement_start && depth == 0 {
                let start = skip_blank(bytes, i);
                if let Some((name, rhs_start)) = match_binding(text, start) {
                    let end = statement_end(text, rhs_start);
                    if name != excluded {
                        trace!(name, "indexed binding");
                        table.insert(name, text[rhs_start..end].trim());
                    }
                    i = end;
                    continue;
                }
                at_statement_start = false;
            }

            let b = bytes[i];
            match b {
                b'\'' | b'"' | b'`' => {
                    i = scan::skip_string(bytes, i).unwrap_or(bytes.len());
                    continue;
                }
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => depth = depth.saturating_sub(1),
                b';' | b'\n' if depth == 0 => at_statement_start = true,
                _ => {}
            }
            i += scan::utf8_len(b);
        }
        table
    }

    /// Adds or replaces a binding.
    pub fn insert(&mut self, name: impl Into<String>, expr: impl Into<String>) {
        self.entries.insert(name.into(), expr.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// The bound expression for `name`, tagged with its provenance.
    pub fn source<'a>(&'a self, name: &'a str) -> Option<SourceExpr<'a>> {
        self.get(name).map(|text| SourceExpr {
            text,
            origin: Origin::Binding(name),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn skip_blank(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Matches `[export] [const|let|var] NAME =` at `start`.
///
/// Returns the bound name and the index just past `=`. Destructuring
/// patterns and comparison/arrow operators never match.
fn match_binding(text: &str, start: usize) -> Option<(&str, usize)> {
    let bytes = text.as_bytes();
    let mut at = start;
    loop {
        let len = scan::identifier_len(text, at);
        if len == 0 {
            return None;
        }
        let word = &text[at..at + len];
        let after = skip_blank(bytes, at + len);
        if DECLARATION_KEYWORDS.contains(&word) && after > at + len {
            at = after;
            continue;
        }

        if bytes.get(after) != Some(&b'=') || matches!(bytes.get(after + 1), Some(b'=' | b'>')) {
            return None;
        }
        return Some((word, after + 1));
    }
}

/// True if a binding or a (possibly destructuring) declaration starts at `at`.
fn starts_declaration(text: &str, at: usize) -> bool {
    let len = scan::identifier_len(text, at);
    match_binding(text, at).is_some() || DECLARATION_KEYWORDS.contains(&&text[at..at + len])
}

/// Finds where the binding expression starting at `start` ends.
///
/// Boundaries: `;` at depth zero, a newline at depth zero whose next
/// non-blank line opens another binding or declaration or closes a block, an unmatched
/// closing bracket, or the end of the text.
fn statement_end(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' | b'`' => {
                i = scan::skip_string(bytes, i).unwrap_or(bytes.len());
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' if depth == 0 => return i,
            b')' | b']' | b'}' => depth -= 1,
            b';' if depth == 0 => return i,
            b'\n' if depth == 0 => {
                let next = skip_blank(bytes, i);
                if next >= bytes.len() || bytes[next] == b'}' || starts_declaration(text, next) {
                    return i;
                }
            }
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_semicolon_terminated_bindings() {
        let table = SymbolTable::build("const x = pct(dm.skill.hit1); premod: { dmg_: x }", "dm");
        assert_eq!(table.get("x"), Some("pct(dm.skill.hit1)"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn multiline_expressions_continue_until_next_binding() {
        let text = "const a = sum(\n  dm.x,\n  dm.y\n)\n  + 1\nconst b = a\n";
        let table = SymbolTable::build(text, "dm");
        assert_eq!(table.get("a"), Some("sum(\n  dm.x,\n  dm.y\n)\n  + 1"));
        assert_eq!(table.get("b"), Some("a"));
    }

    #[test]
    fn skips_the_parameter_table_and_destructuring() {
        let text = "const dm = { skill: { hit1: 1 } }\nconst [condPath, cond] = cond(key, 'x')\nexport const y = 2";
        let table = SymbolTable::build(text, "dm");
        assert!(!table.contains("dm"));
        assert!(!table.contains("condPath"));
        assert_eq!(table.get("y"), Some("2"));
    }

    #[test]
    fn nested_bindings_are_not_top_level() {
        let text = "function f() {\n  const inner = 1\n}\nouter = 2";
        let table = SymbolTable::build(text, "dm");
        assert!(!table.contains("inner"));
        assert_eq!(table.get("outer"), Some("2"));
    }

    #[test]
    fn comparisons_are_not_assignments() {
        let text = "a == b;\nc => d;\nlet e = 1";
        let table = SymbolTable::build(text, "dm");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("e"), Some("1"));
    }

    #[test]
    fn last_write_wins() {
        let table = SymbolTable::build("let a = 1; a = 2;", "dm");
        assert_eq!(table.get("a"), Some("2"));
    }

    #[test]
    fn comments_do_not_confuse_boundaries() {
        let text = "const a = 1 // isn't a string\nconst b = a /* ; */ + 2";
        let table = SymbolTable::build(text, "dm");
        assert_eq!(table.get("a"), Some("1"));
        assert_eq!(table.get("b"), Some("a  + 2"));
    }

    #[test]
    fn provenance_names_the_binding() {
        let table = SymbolTable::build("const x = 3", "dm");
        let source = table.source("x").unwrap();
        assert_eq!(source.origin, Origin::Binding("x"));
        assert_eq!(source.text, "3");
    }
}
