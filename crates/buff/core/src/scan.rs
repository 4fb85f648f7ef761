//! Bracket- and string-aware scanning primitives.
//!
//! The source and target dialects are small enough that a textual scanner is
//! all the structure the engine needs. Every function here is total:
//! malformed or unterminated input degrades to `None` or a best-effort split,
//! never a panic.
//!
//! All delimiters are ASCII, so every byte offset produced here is a valid
//! `str` boundary.

use std::borrow::Cow;

/// Escape marker honored inside quoted strings.
const ESCAPE: u8 = b'\\';

const fn is_quote(b: u8) -> bool {
    matches!(b, b'\'' | b'"' | b'`')
}

const fn is_open(b: u8) -> bool {
    matches!(b, b'(' | b'[' | b'{')
}

const fn is_close(b: u8) -> bool {
    matches!(b, b')' | b']' | b'}')
}

pub(crate) const fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

pub(crate) const fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Returns the index just past the string literal opening at `start`.
///
/// `None` when the literal is unterminated or `start` is not a quote.
pub fn skip_string(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = *bytes.get(start)?;
    if !is_quote(quote) {
        return None;
    }
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            ESCAPE => i += 2,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Finds the bracket closing the one at `open_index`.
///
/// Depth is tracked across `()`, `[]` and `{}`; quoted strings are skipped.
/// Returns `None` if `open_index` is not an opening bracket or the text ends
/// before the bracket closes.
pub fn find_matching_close(text: &str, open_index: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if !bytes.get(open_index).is_some_and(|b| is_open(*b)) {
        return None;
    }

    let mut depth = 0usize;
    let mut i = open_index;
    while i < bytes.len() {
        let b = bytes[i];
        if is_quote(b) {
            i = skip_string(bytes, i)?;
            continue;
        }
        if is_open(b) {
            depth += 1;
        } else if is_close(b) {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Splits `text` on `delimiter` wherever nesting depth is zero and no string
/// is open.
///
/// Segments are trimmed and empty segments dropped, so a trailing delimiter
/// (`a, b,`) yields two segments. An unterminated string swallows the rest of
/// the text into the last segment.
pub fn split_top_level(text: &str, delimiter: char) -> Vec<&str> {
    let mut parts = Vec::new();
    if !delimiter.is_ascii() {
        push_trimmed(&mut parts, text);
        return parts;
    }

    let delim = delimiter as u8;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if is_quote(b) {
            match skip_string(bytes, i) {
                Some(next) => {
                    i = next;
                    continue;
                }
                None => break,
            }
        }
        if is_open(b) {
            depth += 1;
        } else if is_close(b) {
            depth = depth.saturating_sub(1);
        } else if b == delim && depth == 0 {
            push_trimmed(&mut parts, &text[start..i]);
            start = i + 1;
        }
        i += 1;
    }
    push_trimmed(&mut parts, &text[start..]);
    parts
}

fn push_trimmed<'a>(parts: &mut Vec<&'a str>, segment: &'a str) {
    let trimmed = segment.trim();
    if !trimmed.is_empty() {
        parts.push(trimmed);
    }
}

/// Extracts up to `max_args` top-level arguments of the call whose opening
/// parenthesis sits at `open_paren_index`.
///
/// Arguments beyond the cap are ignored. An unterminated argument list is
/// split best-effort up to the end of the text.
pub fn extract_call_arguments(text: &str, open_paren_index: usize, max_args: usize) -> Vec<&str> {
    if text.as_bytes().get(open_paren_index) != Some(&b'(') {
        return Vec::new();
    }
    let end = find_matching_close(text, open_paren_index).unwrap_or(text.len());
    split_top_level(&text[open_paren_index + 1..end], ',')
        .into_iter()
        .take(max_args)
        .collect()
}

/// True if every bracket in `text` is closed in order and every string is
/// terminated.
pub fn is_balanced(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut open = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if is_quote(b) {
            match skip_string(bytes, i) {
                Some(next) => {
                    i = next;
                    continue;
                }
                None => return false,
            }
        }
        if is_open(b) {
            open.push(b);
        } else if is_close(b) {
            let expected = match b {
                b')' => b'(',
                b']' => b'[',
                _ => b'{',
            };
            if open.pop() != Some(expected) {
                return false;
            }
        }
        i += 1;
    }
    open.is_empty()
}

/// Index of the first `needle` at depth zero outside strings.
pub fn find_top_level(text: &str, needle: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if is_quote(b) {
            i = skip_string(bytes, i)?;
            continue;
        }
        if b == needle && depth == 0 {
            return Some(i);
        }
        if is_open(b) {
            depth += 1;
        } else if is_close(b) {
            depth = depth.saturating_sub(1);
        }
        i += 1;
    }
    None
}

/// Length of the identifier starting at `start` (0 if none starts there).
pub fn identifier_len(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    match bytes.get(start) {
        Some(b) if is_ident_start(*b) => {}
        _ => return 0,
    }
    bytes[start..]
        .iter()
        .take_while(|b| is_ident_continue(**b))
        .count()
}

pub fn is_identifier(text: &str) -> bool {
    !text.is_empty() && identifier_len(text, 0) == text.len()
}

/// Length of the access path starting at `start`: an identifier followed by
/// any number of `.name` and `[...]` steps.
pub fn access_path_len(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    let mut end = start + identifier_len(text, start);
    if end == start {
        return 0;
    }
    loop {
        match bytes.get(end) {
            Some(b'.') => {
                let step = identifier_len(text, end + 1);
                if step == 0 {
                    break;
                }
                end += 1 + step;
            }
            Some(b'[') => match find_matching_close(text, end) {
                Some(close) => end = close + 1,
                None => break,
            },
            _ => break,
        }
    }
    end
}

pub fn is_access_path(text: &str) -> bool {
    !text.is_empty() && access_path_len(text, 0) == text.len()
}

/// Length of the numeric literal starting at `start`, exponent included.
pub fn number_len(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = start;
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    if i > start && matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        if bytes.get(j).is_some_and(u8::is_ascii_digit) {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    i - start
}

/// Parses a plain decimal literal, optionally negative.
///
/// Rejects anything `f64::from_str` would accept beyond plain numerals
/// (`inf`, `NaN`).
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let digits = text.strip_prefix('-').unwrap_or(text);
    let first = *digits.as_bytes().first()?;
    if !(first.is_ascii_digit() || first == b'.') || number_len(digits, 0) != digits.len() {
        return None;
    }
    digits
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|value| if text.starts_with('-') { -value } else { value })
}

pub fn is_string_literal(text: &str) -> bool {
    let bytes = text.as_bytes();
    !bytes.is_empty() && skip_string(bytes, 0) == Some(bytes.len())
}

/// Returns the contents of a string literal without its quotes.
pub fn unquote(text: &str) -> Option<&str> {
    is_string_literal(text).then(|| &text[1..text.len() - 1])
}

/// Strips one layer of parentheses that wraps the whole expression.
pub fn strip_outer_parens(text: &str) -> Option<&str> {
    let text = text.trim();
    if !text.starts_with('(') {
        return None;
    }
    (find_matching_close(text, 0)? == text.len() - 1).then(|| text[1..text.len() - 1].trim())
}

/// Returns the contents of a bracketed literal (`[...]` or `{...}`) that spans
/// the whole text.
pub fn bracketed_body(text: &str, open: u8) -> Option<&str> {
    let text = text.trim();
    if text.as_bytes().first() != Some(&open) {
        return None;
    }
    (find_matching_close(text, 0)? == text.len() - 1).then(|| &text[1..text.len() - 1])
}

/// Parses an object literal into its top-level `key: value` pairs.
///
/// Quoted keys are unquoted, shorthand entries (`{ x }`) map the identifier
/// to itself and spread entries (`...rest`) are skipped.
pub fn parse_object_literal(text: &str) -> Option<Vec<(&str, &str)>> {
    let body = bracketed_body(text, b'{')?;
    let mut entries = Vec::new();
    for segment in split_top_level(body, ',') {
        if segment.starts_with("...") {
            continue;
        }
        match find_top_level(segment, b':') {
            Some(colon) => {
                let key = segment[..colon].trim();
                let key = unquote(key).unwrap_or(key);
                entries.push((key, segment[colon + 1..].trim()));
            }
            None if is_identifier(segment) => entries.push((segment, segment)),
            None => return None,
        }
    }
    Some(entries)
}

/// If `text` is a single call expression (`callee(...)` spanning the whole
/// text), returns the callee path and the index of its opening parenthesis.
pub fn call_head(text: &str) -> Option<(&str, usize)> {
    let callee_len = access_path_len(text, 0);
    if callee_len == 0 {
        return None;
    }
    let open = callee_len + text[callee_len..].len() - text[callee_len..].trim_start().len();
    if text.as_bytes().get(open) != Some(&b'(') {
        return None;
    }
    (find_matching_close(text, open)? == text.len() - 1).then(|| (&text[..callee_len], open))
}

/// Replaces every free occurrence of identifier `name` with `replacement`.
///
/// Occurrences inside strings or after a member-access `.` are left alone.
pub fn substitute_identifier(text: &str, name: &str, replacement: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if is_quote(b) {
            let end = skip_string(bytes, i).unwrap_or(bytes.len());
            out.push_str(&text[i..end]);
            i = end;
            continue;
        }
        if is_ident_start(b) && (i == 0 || !is_ident_continue(bytes[i - 1])) {
            let len = identifier_len(text, i);
            let word = &text[i..i + len];
            let is_member = previous_non_space(bytes, i) == Some(b'.');
            if word == name && !is_member {
                out.push_str(replacement);
            } else {
                out.push_str(word);
            }
            i += len;
            continue;
        }
        let ch_len = utf8_len(b);
        out.push_str(&text[i..(i + ch_len).min(bytes.len())]);
        i += ch_len;
    }
    out
}

/// Removes `//` line comments and `/* */` block comments outside strings.
pub fn strip_comments(text: &str) -> Cow<'_, str> {
    if !text.contains("//") && !text.contains("/*") {
        return Cow::Borrowed(text);
    }
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if is_quote(b) {
            let end = skip_string(bytes, i).unwrap_or(bytes.len());
            out.push_str(&text[i..end]);
            i = end;
            continue;
        }
        if b == b'/' && bytes.get(i + 1) == Some(&b'/') {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if b == b'/' && bytes.get(i + 1) == Some(&b'*') {
            let close = text[i + 2..].find("*/").map_or(bytes.len(), |at| i + 2 + at + 2);
            // Keep line structure so statement boundaries survive.
            out.extend(text[i..close].chars().filter(|c| *c == '\n'));
            i = close;
            continue;
        }
        let ch_len = utf8_len(b);
        out.push_str(&text[i..(i + ch_len).min(bytes.len())]);
        i += ch_len;
    }
    Cow::Owned(out)
}

pub(crate) fn previous_non_space(bytes: &[u8], index: usize) -> Option<u8> {
    bytes[..index]
        .iter()
        .rev()
        .copied()
        .find(|b| !b.is_ascii_whitespace())
}

pub(crate) const fn utf8_len(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}
