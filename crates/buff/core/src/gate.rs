//! Safety gate over produced target formulas.
//!
//! The target runtime only provides a fixed vocabulary of free identifiers.
//! A formula that mentions anything else would either fail at load time or,
//! worse, evaluate a source-dialect concept as garbage. Every translation is
//! checked here before it is accepted.

use std::collections::BTreeSet;

use crate::scan;

/// Build-stat accessors provided by the target runtime.
pub const BUILD_STATS: &[&str] = &[
    "atk",
    "hp",
    "def",
    "em",
    "er",
    "critRate",
    "critDmg",
    "healBonus",
    "baseAtk",
    "baseHp",
    "baseDef",
];

/// Per-rank talent-table accessor (`talent.skill.hit1`).
pub const TALENT_ACCESSOR: &str = "talent";

/// Contextual flags provided by the target runtime.
pub const CONTEXT_FLAGS: &[&str] = &[
    "constellation",
    "ascension",
    "level",
    "skillRank",
    "burstRank",
    "autoRank",
];

/// Numeric helpers and literal keywords.
pub const HELPERS: &[&str] = &["Number", "Math", "true", "false"];

/// The fixed set of free identifiers a target formula may reference.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct AllowList {
    names: BTreeSet<String>,
}

impl AllowList {
    /// The target runtime's standard vocabulary.
    pub fn standard() -> Self {
        BUILD_STATS
            .iter()
            .chain(std::iter::once(&TALENT_ACCESSOR))
            .chain(CONTEXT_FLAGS)
            .chain(HELPERS)
            .copied()
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::standard()
    }
}

impl<S: Into<String>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Returns the first free identifier in `expr` that is not allow-listed.
///
/// Identifiers inside string literals, numeric literals (`1e5`) and names
/// after a member-access `.` are not free. An unterminated string is reported
/// as disallowed.
pub fn first_disallowed_identifier<'a>(expr: &'a str, allow: &AllowList) -> Option<&'a str> {
    let bytes = expr.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if matches!(b, b'\'' | b'"' | b'`') {
            match scan::skip_string(bytes, i) {
                Some(end) => {
                    i = end;
                    continue;
                }
                None => return Some(&expr[i..]),
            }
        }
        if b.is_ascii_digit() {
            i += scan::number_len(expr, i).max(1);
            // Trailing identifier characters belong to the literal (`1px`).
            while i < bytes.len() && scan::is_ident_continue(bytes[i]) {
                i += 1;
            }
            continue;
        }
        if scan::is_ident_start(b) {
            let len = scan::identifier_len(expr, i);
            let word = &expr[i..i + len];
            let is_member = scan::previous_non_space(bytes, i) == Some(b'.');
            if !is_member && !allow.contains(word) {
                return Some(word);
            }
            i += len;
            continue;
        }
        i += scan::utf8_len(b);
    }
    None
}

/// True if `expr` references any free identifier outside `allow`.
pub fn has_disallowed_free_identifier(expr: &str, allow: &AllowList) -> bool {
    first_disallowed_identifier(expr, allow).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_vocabulary_passes() {
        let allow = AllowList::standard();
        assert!(!has_disallowed_free_identifier(
            "(constellation >= 2 ? atk * 0.4 : 0) + Math.max(talent.skill.hit1, 1e-3)",
            &allow
        ));
    }

    #[test]
    fn source_concepts_are_rejected() {
        let allow = AllowList::standard();
        assert_eq!(
            first_disallowed_identifier("atk * dm.skill.hit1", &allow),
            Some("dm")
        );
        assert_eq!(
            first_disallowed_identifier("condAfterBurst ? 1 : 0", &allow),
            Some("condAfterBurst")
        );
    }

    #[test]
    fn members_and_strings_are_not_free() {
        let allow = AllowList::standard();
        assert!(!has_disallowed_free_identifier("Math.floor(atk) + 'input'", &allow));
        assert!(!has_disallowed_free_identifier("talent . anything", &allow));
    }

    #[test]
    fn unterminated_strings_fail_closed() {
        assert!(has_disallowed_free_identifier("atk + 'oops", &AllowList::standard()));
    }

    #[test]
    fn custom_allow_lists_replace_the_vocabulary() {
        let allow: AllowList = ["x"].into_iter().collect();
        assert!(!has_disallowed_free_identifier("x * 2", &allow));
        assert!(has_disallowed_free_identifier("atk * 2", &allow));
    }
}
