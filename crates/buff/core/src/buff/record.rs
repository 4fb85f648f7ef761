//! Buff records handed back to the caller.

use std::collections::BTreeMap;

use super::{BuffValue, KeyGrammar, merge_value, scale};
use crate::error::BuffError;
use crate::scan;

/// A titled bundle of target key → value contributions.
///
/// Keys are validated against a [`KeyGrammar`] on insertion and repeated
/// contributions to one key are merged additively.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuffRecord {
    title: String,
    data: BTreeMap<String, BuffValue>,
}

impl BuffRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn data(&self) -> &BTreeMap<String, BuffValue> {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&BuffValue> {
        self.data.get(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BuffValue)> {
        self.data.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Adds an already-scaled value under `key`, merging with any prior
    /// contribution.
    pub fn insert(
        &mut self,
        key: &str,
        value: BuffValue,
        grammar: &KeyGrammar,
    ) -> Result<(), BuffError> {
        if grammar.classify(key).is_none() {
            return Err(BuffError::KeyRejected {
                key: key.to_owned(),
            });
        }
        let merged = match self.data.get(key) {
            Some(existing) => merge_value(existing, &value),
            None => value,
        };
        if merged.as_number().is_some_and(|n| !n.is_finite()) {
            return Err(BuffError::NonFinite {
                key: key.to_owned(),
            });
        }
        self.data.insert(key.to_owned(), merged);
        Ok(())
    }

    /// Scales a translated expression by the factor `key` implies and merges
    /// it in.
    pub fn contribute(
        &mut self,
        key: &str,
        expr: &str,
        grammar: &KeyGrammar,
    ) -> Result<(), BuffError> {
        let factor = grammar.factor(key).ok_or_else(|| BuffError::KeyRejected {
            key: key.to_owned(),
        })?;
        if scan::parse_number(expr).is_some_and(|n| !(n * factor).is_finite()) {
            return Err(BuffError::NonFinite {
                key: key.to_owned(),
            });
        }
        self.insert(key, BuffValue::from_expr(scale(expr, factor)), grammar)
    }

    /// Rebuilds the record with every value passed through `f`.
    pub(crate) fn map_values(&self, mut f: impl FnMut(&BuffValue) -> BuffValue) -> Self {
        Self {
            title: self.title.clone(),
            data: self
                .data
                .iter()
                .map(|(key, value)| (key.clone(), f(value)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contributions_are_scaled_by_key() {
        let grammar = KeyGrammar::standard();
        let mut record = BuffRecord::new("Test");
        record.contribute("dmg", "12", &grammar).unwrap();
        record.contribute("atk", "talent.skill.atk", &grammar).unwrap();
        record.contribute("critRate", "atk * 0.001", &grammar).unwrap();

        assert_eq!(record.get("dmg"), Some(&BuffValue::Number(1200.0)));
        assert_eq!(
            record.get("atk"),
            Some(&BuffValue::Formula("talent.skill.atk".into()))
        );
        assert_eq!(
            record.get("critRate"),
            Some(&BuffValue::Formula("(atk * 0.001) * 100".into()))
        );
    }

    #[test]
    fn repeated_keys_merge() {
        let grammar = KeyGrammar::standard();
        let mut record = BuffRecord::new("Test");
        record.contribute("atkPct", "0.1", &grammar).unwrap();
        record.contribute("atkPct", "0.15", &grammar).unwrap();
        assert_eq!(record.get("atkPct"), Some(&BuffValue::Number(25.0)));

        record.contribute("em", "level", &grammar).unwrap();
        record.contribute("em", "40", &grammar).unwrap();
        assert_eq!(
            record.get("em"),
            Some(&BuffValue::Formula("(level) + (40)".into()))
        );
    }

    #[test]
    fn keys_outside_the_grammar_are_rejected() {
        let grammar = KeyGrammar::standard();
        let mut record = BuffRecord::new("Test");
        let err = record
            .insert("stacks", BuffValue::Number(1.0), &grammar)
            .unwrap_err();
        assert_eq!(err, BuffError::KeyRejected { key: "stacks".into() });
        assert!(record.contribute("stacks", "1", &grammar).is_err());
        assert!(record.is_empty());
    }

    #[test]
    fn overflowing_values_are_rejected() {
        let grammar = KeyGrammar::standard();
        let mut record = BuffRecord::new("Test");
        assert_eq!(
            record.contribute("dmg", "1e307", &grammar),
            Err(BuffError::NonFinite { key: "dmg".into() })
        );
        assert!(record.is_empty());

        record.contribute("atk", "1e308", &grammar).unwrap();
        assert_eq!(
            record.contribute("atk", "1.5e308", &grammar),
            Err(BuffError::NonFinite { key: "atk".into() })
        );
        assert_eq!(record.get("atk"), Some(&BuffValue::Number(1e308)));
        assert!(
            record
                .insert("hp", BuffValue::Number(f64::INFINITY), &grammar)
                .is_err()
        );
    }
}
