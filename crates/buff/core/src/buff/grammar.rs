//! Target key grammar.
//!
//! The target runtime reads buff keys by name, and the name alone decides
//! how a value is scaled:
//!
//! | Scale class | Factor | Examples |
//! |---|---|---|
//! | [`ScaleClass::Flat`] | 1 | `atk`, `em`, `skillDmgFlat` |
//! | [`ScaleClass::PercentagePoint`] | 100 | `dmg`, `pyroDmg`, `atkPct`, `critRate` |
//! | [`ScaleClass::Ratio`] | 1 | `atkRatio`, `dmgMult` |
//!
//! Source keys (`pyro_dmg_`, `atk_`, `eleMas`, ...) are mapped onto this
//! grammar first through an alias table and then through naming
//! conventions. Any key that does not land on a recognized name is rejected.

use std::collections::{BTreeMap, BTreeSet};

/// How values for a key are scaled.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ScaleClass {
    /// Absolute value, applied as-is.
    Flat,
    /// Source ratio (0.2) shown as percentage points (20).
    PercentagePoint,
    /// Multiplier kept as a ratio.
    Ratio,
}

impl ScaleClass {
    pub const fn factor(self) -> f64 {
        match self {
            Self::Flat | Self::Ratio => 1.0,
            Self::PercentagePoint => 100.0,
        }
    }
}

/// A key-name suffix and the scale class it implies.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SuffixRule {
    pub suffix: String,
    pub class: ScaleClass,
}

impl SuffixRule {
    pub fn new(suffix: impl Into<String>, class: ScaleClass) -> Self {
        Self {
            suffix: suffix.into(),
            class,
        }
    }

    fn matches(&self, key: &str) -> bool {
        key.len() >= self.suffix.len()
            && key.is_char_boundary(key.len() - self.suffix.len())
            && key[key.len() - self.suffix.len()..].eq_ignore_ascii_case(&self.suffix)
    }
}

/// Recognized target key names for one domain variant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct KeyGrammar {
    /// Source key → target key, consulted before the naming conventions.
    pub aliases: BTreeMap<String, String>,
    /// Exact target names of flat stats.
    pub flat_stats: BTreeSet<String>,
    /// Exact target names of percentage-point stats.
    pub percent_stats: BTreeSet<String>,
    /// Suffix conventions, matched longest first and case-insensitively.
    pub suffixes: Vec<SuffixRule>,
}

impl KeyGrammar {
    /// The standard character-buff grammar.
    pub fn standard() -> Self {
        let aliases = [
            ("dmg_", "dmg"),
            ("all_dmg_", "dmg"),
            ("critRate_", "critRate"),
            ("critDMG_", "critDmg"),
            ("enerRech_", "er"),
            ("eleMas", "em"),
            ("heal_", "healBonus"),
        ];
        let suffixes = vec![
            SuffixRule::new("DmgFlat", ScaleClass::Flat),
            SuffixRule::new("Flat", ScaleClass::Flat),
            SuffixRule::new("Dmg", ScaleClass::PercentagePoint),
            SuffixRule::new("Pct", ScaleClass::PercentagePoint),
            SuffixRule::new("Ratio", ScaleClass::Ratio),
            SuffixRule::new("Mult", ScaleClass::Ratio),
        ];
        Self {
            aliases: aliases
                .into_iter()
                .map(|(source, target)| (source.to_owned(), target.to_owned()))
                .collect(),
            flat_stats: ["atk", "hp", "def", "em"].map(str::to_owned).into(),
            percent_stats: ["critRate", "critDmg", "er", "healBonus", "dmg"]
                .map(str::to_owned)
                .into(),
            suffixes,
        }
    }

    /// Scale class of a target key, or `None` if the key is outside the grammar.
    pub fn classify(&self, target_key: &str) -> Option<ScaleClass> {
        if !crate::scan::is_identifier(target_key) {
            return None;
        }
        if self.flat_stats.contains(target_key) {
            return Some(ScaleClass::Flat);
        }
        if self.percent_stats.contains(target_key) {
            return Some(ScaleClass::PercentagePoint);
        }
        self.suffixes
            .iter()
            .filter(|rule| rule.matches(target_key))
            .max_by_key(|rule| rule.suffix.len())
            .map(|rule| rule.class)
    }

    /// Scale factor of a target key.
    pub fn factor(&self, target_key: &str) -> Option<f64> {
        self.classify(target_key).map(ScaleClass::factor)
    }

    /// Maps a source key onto the target grammar.
    ///
    /// Returns `None` if the mapped name is not recognized.
    pub fn target_key(&self, source_key: &str) -> Option<String> {
        let candidate = match self.aliases.get(source_key) {
            Some(target) => target.clone(),
            None => convert_source_key(source_key),
        };
        self.classify(&candidate).map(|_| candidate)
    }
}

impl Default for KeyGrammar {
    fn default() -> Self {
        Self::standard()
    }
}

/// Applies the source naming conventions:
/// `X_dmg_` → `xDmg`, `X_dmgInc` → `xDmgFlat`, `X_` → `xPct`, otherwise
/// camel case.
fn convert_source_key(source: &str) -> String {
    if let Some(prefix) = source.strip_suffix("_dmg_") {
        format!("{}Dmg", camel_case(prefix))
    } else if let Some(prefix) = source.strip_suffix("_dmgInc") {
        format!("{}DmgFlat", camel_case(prefix))
    } else if let Some(stem) = source.strip_suffix('_') {
        format!("{}Pct", camel_case(stem))
    } else {
        camel_case(source)
    }
}

fn camel_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (index, part) in text.split('_').filter(|p| !p.is_empty()).enumerate() {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            if index == 0 {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    out
}
