//! Pattern repair over produced target formulas.
//!
//! Upstream data is ambiguous in two systematic ways, and naive transcription
//! turns each ambiguity into a recognizable formula shape:
//!
//! - a talent table already stored in percentage points (`..._`) gets scaled
//!   by 100 a second time;
//! - an additive "increase" table is applied multiplicatively to its base.
//!
//! Each [`RepairRule`] matches exactly one of these shapes, and only when the
//! matched product is delimited so that no surrounding operator binds tighter.
//! Anything else is left untouched.

use std::borrow::Cow;

use regex::Regex;
use tracing::debug;

use crate::buff::{BuffRecord, BuffValue};
use crate::config::RepairConfig;
use crate::error::ConfigError;

/// Text allowed before a repairable product.
const LEAD: &str = r"(?P<lead>^|[(+\-,?:])(?P<ws>\s*)";
/// Text allowed after a repairable product. A `*` only counts when it is not
/// the start of `**`.
const TAIL: &str = r"(?P<tail>\s*(?:$|[)+\-,?:/]|\*(?:$|[^*])))";
/// `talent.<group>.<name>`
const TALENT: &str = r"talent\.[A-Za-z_$][\w$]*\.[A-Za-z_$][\w$]*";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum RepairKind {
    /// `talent.G.NAME_ * 100` → `talent.G.NAME_`
    PercentDoubleScale,
    /// `talent.A.B * (1 + talent.C.D / 100)` → `(talent.A.B + talent.C.D)`
    AdditiveDelta,
}

/// A structural precondition and its rewrite.
#[derive(Clone, Debug)]
pub struct RepairRule {
    kind: RepairKind,
    pattern: Regex,
    rewrite: &'static str,
}

impl RepairRule {
    pub fn percent_double_scale() -> Result<Self, ConfigError> {
        let pattern = format!(r"{LEAD}(?P<table>{TALENT}_)\s*\*\s*100(?:\.0+)?{TAIL}");
        Ok(Self {
            kind: RepairKind::PercentDoubleScale,
            pattern: Regex::new(&pattern)?,
            rewrite: "${lead}${ws}${table}${tail}",
        })
    }

    /// `delta_suffixes` are the name endings that mark an additive table.
    pub fn additive_delta(delta_suffixes: &[String]) -> Result<Self, ConfigError> {
        if delta_suffixes.is_empty() {
            return Err(ConfigError::Empty("repair.delta_suffixes"));
        }
        let suffixes = delta_suffixes
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        let delta = format!(r"talent\.[A-Za-z_$][\w$]*\.[A-Za-z_$][\w$]*?(?:{suffixes})_?");
        let pattern = format!(
            r"{LEAD}(?P<base>{TALENT})\s*\*\s*\(\s*1\s*\+\s*(?P<delta>{delta})\s*/\s*100\s*\){TAIL}"
        );
        Ok(Self {
            kind: RepairKind::AdditiveDelta,
            pattern: Regex::new(&pattern)?,
            rewrite: "${lead}${ws}(${base} + ${delta})${tail}",
        })
    }

    pub fn kind(&self) -> RepairKind {
        self.kind
    }

    pub fn matches(&self, formula: &str) -> bool {
        self.pattern.is_match(formula)
    }

    /// Rewrites every match, repeating until the formula stops changing or
    /// `max_passes` is reached.
    pub fn apply<'f>(&self, formula: &'f str, max_passes: usize) -> Cow<'f, str> {
        let mut current = Cow::Borrowed(formula);
        for _ in 0..max_passes {
            let next = match self.pattern.replace_all(&current, self.rewrite) {
                Cow::Borrowed(_) => break,
                Cow::Owned(next) => next,
            };
            if next == current.as_ref() {
                break;
            }
            current = Cow::Owned(next);
        }
        current
    }
}

/// The ordered repair rules.
#[derive(Clone, Debug)]
pub struct RepairEngine {
    rules: Vec<RepairRule>,
    max_passes: usize,
}

impl RepairEngine {
    pub fn new(config: &RepairConfig) -> Result<Self, ConfigError> {
        if config.max_passes == 0 {
            return Err(ConfigError::InvalidPasses);
        }
        Ok(Self {
            rules: vec![
                RepairRule::percent_double_scale()?,
                RepairRule::additive_delta(&config.delta_suffixes)?,
            ],
            max_passes: config.max_passes,
        })
    }

    pub fn rules(&self) -> &[RepairRule] {
        &self.rules
    }

    /// Applies every rule in order. Later rules see earlier rewrites.
    pub fn repair(&self, formula: &str) -> String {
        let mut current = formula.to_owned();
        for rule in &self.rules {
            let next = match rule.apply(&current, self.max_passes) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(next) => next,
            };
            debug!(rule = %rule.kind, before = %current, after = %next, "formula repaired");
            current = next;
        }
        current
    }

    pub fn repair_value(&self, value: &BuffValue) -> BuffValue {
        match value {
            BuffValue::Formula(formula) => BuffValue::from_expr(self.repair(formula)),
            BuffValue::Number(_) => value.clone(),
        }
    }

    /// Returns a repaired copy of `record`.
    pub fn repair_record(&self, record: &BuffRecord) -> BuffRecord {
        record.map_values(|value| self.repair_value(value))
    }
}
