use std::collections::BTreeMap;

use crate::buff::KeyGrammar;
use crate::error::ConfigError;
use crate::gate::AllowList;
use crate::scan;

/// Tunables for the pattern repair pass.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct RepairConfig {
    /// Name endings that mark a talent table as an additive delta.
    pub delta_suffixes: Vec<String>,
    /// Upper bound on rewrite passes per rule.
    pub max_passes: usize,
}

impl RepairConfig {
    pub const DEFAULT_MAX_PASSES: usize = 8;
    pub const DEFAULT_DELTA_SUFFIXES: &'static [&'static str] = &["Increase", "Inc", "Delta", "Bonus"];

    pub fn new() -> Self {
        Self {
            delta_suffixes: Self::DEFAULT_DELTA_SUFFIXES
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            max_passes: Self::DEFAULT_MAX_PASSES,
        }
    }
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine configuration: dialect vocabulary and runtime-tunable limits.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct EngineConfig {
    /// Root name of the parameter table in source text (`dm.skill.hit1`).
    pub table_name: String,
    /// Recursion cap for a single translation.
    pub max_depth: usize,
    /// Root of team-composition counters (`tally.pyro`).
    pub team_counter_root: String,
    /// Value substituted for every team-composition counter.
    pub team_count_fallback: f64,
    /// Lookup-table key that marks the active case.
    pub lookup_on_key: String,
    /// Object-literal sections whose entries become buffs.
    pub sections: Vec<String>,
    /// Wrapper whose nested sections apply to the whole team.
    pub team_section: String,
    /// Named source constants.
    pub constants: BTreeMap<String, f64>,
    /// Source input path → target identifier.
    pub inputs: BTreeMap<String, String>,
    pub allow: AllowList,
    pub grammar: KeyGrammar,
    pub repair: RepairConfig,
}

impl EngineConfig {
    // ===== runtime-tunable defaults =====
    pub const DEFAULT_TABLE_NAME: &'static str = "dm";
    pub const DEFAULT_MAX_DEPTH: usize = 20;
    pub const DEFAULT_TEAM_COUNTER_ROOT: &'static str = "tally";
    pub const DEFAULT_TEAM_COUNT_FALLBACK: f64 = 2.0;
    pub const DEFAULT_LOOKUP_ON_KEY: &'static str = "on";
    pub const DEFAULT_SECTIONS: &'static [&'static str] = &["premod", "total"];
    pub const DEFAULT_TEAM_SECTION: &'static str = "teamBuff";

    const DEFAULT_CONSTANTS: &'static [(&'static str, f64)] = &[("naught", 0.0), ("one", 1.0)];

    const DEFAULT_INPUTS: &'static [(&'static str, &'static str)] = &[
        ("input.total.atk", "atk"),
        ("input.total.hp", "hp"),
        ("input.total.def", "def"),
        ("input.total.eleMas", "em"),
        ("input.total.enerRech_", "er"),
        ("input.total.critRate_", "critRate"),
        ("input.total.critDMG_", "critDmg"),
        ("input.total.heal_", "healBonus"),
        ("input.base.atk", "baseAtk"),
        ("input.base.hp", "baseHp"),
        ("input.base.def", "baseDef"),
        ("input.constellation", "constellation"),
        ("input.asc", "ascension"),
        ("input.lvl", "level"),
        ("input.total.skillIndex", "skillRank"),
        ("input.total.burstIndex", "burstRank"),
        ("input.total.autoIndex", "autoRank"),
    ];

    pub fn new() -> Self {
        Self {
            table_name: Self::DEFAULT_TABLE_NAME.to_owned(),
            max_depth: Self::DEFAULT_MAX_DEPTH,
            team_counter_root: Self::DEFAULT_TEAM_COUNTER_ROOT.to_owned(),
            team_count_fallback: Self::DEFAULT_TEAM_COUNT_FALLBACK,
            lookup_on_key: Self::DEFAULT_LOOKUP_ON_KEY.to_owned(),
            sections: Self::DEFAULT_SECTIONS.iter().map(|s| (*s).to_owned()).collect(),
            team_section: Self::DEFAULT_TEAM_SECTION.to_owned(),
            constants: Self::DEFAULT_CONSTANTS
                .iter()
                .map(|(name, value)| ((*name).to_owned(), *value))
                .collect(),
            inputs: Self::DEFAULT_INPUTS
                .iter()
                .map(|(path, target)| ((*path).to_owned(), (*target).to_owned()))
                .collect(),
            allow: AllowList::standard(),
            grammar: KeyGrammar::standard(),
            repair: RepairConfig::new(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_team_count_fallback(mut self, fallback: f64) -> Self {
        self.team_count_fallback = fallback;
        self
    }

    /// Checks that every name is usable and every limit is sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        identifier("table_name", &self.table_name)?;
        identifier("team_counter_root", &self.team_counter_root)?;
        identifier("lookup_on_key", &self.lookup_on_key)?;
        identifier("team_section", &self.team_section)?;

        if self.sections.is_empty() {
            return Err(ConfigError::Empty("sections"));
        }
        for section in &self.sections {
            identifier("sections", section)?;
        }
        for name in self.constants.keys() {
            identifier("constants", name)?;
        }

        if self.max_depth == 0 {
            return Err(ConfigError::InvalidDepth);
        }
        if !self.team_count_fallback.is_finite() || self.team_count_fallback < 0.0 {
            return Err(ConfigError::InvalidFallback(self.team_count_fallback));
        }

        if self.allow.is_empty() {
            return Err(ConfigError::Empty("allow"));
        }
        // Mapped inputs are emitted verbatim, so they must survive the gate.
        for target in self.inputs.values() {
            if !scan::is_identifier(target) || !self.allow.contains(target) {
                return Err(ConfigError::InvalidIdentifier {
                    field: "inputs",
                    value: target.clone(),
                });
            }
        }

        if self.repair.delta_suffixes.is_empty() {
            return Err(ConfigError::Empty("repair.delta_suffixes"));
        }
        for suffix in &self.repair.delta_suffixes {
            identifier("repair.delta_suffixes", suffix)?;
        }
        if self.repair.max_passes == 0 {
            return Err(ConfigError::InvalidPasses);
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn identifier(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if scan::is_identifier(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            field,
            value: value.to_owned(),
        })
    }
}
