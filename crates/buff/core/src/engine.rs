//! Per-unit driver: source block + parameter table → buff records.

use core::ops::Range;

use regex::Regex;
use tracing::{debug, info};

use crate::buff::BuffRecord;
use crate::config::EngineConfig;
use crate::error::{ConfigError, EngineError, Rejection};
use crate::params::ParameterTable;
use crate::repair::RepairEngine;
use crate::scan;
use crate::symbols::{SourceExpr, SymbolTable};
use crate::translate::Translator;

/// One character's worth of input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TranslationUnit {
    pub title: String,
    pub source: String,
    pub params: ParameterTable,
}

impl TranslationUnit {
    pub fn new(
        title: impl Into<String>,
        source: impl Into<String>,
        params: ParameterTable,
    ) -> Self {
        Self {
            title: title.into(),
            source: source.into(),
            params,
        }
    }
}

/// A buff section found in a source block.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Section<'t> {
    name: &'t str,
    /// The `{ ... }` object literal.
    literal: &'t str,
    team: bool,
}

/// Entry counts for one unit, for the summary log.
#[derive(Clone, Copy, Debug, Default)]
struct Tally {
    kept: usize,
    dropped: usize,
}

/// The translation engine.
///
/// Immutable after construction; share it freely across threads.
#[derive(Clone, Debug)]
pub struct Engine {
    config: EngineConfig,
    repair: RepairEngine,
    section_pattern: Regex,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let repair = RepairEngine::new(&config.repair)?;
        let names = config
            .sections
            .iter()
            .chain(std::iter::once(&config.team_section))
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");
        let section_pattern = Regex::new(&format!(r"\b(?P<name>{names})\s*:\s*\{{"))?;
        Ok(Self {
            config,
            repair,
            section_pattern,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn repairs(&self) -> &RepairEngine {
        &self.repair
    }

    /// Indexes the bindings of a source block.
    pub fn symbols(&self, source: &str) -> SymbolTable {
        SymbolTable::build(source, &self.config.table_name)
    }

    pub fn translator<'a>(
        &'a self,
        symbols: &'a SymbolTable,
        params: &'a ParameterTable,
    ) -> Translator<'a> {
        Translator::new(&self.config, symbols, params)
    }

    /// Translates a single fragment.
    pub fn translate_fragment(
        &self,
        expr: &str,
        symbols: &SymbolTable,
        params: &ParameterTable,
    ) -> Result<String, Rejection> {
        self.translator(symbols, params).translate(expr)
    }

    /// Translates every buff section of `unit`.
    ///
    /// Returns at most two records: the unit's own buffs titled with the
    /// unit title and team buffs titled `"<title> (team)"`. Records with no
    /// entries are omitted, so an empty result is a normal outcome.
    pub fn translate_unit(&self, unit: &TranslationUnit) -> Vec<BuffRecord> {
        let source = scan::strip_comments(&unit.source);
        let symbols = self.symbols(&source);
        let translator = self.translator(&symbols, &unit.params);

        let mut own = BuffRecord::new(unit.title.as_str());
        let mut team = BuffRecord::new(format!("{} (team)", unit.title));
        let mut tally = Tally::default();

        for section in self.sections(&source) {
            let Some(entries) = scan::parse_object_literal(section.literal) else {
                debug!(unit = %unit.title, section = section.name, "section body is not an object literal");
                continue;
            };
            let record = if section.team { &mut team } else { &mut own };
            for (key, value) in entries {
                if self.contribute(&translator, record, section.name, key, value) {
                    tally.kept += 1;
                } else {
                    tally.dropped += 1;
                }
            }
        }

        let records: Vec<_> = [own, team].into_iter().filter(|r| !r.is_empty()).collect();
        info!(
            unit = %unit.title,
            records = records.len(),
            kept = tally.kept,
            dropped = tally.dropped,
            "unit translated"
        );
        records
    }

    /// Translates one section entry into `record`. Returns whether it was kept.
    fn contribute(
        &self,
        translator: &Translator<'_>,
        record: &mut BuffRecord,
        section: &str,
        key: &str,
        value: &str,
    ) -> bool {
        let grammar = &self.config.grammar;
        let Some(target) = grammar.target_key(key) else {
            debug!(section, key, "key outside target grammar");
            return false;
        };
        let translated = match translator.translate_source(SourceExpr::section(value, section, key)) {
            Ok(translated) => translated,
            Err(reason) => {
                debug!(
                    section,
                    key,
                    code = reason.error_code(),
                    %reason,
                    "fragment dropped"
                );
                return false;
            }
        };
        match record.contribute(&target, &translated, grammar) {
            Ok(()) => true,
            Err(err) => {
                debug!(section, key, code = err.error_code(), %err, "contribution rejected");
                false
            }
        }
    }

    /// Finds the configured sections and marks those nested in the team
    /// section.
    fn sections<'t>(&self, source: &'t str) -> Vec<Section<'t>> {
        let mut found = Vec::new();
        let mut team_ranges: Vec<Range<usize>> = Vec::new();
        for captures in self.section_pattern.captures_iter(source) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.name("name")) else {
                continue;
            };
            let open = whole.end() - 1;
            let Some(close) = scan::find_matching_close(source, open) else {
                debug!(section = name.as_str(), "unterminated section");
                continue;
            };
            if name.as_str() == self.config.team_section {
                team_ranges.push(open..close);
                continue;
            }
            found.push((whole.start(), name.as_str(), &source[open..=close]));
        }

        found
            .into_iter()
            .map(|(start, name, literal)| Section {
                name,
                literal,
                team: team_ranges.iter().any(|range| range.contains(&start)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buff::BuffValue;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn sections_are_split_by_team_membership() {
        let engine = engine();
        let source = "premod: { a: 1 }, teamBuff: { total: { b: 2 }, premod: { c: 3 } }";
        let sections = engine.sections(source);
        let summary: Vec<_> = sections.iter().map(|s| (s.name, s.literal, s.team)).collect();
        assert_eq!(
            summary,
            vec![
                ("premod", "{ a: 1 }", false),
                ("total", "{ b: 2 }", true),
                ("premod", "{ c: 3 }", true),
            ]
        );
    }

    #[test]
    fn unit_produces_own_and_team_records() {
        let engine = engine();
        let unit = TranslationUnit::new(
            "Bennett",
            "const boost = prod(input.base.atk, dm.burst.atkBonus)\n\
             export const data = sheet({\n\
               premod: { eleMas: 40 },\n\
               teamBuff: { premod: { atk: boost } },\n\
             })",
            ParameterTable::new().with("burst.atkBonus", vec![0.56, 0.6, 1.2]),
        );
        let records = engine.translate_unit(&unit);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title(), "Bennett");
        assert_eq!(records[0].get("em"), Some(&BuffValue::Number(40.0)));
        assert_eq!(records[1].title(), "Bennett (team)");
        assert_eq!(
            records[1].get("atk"),
            Some(&BuffValue::Formula("baseAtk * 1.2".into()))
        );
    }

    #[test]
    fn nothing_translatable_yields_no_records() {
        let engine = engine();
        let unit = TranslationUnit::new(
            "Nobody",
            "premod: { cond_stacks: 3, atk: mystery }",
            ParameterTable::new(),
        );
        assert!(engine.translate_unit(&unit).is_empty());
    }

    #[test]
    fn invalid_configs_are_refused() {
        let config = EngineConfig {
            sections: Vec::new(),
            ..EngineConfig::default()
        };
        assert!(matches!(Engine::new(config), Err(ConfigError::Empty("sections"))));
    }
}
