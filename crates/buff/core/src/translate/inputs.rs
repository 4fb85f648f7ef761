//! Access paths: parameter-table reads, mapped inputs and team counters.

use tracing::trace;

use super::Translator;
use crate::buff::format_number;
use crate::error::Rejection;
use crate::params::{AccessPath, ParamValue, Step};

impl Translator<'_> {
    pub(super) fn path(&self, expr: &str) -> Result<String, Rejection> {
        let canonical: String = expr.split_whitespace().collect();
        if let Some(target) = self.config.inputs.get(&canonical) {
            return Ok(target.clone());
        }

        let Some(path) = AccessPath::parse(&canonical) else {
            return Err(Rejection::unrecognized(expr));
        };
        if path.root == self.config.table_name {
            let table_path = self.table_path(&path).ok_or_else(|| Rejection::not_found(expr))?;
            return self
                .params
                .resolve_path(&table_path)
                .map(format_number)
                .ok_or_else(|| Rejection::not_found(expr));
        }
        if path.root == self.config.team_counter_root {
            trace!(path = %canonical, "team counter replaced by fallback");
            return Ok(format_number(self.config.team_count_fallback));
        }
        if self.config.allow.contains(&path.root) {
            return Ok(canonical);
        }
        Err(Rejection::unrecognized(expr))
    }

    /// True if `expr` reads a team counter, directly or through a binding.
    ///
    /// The fallback count stands in for unknown team state; comparing against
    /// it would decide a condition the target cannot express.
    pub(super) fn reads_team_counter(&self, expr: &str) -> bool {
        let canonical: String = self.dereference(expr.trim()).split_whitespace().collect();
        AccessPath::parse(&canonical)
            .is_some_and(|path| path.root == self.config.team_counter_root)
    }

    /// Raw parameter node behind a `dm.*` path, for tier selection.
    pub(super) fn table_node(&self, expr: &str) -> Option<&ParamValue> {
        let path = AccessPath::parse(expr)?;
        if path.root != self.config.table_name {
            return None;
        }
        self.params.node(&self.table_path(&path)?.full_steps())
    }

    /// Drops the table root: `dm.skill.hit1` → `skill.hit1`.
    fn table_path(&self, path: &AccessPath) -> Option<AccessPath> {
        let (first, rest) = path.steps.split_first()?;
        let Step::Field(root) = first else {
            return None;
        };
        Some(AccessPath {
            root: root.clone(),
            steps: rest.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::error::Rejection;
    use crate::params::ParameterTable;
    use crate::symbols::SymbolTable;
    use crate::translate::Translator;

    fn params() -> ParameterTable {
        ParameterTable::new()
            .with("skill.hit1", 0.12)
            .with("burst.dmg", vec![1.0, 1.5, 2.25])
    }

    #[test]
    fn table_paths_resolve_to_literals() {
        let config = EngineConfig::default();
        let symbols = SymbolTable::new();
        let params = params();
        let t = Translator::new(&config, &symbols, &params);
        assert_eq!(t.translate("dm.skill.hit1").unwrap(), "0.12");
        assert_eq!(t.translate("dm.burst.dmg").unwrap(), "2.25");
        assert_eq!(t.translate("dm.burst.dmg[0]").unwrap(), "1");
        assert!(matches!(
            t.translate("dm.skill.missing"),
            Err(Rejection::NotFound(_))
        ));
        assert!(matches!(t.translate("dm"), Err(Rejection::Unrecognized(_))));
    }

    #[test]
    fn inputs_map_onto_target_names() {
        let config = EngineConfig::default();
        let symbols = SymbolTable::new();
        let params = params();
        let t = Translator::new(&config, &symbols, &params);
        assert_eq!(t.translate("input.total.atk").unwrap(), "atk");
        assert_eq!(t.translate("input.total.eleMas").unwrap(), "em");
        assert_eq!(t.translate("input.constellation").unwrap(), "constellation");
        assert!(matches!(
            t.translate("input.activeCharKey"),
            Err(Rejection::Unrecognized(_))
        ));
    }

    #[test]
    fn team_counters_use_the_fallback() {
        let config = EngineConfig::default();
        let symbols = SymbolTable::new();
        let params = params();
        let t = Translator::new(&config, &symbols, &params);
        assert_eq!(t.translate("tally.pyro").unwrap(), "2");

        let config = EngineConfig::default().with_team_count_fallback(3.0);
        let t = Translator::new(&config, &symbols, &params);
        assert_eq!(t.translate("tally.mondstadt").unwrap(), "3");
    }

    #[test]
    fn target_paths_pass_through() {
        let config = EngineConfig::default();
        let symbols = SymbolTable::new();
        let params = params();
        let t = Translator::new(&config, &symbols, &params);
        assert_eq!(t.translate("talent.skill.hit1").unwrap(), "talent.skill.hit1");
    }
}
