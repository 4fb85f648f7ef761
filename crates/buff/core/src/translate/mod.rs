//! Source → target formula translation.
//!
//! [`Translator`] walks one source expression recursively:
//!
//! 1. depth check, then redundant outer parentheses
//! 2. numeric literals pass through
//! 3. bare identifiers: symbol-table bindings are inlined, named constants
//!    folded, allow-listed target names kept
//! 4. access paths ([`inputs`]): parameter table, mapped inputs, team counters
//! 5. recognized call forms ([`forms`])
//! 6. everything else through the generic inline path ([`inline`])
//!
//! The accepted result always passes the safety gate. Failures are
//! [`Rejection`]s and carry no partial output.

mod forms;
mod inline;
mod inputs;

pub use forms::CallForm;

use tracing::trace;

use crate::buff::{format_number, wrap};
use crate::config::EngineConfig;
use crate::error::Rejection;
use crate::gate;
use crate::params::ParameterTable;
use crate::scan;
use crate::symbols::{SourceExpr, SymbolTable};

/// Tokens a target formula can never contain.
const FORBIDDEN_TOKENS: &[&str] = &["{", "}", ";", "=>", "`"];

/// Names currently being inlined by one translation call.
#[derive(Clone, Debug, Default)]
pub struct InliningStack {
    names: Vec<String>,
}

impl InliningStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `name`, failing if it is already being expanded.
    pub fn enter(&mut self, name: &str) -> Result<(), Rejection> {
        if self.contains(name) {
            return Err(Rejection::Cycle(name.to_owned()));
        }
        self.names.push(name.to_owned());
        Ok(())
    }

    pub fn leave(&mut self) {
        self.names.pop();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn depth(&self) -> usize {
        self.names.len()
    }
}

/// Translates fragments of one unit against its symbols and parameters.
///
/// Holds only shared borrows; every call builds its own [`InliningStack`].
#[derive(Clone, Copy, Debug)]
pub struct Translator<'a> {
    config: &'a EngineConfig,
    symbols: &'a SymbolTable,
    params: &'a ParameterTable,
}

impl<'a> Translator<'a> {
    pub fn new(
        config: &'a EngineConfig,
        symbols: &'a SymbolTable,
        params: &'a ParameterTable,
    ) -> Self {
        Self {
            config,
            symbols,
            params,
        }
    }

    /// Translates a raw fragment.
    pub fn translate(&self, expr: &str) -> Result<String, Rejection> {
        self.translate_source(SourceExpr::fragment(expr))
    }

    /// Translates `source` and runs the result through the safety gate.
    pub fn translate_source(&self, source: SourceExpr<'_>) -> Result<String, Rejection> {
        let mut stack = InliningStack::new();
        let translated = self.node(source.text, &mut stack, 0)?;
        trace!(origin = ?source.origin, %translated, "fragment translated");
        self.accept(translated)
    }

    fn accept(&self, translated: String) -> Result<String, Rejection> {
        let trimmed = translated.trim();
        if trimmed.is_empty() {
            return Err(Rejection::malformed(&translated));
        }
        if let Some(token) = FORBIDDEN_TOKENS.iter().find(|t| trimmed.contains(**t)) {
            return Err(Rejection::UnsafeOutput((*token).to_owned()));
        }
        self.gate(trimmed.to_owned())
    }

    fn gate(&self, translated: String) -> Result<String, Rejection> {
        match gate::first_disallowed_identifier(&translated, &self.config.allow) {
            Some(word) => Err(Rejection::UnsafeOutput(word.to_owned())),
            None => Ok(translated),
        }
    }

    /// Translates a sub-expression whose result is used on its own.
    fn checked(
        &self,
        expr: &str,
        stack: &mut InliningStack,
        depth: usize,
    ) -> Result<String, Rejection> {
        let translated = self.node(expr, stack, depth)?;
        self.gate(translated)
    }

    fn node(&self, expr: &str, stack: &mut InliningStack, depth: usize) -> Result<String, Rejection> {
        if depth > self.config.max_depth {
            return Err(Rejection::DepthExceeded(self.config.max_depth));
        }
        let expr = expr.trim();
        if expr.is_empty() || !scan::is_balanced(expr) {
            return Err(Rejection::malformed(expr));
        }

        if let Some(inner) = scan::strip_outer_parens(expr) {
            let translated = self.node(inner, stack, depth + 1)?;
            return Ok(wrap(&translated));
        }
        if scan::parse_number(expr).is_some() {
            return Ok(expr.to_owned());
        }
        if scan::is_identifier(expr) {
            return self.identifier(expr, stack, depth);
        }
        if scan::is_access_path(expr) {
            return self.path(expr);
        }
        if let Some((callee, open)) = scan::call_head(expr) {
            if let Ok(form) = callee.parse::<CallForm>() {
                return self.call(form, expr, open, stack, depth);
            }
        }
        self.inline(expr, stack, depth)
    }

    fn identifier(
        &self,
        name: &str,
        stack: &mut InliningStack,
        depth: usize,
    ) -> Result<String, Rejection> {
        if let Some(bound) = self.symbols.source(name) {
            stack.enter(name)?;
            trace!(origin = ?bound.origin, depth = stack.depth(), "inlining binding");
            let inlined = self.node(bound.text, stack, depth + 1);
            stack.leave();
            return inlined;
        }
        if let Some(value) = self.config.constants.get(name) {
            return Ok(format_number(*value));
        }
        if self.config.allow.contains(name) {
            return Ok(name.to_owned());
        }
        Err(Rejection::unrecognized(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (EngineConfig, SymbolTable, ParameterTable) {
        let symbols = SymbolTable::build(
            "const hit = dm.skill.hit1\nconst loopA = loopB\nconst loopB = loopA\nconst selfRef = selfRef + 1",
            "dm",
        );
        let params = ParameterTable::new()
            .with("skill.hit1", 12.0)
            .with("skill.scaling", vec![0.5, 0.75]);
        (EngineConfig::default(), symbols, params)
    }

    #[test]
    fn literals_and_constants() {
        let (config, symbols, params) = fixture();
        let t = Translator::new(&config, &symbols, &params);
        assert_eq!(t.translate("1.5").unwrap(), "1.5");
        assert_eq!(t.translate("naught").unwrap(), "0");
        assert_eq!(t.translate("one").unwrap(), "1");
    }

    #[test]
    fn bindings_are_inlined() {
        let (config, symbols, params) = fixture();
        let t = Translator::new(&config, &symbols, &params);
        assert_eq!(t.translate("hit").unwrap(), "12");
        assert_eq!(t.translate("hit * atk").unwrap(), "12 * atk");
    }

    #[test]
    fn cycles_fail_closed() {
        let (config, symbols, params) = fixture();
        let t = Translator::new(&config, &symbols, &params);
        assert_eq!(t.translate("loopA"), Err(Rejection::Cycle("loopA".into())));
        assert_eq!(t.translate("selfRef"), Err(Rejection::Cycle("selfRef".into())));
    }

    #[test]
    fn depth_is_bounded() {
        let (config, symbols, params) = fixture();
        let config = EngineConfig {
            max_depth: 3,
            ..config
        };
        let t = Translator::new(&config, &symbols, &params);
        assert_eq!(t.translate("((((1))))"), Err(Rejection::DepthExceeded(3)));
        assert_eq!(t.translate("((1))").unwrap(), "1");
    }

    #[test]
    fn unknown_names_are_unrecognized() {
        let (config, symbols, params) = fixture();
        let t = Translator::new(&config, &symbols, &params);
        let err = t.translate("condAfterBurst").unwrap_err();
        assert_eq!(err, Rejection::Unrecognized("condAfterBurst".into()));
    }

    #[test]
    fn malformed_input_is_rejected() {
        let (config, symbols, params) = fixture();
        let t = Translator::new(&config, &symbols, &params);
        assert!(matches!(t.translate("sum(1, 2"), Err(Rejection::Malformed(_))));
        assert!(matches!(t.translate("   "), Err(Rejection::Malformed(_))));
    }

    #[test]
    fn parenthesized_results_are_rewrapped() {
        let (config, symbols, params) = fixture();
        let t = Translator::new(&config, &symbols, &params);
        assert_eq!(t.translate("(atk + hit)").unwrap(), "(atk + 12)");
        assert_eq!(t.translate("(hit)").unwrap(), "12");
    }

    #[test]
    fn inlining_stack_tracks_entries() {
        let mut stack = InliningStack::new();
        stack.enter("a").unwrap();
        assert!(stack.enter("a").is_err());
        stack.leave();
        assert_eq!(stack.depth(), 0);
        assert!(stack.enter("a").is_ok());
    }
}
