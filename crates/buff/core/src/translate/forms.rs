//! Recognized source call forms.

use tracing::debug;

use super::{InliningStack, Translator};
use crate::buff::{format_number, is_atomic, wrap};
use crate::error::{EngineError, Rejection};
use crate::scan;
use crate::symbols::SourceExpr;

/// Upper bound on aggregate arguments read from one call.
const MAX_AGGREGATE_ARGS: usize = 64;

/// Helpers that build a lookup table from an index range.
const RANGE_KEY_MAP: &str = "objKeyMap";
const RANGE_KEY_VALUE_MAP: &str = "objKeyValMap";
const RANGE: &str = "range";

/// The closed set of source call forms with a dedicated rule.
///
/// Any other callee goes through the generic inline path.
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
#[strum(serialize_all = "camelCase")]
pub enum CallForm {
    // Aggregates
    Sum,
    Prod,
    Min,
    Max,

    // Threshold branches
    GreaterEq,
    LessThan,
    Threshold,

    // Equality branches
    Equal,
    EqualStr,
    Unequal,

    Lookup,
    Subscript,

    // Annotation wrappers
    Constant,
    Percent,
    Pct,
    InfoMut,
    Prio,
}

impl CallForm {
    /// Arguments read from the call; the rest is ignored.
    pub const fn max_args(self) -> usize {
        match self {
            Self::Sum | Self::Prod | Self::Min | Self::Max => MAX_AGGREGATE_ARGS,
            Self::GreaterEq
            | Self::LessThan
            | Self::Threshold
            | Self::Equal
            | Self::EqualStr
            | Self::Unequal => 4,
            Self::Lookup => 3,
            Self::Subscript => 2,
            Self::Constant | Self::Percent | Self::Pct | Self::InfoMut | Self::Prio => 1,
        }
    }

    pub const fn is_aggregate(self) -> bool {
        matches!(self, Self::Sum | Self::Prod | Self::Min | Self::Max)
    }

    pub const fn is_wrapper(self) -> bool {
        matches!(
            self,
            Self::Constant | Self::Percent | Self::Pct | Self::InfoMut | Self::Prio
        )
    }
}

impl Translator<'_> {
    /// Dispatches the call `expr` whose argument list opens at `open`.
    pub(super) fn call(
        &self,
        form: CallForm,
        expr: &str,
        open: usize,
        stack: &mut InliningStack,
        depth: usize,
    ) -> Result<String, Rejection> {
        let args = scan::extract_call_arguments(expr, open, form.max_args());
        match form {
            CallForm::Sum | CallForm::Prod | CallForm::Min | CallForm::Max => {
                self.aggregate(form, &args, stack, depth)
            }
            CallForm::GreaterEq | CallForm::LessThan | CallForm::Threshold => {
                self.threshold(form, &args, stack, depth)
            }
            CallForm::Equal | CallForm::EqualStr | CallForm::Unequal => {
                self.equality(form, &args, stack, depth)
            }
            CallForm::Lookup => self.lookup(expr, &args, stack, depth),
            CallForm::Subscript => self.subscript(expr, &args, stack, depth),
            CallForm::Constant
            | CallForm::Percent
            | CallForm::Pct
            | CallForm::InfoMut
            | CallForm::Prio => {
                let inner = args.first().ok_or_else(|| Rejection::malformed(expr))?;
                self.node(inner, stack, depth + 1)
            }
        }
    }

    /// Sum, product, min and max over the arguments that translate.
    ///
    /// Untranslatable arguments are treated as absent. If none translate the
    /// aggregate itself fails.
    fn aggregate(
        &self,
        form: CallForm,
        args: &[&str],
        stack: &mut InliningStack,
        depth: usize,
    ) -> Result<String, Rejection> {
        let mut parts = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
            let source = SourceExpr::argument(arg, form.as_ref(), index);
            match self.checked(source.text, stack, depth + 1) {
                Ok(part) => parts.push(part),
                Err(reason) => debug!(
                    origin = ?source.origin,
                    code = reason.error_code(),
                    %reason,
                    "aggregate argument dropped"
                ),
            }
        }

        if parts.is_empty() {
            return Err(Rejection::EmptyAggregate(form.to_string()));
        }
        if let Some(literals) = parts
            .iter()
            .map(|p| scan::parse_number(p))
            .collect::<Option<Vec<f64>>>()
        {
            return Ok(format_number(fold_literals(form, &literals)));
        }
        if parts.len() == 1 {
            return Ok(parts.remove(0));
        }

        Ok(match form {
            CallForm::Sum => join_operands(&parts, " + "),
            CallForm::Prod => join_operands(&parts, " * "),
            CallForm::Min => format!("Math.min({})", parts.join(", ")),
            _ => format!("Math.max({})", parts.join(", ")),
        })
    }

    /// `greaterEq(v, t, pass, fail?)`, `lessThan(...)`, `threshold(...)`.
    fn threshold(
        &self,
        form: CallForm,
        args: &[&str],
        stack: &mut InliningStack,
        depth: usize,
    ) -> Result<String, Rejection> {
        let [value, threshold, pass, rest @ ..] = args else {
            return Err(Rejection::malformed(&args.join(", ")));
        };
        let pass = self.checked(pass, stack, depth + 1)?;
        if self.reads_team_counter(value) || self.reads_team_counter(threshold) {
            debug!(form = %form, "team counter compared, assuming branch taken");
            return Ok(pass);
        }
        let Some((value, threshold)) =
            self.comparable(form, value, threshold, stack, depth)
        else {
            return Ok(pass);
        };
        let Some(fail) = self.fail_branch(form, rest.first(), stack, depth) else {
            return Ok(pass);
        };

        if let (Some(v), Some(t)) = (scan::parse_number(&value), scan::parse_number(&threshold)) {
            let holds = match form {
                CallForm::LessThan => v < t,
                _ => v >= t,
            };
            return Ok(if holds { pass } else { fail });
        }
        let op = match form {
            CallForm::LessThan => "<",
            _ => ">=",
        };
        Ok(format!(
            "({} {op} {} ? {pass} : {fail})",
            wrap(&value),
            wrap(&threshold)
        ))
    }

    /// `equal(l, r, pass, fail?)`, `equalStr(...)`, `unequal(...)`.
    ///
    /// Only a recognized target input compared against a number becomes a
    /// real conditional.
    fn equality(
        &self,
        form: CallForm,
        args: &[&str],
        stack: &mut InliningStack,
        depth: usize,
    ) -> Result<String, Rejection> {
        let [left, right, pass, rest @ ..] = args else {
            return Err(Rejection::malformed(&args.join(", ")));
        };
        let pass = self.checked(pass, stack, depth + 1)?;
        if self.reads_team_counter(left) || self.reads_team_counter(right) {
            debug!(form = %form, "team counter compared, assuming branch taken");
            return Ok(pass);
        }
        if form == CallForm::EqualStr || scan::is_string_literal(right) {
            debug!(form = %form, "string comparison assumed to hold");
            return Ok(pass);
        }
        let Some((left, right)) = self.comparable(form, left, right, stack, depth) else {
            return Ok(pass);
        };
        let left_is_input = scan::is_identifier(&left) && self.config.allow.contains(&left);
        let literal_left = scan::parse_number(&left);
        let Some(r) = scan::parse_number(&right) else {
            debug!(form = %form, "non-numeric right side, assuming branch taken");
            return Ok(pass);
        };
        if literal_left.is_none() && !left_is_input {
            debug!(form = %form, "left side is not an input, assuming branch taken");
            return Ok(pass);
        }
        let Some(fail) = self.fail_branch(form, rest.first(), stack, depth) else {
            return Ok(pass);
        };

        if let Some(l) = literal_left {
            let holds = match form {
                CallForm::Unequal => l != r,
                _ => l == r,
            };
            return Ok(if holds { pass } else { fail });
        }
        let op = match form {
            CallForm::Unequal => "!=",
            _ => "==",
        };
        Ok(format!("({left} {op} {} ? {pass} : {fail})", format_number(r)))
    }

    /// Translates both sides of a comparison, or `None` if either side is
    /// not representable.
    fn comparable(
        &self,
        form: CallForm,
        left: &str,
        right: &str,
        stack: &mut InliningStack,
        depth: usize,
    ) -> Option<(String, String)> {
        let translate = |side: &str, stack: &mut InliningStack| {
            self.checked(side, stack, depth + 1)
                .inspect_err(|reason| {
                    debug!(
                        form = %form,
                        code = reason.error_code(),
                        %reason,
                        "condition not representable, assuming branch taken"
                    );
                })
                .ok()
        };
        let left = translate(left, stack)?;
        let right = translate(right, stack)?;
        Some((left, right))
    }

    /// The optional fail branch, defaulting to `0`.
    fn fail_branch(
        &self,
        form: CallForm,
        fail: Option<&&str>,
        stack: &mut InliningStack,
        depth: usize,
    ) -> Option<String> {
        let Some(fail) = fail else {
            return Some("0".to_owned());
        };
        self.checked(fail, stack, depth + 1)
            .inspect_err(|reason| {
                debug!(form = %form, %reason, "fail branch dropped, assuming branch taken");
            })
            .ok()
    }

    /// `lookup(selector, table, default?)`: the best case of the table.
    fn lookup(
        &self,
        expr: &str,
        args: &[&str],
        stack: &mut InliningStack,
        depth: usize,
    ) -> Result<String, Rejection> {
        let table = args.get(1).ok_or_else(|| Rejection::malformed(expr))?;
        let table = self.dereference(table);

        if let Some(entries) = scan::parse_object_literal(table) {
            let chosen = entries
                .iter()
                .find(|(key, _)| *key == self.config.lookup_on_key)
                .or_else(|| {
                    entries
                        .iter()
                        .filter_map(|entry| scan::parse_number(entry.0).map(|k| (k, entry)))
                        .max_by(|a, b| a.0.total_cmp(&b.0))
                        .map(|(_, entry)| entry)
                })
                .ok_or_else(|| Rejection::unrecognized(table))?;
            return self.node(chosen.1, stack, depth + 1);
        }

        if let Some((callee, open)) = scan::call_head(table) {
            if callee == RANGE_KEY_MAP || callee == RANGE_KEY_VALUE_MAP {
                return self.range_lookup(callee, table, open, stack, depth);
            }
        }
        Err(Rejection::unrecognized(table))
    }

    /// `objKeyMap(range(lo, hi), v => body)` and
    /// `objKeyValMap(range(lo, hi), v => [key, body])`, evaluated at `hi`.
    fn range_lookup(
        &self,
        callee: &str,
        table: &str,
        open: usize,
        stack: &mut InliningStack,
        depth: usize,
    ) -> Result<String, Rejection> {
        let args = scan::extract_call_arguments(table, open, 2);
        let [range, mapper] = args[..] else {
            return Err(Rejection::malformed(table));
        };
        let hi = self.range_max(range, stack, depth)?;
        let (param, body) = split_arrow(mapper).ok_or_else(|| Rejection::unrecognized(mapper))?;

        let body = if callee == RANGE_KEY_VALUE_MAP {
            let pair = scan::bracketed_body(body, b'[')
                .map(|inner| scan::split_top_level(inner, ','))
                .unwrap_or_default();
            *pair.get(1).ok_or_else(|| Rejection::unrecognized(body))?
        } else {
            body
        };
        let substituted = scan::substitute_identifier(body, param, &hi);
        self.node(&substituted, stack, depth + 1)
    }

    /// The literal upper bound of `range(lo, hi)`.
    fn range_max(
        &self,
        range: &str,
        stack: &mut InliningStack,
        depth: usize,
    ) -> Result<String, Rejection> {
        let (callee, open) = scan::call_head(range).ok_or_else(|| Rejection::unrecognized(range))?;
        if callee != RANGE {
            return Err(Rejection::unrecognized(range));
        }
        let bounds = scan::extract_call_arguments(range, open, 2);
        let hi = bounds.last().ok_or_else(|| Rejection::malformed(range))?;
        let hi = self.node(hi, stack, depth + 1)?;
        match scan::parse_number(&hi) {
            Some(value) => Ok(format_number(value)),
            None => Err(Rejection::unrecognized(range)),
        }
    }

    /// `subscript(selector, tiers)`: the last present numeric tier.
    fn subscript(
        &self,
        expr: &str,
        args: &[&str],
        stack: &mut InliningStack,
        depth: usize,
    ) -> Result<String, Rejection> {
        let tiers = args.get(1).ok_or_else(|| Rejection::malformed(expr))?;
        let tiers = self.dereference(tiers);

        if let Some(node) = self.table_node(tiers) {
            return node
                .last_number()
                .map(format_number)
                .ok_or_else(|| Rejection::not_found(tiers));
        }
        if let Some(body) = scan::bracketed_body(tiers, b'[') {
            return scan::split_top_level(body, ',')
                .into_iter()
                .rev()
                .find_map(|item| {
                    self.node(item, stack, depth + 1)
                        .ok()
                        .filter(|t| scan::parse_number(t).is_some())
                })
                .ok_or_else(|| Rejection::not_found(tiers));
        }
        Err(Rejection::unrecognized(tiers))
    }

    /// Follows a bare binding name to its bound text, one level deep.
    pub(super) fn dereference<'s>(&'s self, text: &'s str) -> &'s str {
        if scan::is_identifier(text) {
            if let Some(bound) = self.symbols.get(text) {
                return bound;
            }
        }
        text
    }
}

fn fold_literals(form: CallForm, values: &[f64]) -> f64 {
    match form {
        CallForm::Prod => values.iter().product(),
        CallForm::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        CallForm::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        _ => values.iter().sum(),
    }
}

fn join_operands(parts: &[String], op: &str) -> String {
    parts
        .iter()
        .map(|part| {
            if is_atomic(part) {
                part.clone()
            } else {
                format!("({part})")
            }
        })
        .collect::<Vec<_>>()
        .join(op)
}

/// Splits `v => body` (or `(v) => body`) into parameter and body.
fn split_arrow(text: &str) -> Option<(&str, &str)> {
    let at = text.find("=>")?;
    let param = text[..at].trim();
    let param = scan::strip_outer_parens(param).unwrap_or(param);
    scan::is_identifier(param).then(|| (param, text[at + 2..].trim()))
}
