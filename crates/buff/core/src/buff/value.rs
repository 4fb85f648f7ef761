//! Buff values and the scale/merge arithmetic on them.

use core::fmt;

use crate::scan;

/// Decimal places kept when formatting folded literals.
///
/// Enough for any stat value, few enough to hide float noise such as
/// `0.12 * 100 = 12.000000000000002`.
const LITERAL_PRECISION: i32 = 10;

/// A value contributed to a buff key: a literal number or a target formula.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum BuffValue {
    Number(f64),
    Formula(String),
}

impl BuffValue {
    /// Classifies translated text: plain literals become numbers.
    pub fn from_expr(expr: impl Into<String>) -> Self {
        let expr = expr.into();
        match scan::parse_number(&expr) {
            Some(value) => Self::Number(value),
            None => Self::Formula(expr),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Formula(_) => None,
        }
    }

    pub fn as_formula(&self) -> Option<&str> {
        match self {
            Self::Formula(formula) => Some(formula),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for BuffValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => f.write_str(&format_number(*value)),
            Self::Formula(formula) => f.write_str(formula),
        }
    }
}

impl From<f64> for BuffValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Formats `value` as a clean literal.
///
/// Float noise beyond [`LITERAL_PRECISION`] decimals is dropped and exact
/// integers lose their fractional part.
///
/// ```
/// # use buff_core::buff::format_number;
/// assert_eq!(format_number(1200.0), "1200");
/// assert_eq!(format_number(0.12 * 100.0), "12");
/// assert_eq!(format_number(0.375), "0.375");
/// ```
pub fn format_number(value: f64) -> String {
    let scale = 10f64.powi(LITERAL_PRECISION);
    let rounded = if value.abs() < 1e15 {
        (value * scale).round() / scale
    } else {
        value
    };
    if rounded == 0.0 {
        return "0".to_owned();
    }
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

/// True if `expr` needs no parentheses as an operand.
pub(crate) fn is_atomic(expr: &str) -> bool {
    let expr = expr.trim();
    scan::parse_number(expr).is_some_and(|value| value >= 0.0)
        || scan::is_access_path(expr)
        || scan::call_head(expr).is_some()
        || scan::strip_outer_parens(expr).is_some()
}

/// Wraps `expr` in parentheses unless it is already atomic.
pub(crate) fn wrap(expr: &str) -> String {
    if is_atomic(expr) {
        expr.trim().to_owned()
    } else {
        format!("({})", expr.trim())
    }
}

/// Applies a scale factor to a translated expression.
///
/// Literals are multiplied immediately. A factor of 1 leaves formulas
/// untouched; any other factor wraps the formula in a multiplication.
///
/// ```
/// # use buff_core::buff::scale;
/// assert_eq!(scale("5", 100.0), "500");
/// assert_eq!(scale("x", 1.0), "x");
/// assert_eq!(scale("atk * 0.2", 100.0), "(atk * 0.2) * 100");
/// ```
pub fn scale(expr: &str, factor: f64) -> String {
    if let Some(value) = scan::parse_number(expr) {
        return format_number(value * factor);
    }
    if factor == 1.0 {
        return expr.to_owned();
    }
    format!("{} * {}", wrap(expr), format_number(factor))
}

/// Combines two contributions to the same key additively.
///
/// Numbers are summed; anything else becomes a compound `(a) + (b)` formula
/// so neither contribution is lost. A sum may overflow to infinity;
/// [`BuffRecord::insert`](super::BuffRecord::insert) refuses to store it.
pub fn merge_value(existing: &BuffValue, incoming: &BuffValue) -> BuffValue {
    match (existing, incoming) {
        (BuffValue::Number(a), BuffValue::Number(b)) => BuffValue::Number(a + b),
        (a, b) => BuffValue::Formula(format!("({a}) + ({b})")),
    }
}
