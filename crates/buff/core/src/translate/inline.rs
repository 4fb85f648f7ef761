//! Generic inline path for arithmetic and ternary expressions.
//!
//! Operators, literals and strings are copied as-is. Identifiers and access
//! paths are translated in place, and so are recognized call forms found
//! mid-expression. An unrecognized callee is copied verbatim and its
//! arguments are scanned like any other text; the safety gate then decides
//! whether the result is usable.

use super::{CallForm, InliningStack, Translator};
use crate::buff::wrap;
use crate::error::Rejection;
use crate::scan;

impl Translator<'_> {
    pub(super) fn inline(
        &self,
        expr: &str,
        stack: &mut InliningStack,
        depth: usize,
    ) -> Result<String, Rejection> {
        let bytes = expr.as_bytes();
        let mut out = String::with_capacity(expr.len());
        let mut i = 0usize;
        while i < bytes.len() {
            let b = bytes[i];

            if matches!(b, b'\'' | b'"' | b'`') {
                let end = scan::skip_string(bytes, i).ok_or_else(|| Rejection::malformed(expr))?;
                out.push_str(&expr[i..end]);
                i = end;
                continue;
            }

            let starts_number =
                b.is_ascii_digit() || (b == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit));
            if starts_number {
                let mut end = i + scan::number_len(expr, i).max(1);
                while end < bytes.len() && scan::is_ident_continue(bytes[end]) {
                    end += 1;
                }
                out.push_str(&expr[i..end]);
                i = end;
                continue;
            }

            if scan::is_ident_start(b) {
                if scan::previous_non_space(bytes, i) == Some(b'.') {
                    // Member of a computed value, e.g. `f(x).length`.
                    let len = scan::identifier_len(expr, i);
                    out.push_str(&expr[i..i + len]);
                    i += len;
                    continue;
                }

                let len = scan::access_path_len(expr, i);
                let path = &expr[i..i + len];
                let after = skip_spaces(bytes, i + len);
                if bytes.get(after) == Some(&b'(') {
                    match path.parse::<CallForm>() {
                        Ok(form) => {
                            let close = scan::find_matching_close(expr, after)
                                .ok_or_else(|| Rejection::malformed(expr))?;
                            let call = &expr[i..=close];
                            let translated = self.call(form, call, after - i, stack, depth + 1)?;
                            out.push_str(&wrap(&translated));
                            i = close + 1;
                        }
                        Err(_) => {
                            out.push_str(path);
                            i += len;
                        }
                    }
                    continue;
                }

                let translated = if scan::is_identifier(path) {
                    self.identifier(path, stack, depth + 1)?
                } else {
                    self.path(path)?
                };
                out.push_str(&wrap(&translated));
                i += len;
                continue;
            }

            let ch_len = scan::utf8_len(b);
            out.push_str(&expr[i..(i + ch_len).min(bytes.len())]);
            i += ch_len;
        }

        let out = out.trim().to_owned();
        if out.is_empty() {
            return Err(Rejection::malformed(expr));
        }
        self.gate(out)
    }
}

fn skip_spaces(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::error::Rejection;
    use crate::params::ParameterTable;
    use crate::symbols::SymbolTable;
    use crate::translate::Translator;

    fn translate_with(expr: &str, source: &str) -> Result<String, Rejection> {
        let config = EngineConfig::default();
        let symbols = SymbolTable::build(source, "dm");
        let params = ParameterTable::new()
            .with("skill.hit1", 12.0)
            .with("burst.bonus", 0.3);
        Translator::new(&config, &symbols, &params).translate(expr)
    }

    fn translate(expr: &str) -> Result<String, Rejection> {
        translate_with(expr, "")
    }

    #[test]
    fn arithmetic_is_copied_around_translated_paths() {
        assert_eq!(
            translate("input.total.atk * dm.burst.bonus + 100").unwrap(),
            "atk * 0.3 + 100"
        );
        assert_eq!(translate("-dm.skill.hit1 / 2").unwrap(), "-12 / 2");
    }

    #[test]
    fn ternaries_over_inputs_survive() {
        assert_eq!(
            translate("input.constellation >= 4 ? dm.burst.bonus : naught").unwrap(),
            "constellation >= 4 ? 0.3 : 0"
        );
    }

    #[test]
    fn nested_forms_are_translated_and_wrapped() {
        assert_eq!(
            translate("sum(input.total.atk, 5) * 2").unwrap(),
            "(atk + 5) * 2"
        );
        assert_eq!(
            translate("1 + greaterEq(input.asc, 1, dm.burst.bonus)").unwrap(),
            "1 + (ascension >= 1 ? 0.3 : 0)"
        );
    }

    #[test]
    fn target_helpers_pass_the_gate() {
        assert_eq!(
            translate("Math.floor(input.total.eleMas / 100) * 0.5").unwrap(),
            "Math.floor(em / 100) * 0.5"
        );
    }

    #[test]
    fn unknown_callees_fail_the_gate() {
        assert_eq!(
            translate("customFormula(input.total.atk) * 2"),
            Err(Rejection::UnsafeOutput("customFormula".into()))
        );
    }

    #[test]
    fn one_bad_operand_fails_the_whole_fragment() {
        assert!(matches!(
            translate("input.total.atk * dm.skill.missing"),
            Err(Rejection::NotFound(_))
        ));
        assert!(matches!(
            translate("input.total.atk * condStacks"),
            Err(Rejection::Unrecognized(_))
        ));
    }

    #[test]
    fn bindings_inline_mid_expression() {
        let source = "const bonus = prod(dm.burst.bonus, input.total.hp)";
        assert_eq!(
            translate_with("bonus + 1", source).unwrap(),
            "(0.3 * hp) + 1"
        );
    }
}
