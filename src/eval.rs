use std::borrow::Cow;
use std::cmp::Ordering;

use slog::{debug, Logger};

use crate::expr::{CompareOp, Comparison, Expr};
use crate::property::{Number, PropertySource, PropertyValue, Scalar};

/// Evaluate an expression against a property source.
///
/// Total: a missing attribute, or one the source fails to produce, makes
/// every test on it false.
pub fn eval<S: PropertySource + ?Sized>(logger: &Logger, e: &Expr, source: &S) -> bool {
    debug!(logger, "evaluate filter"; "filter" => %e);
    let result = eval_expr(logger, e, source);
    debug!(logger, "evaluation finished"; "result" => result);
    result
}

fn eval_expr<S: PropertySource + ?Sized>(logger: &Logger, e: &Expr, source: &S) -> bool {
    match e {
        Expr::And(xs) => xs.iter().all(|x| eval_expr(logger, x, source)),
        Expr::Or(xs) => xs.iter().any(|x| eval_expr(logger, x, source)),
        Expr::Not(x) => !eval_expr(logger, x, source),
        Expr::Present(attr) => lookup(logger, source, attr).is_some(),
        Expr::Compare(c) => lookup(logger, source, c.attribute())
            .is_some_and(|v| v.scalars().any(|s| compare(logger, c, s))),
    }
}

fn lookup<'s, S: PropertySource + ?Sized>(
    logger: &Logger,
    source: &'s S,
    attr: &str,
) -> Option<Cow<'s, PropertyValue>> {
    match source.property(attr) {
        Ok(v) => v,
        Err(err) => {
            debug!(logger, "property source failed, treating attribute as absent";
                "attribute" => attr, "error" => %err);
            None
        }
    }
}

fn compare(logger: &Logger, c: &Comparison, s: &Scalar) -> bool {
    match c.op() {
        CompareOp::Equal => equal(logger, c, s),
        CompareOp::LessOrEqual => ordering(s, &c.value().text()).is_some_and(Ordering::is_le),
        CompareOp::GreaterOrEqual => ordering(s, &c.value().text()).is_some_and(Ordering::is_ge),
        CompareOp::Approx => approx(s, &c.value().text()),
    }
}

fn equal(logger: &Logger, c: &Comparison, s: &Scalar) -> bool {
    let pattern = c.value();
    let matched = match s {
        Scalar::Str(x) => pattern.is_match(x),
        // booleans compare without regard to case: (flag=TRUE) matches true
        Scalar::Bool(b) if !pattern.has_wildcard() => {
            Some(pattern.text().eq_ignore_ascii_case(&b.to_string()))
        }
        other => pattern.is_match(&other.to_string()),
    };
    matched.unwrap_or_else(|| {
        debug!(logger, "wildcard pattern could not be compiled";
            "attribute" => c.attribute(), "pattern" => %pattern);
        false
    })
}

/// Numeric when both sides parse as numbers, lexical otherwise. The lexical
/// fallback means "9" >= "10" holds when either side is not a number.
fn ordering(s: &Scalar, value: &str) -> Option<Ordering> {
    match (s.as_number(), Number::parse(value)) {
        (Some(lhs), Some(rhs)) => lhs.partial_cmp(rhs),
        _ => Some(s.to_string().as_str().cmp(value)),
    }
}

fn approx(s: &Scalar, value: &str) -> bool {
    normalize_approx(&s.to_string()) == normalize_approx(value)
}

/// Lowercase with whitespace runs collapsed to a single space
fn normalize_approx(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
