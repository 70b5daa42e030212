use pest::{
    iterators::Pair,
    pratt_parser::{Assoc::*, Op, PrattParser},
    Parser,
};
use pest_derive::Parser;

use crate::expr::{trim_value, CompareOp, Expr, Pattern};

use super::error::MalformedFilter;

#[derive(Parser)]
#[grammar = "parser/grammar.pest"]
pub struct NaturalParser;

/// Parse the relaxed infix dialect. `&&` binds tighter than `||`, `!` is a
/// prefix, and a bare attribute is a presence test.
pub(super) fn parse(src: &str) -> Result<Expr, MalformedFilter> {
    let mut pairs = NaturalParser::parse(Rule::program, src)
        .map_err(|e| MalformedFilter::from_pest(Box::new(e), src))?;

    let program = pairs
        .next()
        .ok_or_else(|| MalformedFilter::internal("Grammar guarantees program exists", src))?;

    let expr = program
        .into_inner()
        .next()
        .ok_or_else(|| MalformedFilter::internal("Grammar guarantees program contains expr", src))?;

    parse_expr(expr, src)
}

/// Upper bound on how deeply the relaxed grammar would recurse for `src`:
/// parenthesis depth plus every `!`, escapes skipped.
pub(super) fn nesting_bound(src: &str) -> usize {
    let (mut depth, mut deepest, mut negations) = (0usize, 0usize, 0usize);
    let mut chars = src.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '(' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            ')' => depth = depth.saturating_sub(1),
            '!' => negations += 1,
            _ => {}
        }
    }
    deepest + negations
}

fn parse_expr(pair: Pair<'_, Rule>, src: &str) -> Result<Expr, MalformedFilter> {
    let pratt = PrattParser::new()
        .op(Op::infix(Rule::or, Left))
        .op(Op::infix(Rule::and, Left))
        .op(Op::prefix(Rule::neg));

    pratt
        .map_primary(|primary| match primary.as_rule() {
            Rule::comparison => parse_comparison(primary, src),
            Rule::presence => Ok(Expr::present(primary.as_str())),
            Rule::expr => parse_expr(primary, src),
            rule => Err(MalformedFilter::internal(
                format!("Unexpected primary rule: {:?}", rule),
                src,
            )),
        })
        .map_infix(|lhs, op, rhs| match op.as_rule() {
            Rule::and => Ok(chain(lhs?, rhs?, true)),
            Rule::or => Ok(chain(lhs?, rhs?, false)),
            rule => Err(MalformedFilter::internal(
                format!("Unexpected infix rule: {:?}", rule),
                src,
            )),
        })
        .map_prefix(|op, rhs| match op.as_rule() {
            Rule::neg => Ok(Expr::not(rhs?)),
            rule => Err(MalformedFilter::internal(
                format!("Unexpected prefix rule: {:?}", rule),
                src,
            )),
        })
        .parse(pair.into_inner())
}

/// `a && b && c` becomes one three-operand node rather than a nested pair
fn chain(lhs: Expr, rhs: Expr, conjunction: bool) -> Expr {
    match (lhs, conjunction) {
        (Expr::And(xs), true) => {
            let mut operands = xs.to_vec();
            operands.push(rhs);
            Expr::all_of(operands)
        }
        (Expr::Or(xs), false) => {
            let mut operands = xs.to_vec();
            operands.push(rhs);
            Expr::any_of(operands)
        }
        (lhs, true) => Expr::and(lhs, rhs),
        (lhs, false) => Expr::or(lhs, rhs),
    }
}

fn parse_comparison(pair: Pair<'_, Rule>, src: &str) -> Result<Expr, MalformedFilter> {
    let mut inner = pair.into_inner();

    let attribute = inner
        .next()
        .ok_or_else(|| MalformedFilter::internal("Grammar guarantees comparison has attribute", src))?
        .as_str();

    let operator = inner
        .next()
        .ok_or_else(|| MalformedFilter::internal("Grammar guarantees comparison has operator", src))?;
    let op = CompareOp::from_symbol(operator.as_str()).ok_or_else(|| {
        MalformedFilter::internal(format!("Unknown operator rule: {}", operator.as_str()), src)
    })?;

    let value = inner
        .next()
        .ok_or_else(|| MalformedFilter::internal("Grammar guarantees comparison has value", src))?;

    Ok(Expr::compare(
        attribute,
        op,
        Pattern::parse_escaped(trim_value(value.as_str())),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(src: &str) -> String {
        parse(src)
            .unwrap_or_else(|e| panic!("failed to parse {src}: {e}"))
            .to_string()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parsed("(a=1 || b=2 && c=3)"),
            "(|(a=1)(&(b=2)(c=3)))"
        );
        assert_eq!(
            parsed("((a=1 || b=2) && c=3)"),
            "(&(|(a=1)(b=2))(c=3))"
        );
    }

    #[test]
    fn test_chains_flatten() {
        assert_eq!(parsed("(a=1 && b=2 && c=3)"), "(&(a=1)(b=2)(c=3))");
        assert_eq!(parsed("(a=1 || b=2 || c=3)"), "(|(a=1)(b=2)(c=3))");
    }

    #[test]
    fn test_presence_and_absence() {
        assert_eq!(
            parsed("(service.testproperty = YES && !service.fakeproperty)"),
            "(&(service.testproperty=YES)(!(service.fakeproperty=*)))"
        );
        assert_eq!(parsed("(!!a)"), "(!(!(a=*)))");
    }

    #[test]
    fn test_dangling_connective() {
        assert!(matches!(
            parse("(a=1 && )"),
            Err(MalformedFilter::Syntax { .. })
        ));
        assert!(matches!(
            parse("a=1 && b=2"),
            Err(MalformedFilter::Syntax { .. })
        ));
    }

    #[test]
    fn test_nesting_bound() {
        assert_eq!(nesting_bound("((a=1) && !b)"), 3);
        assert_eq!(nesting_bound(r"(a=\(\!)"), 1);
    }
}
