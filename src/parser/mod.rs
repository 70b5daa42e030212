//! Filter string parsing.
//!
//! The canonical prefix grammar (`(&(a=1)(!(b=2)))`) is tried first. Input
//! it rejects is handed to the relaxed dialect (`(a=1 && !b)`). Input both
//! accept, because a value hides an infix `&&`/`||`, goes to the relaxed
//! reading only when every such pair stands between whitespace; a pair glued
//! to its neighbours (`a&&b`) that changes the tree is reported as ambiguous.

mod canonical;
pub mod error;
mod natural;
pub mod scanner;

pub use error::MalformedFilter;
pub use scanner::{Scanner, Token, TokenKind};

use crate::expr::Expr;

/// Deepest nesting of sub-filters the parser accepts
pub const MAX_NESTING_DEPTH: usize = 512;

/// Parse a filter string into an expression tree
pub fn parse_expr(src: &str) -> Result<Expr, MalformedFilter> {
    match canonical::parse(src) {
        Ok(parsed) if !parsed.connective_in_value => Ok(parsed.expr),
        Ok(parsed) => choose_reading(src, parsed),
        Err(err @ (MalformedFilter::Empty { .. } | MalformedFilter::NestingTooDeep { .. })) => {
            Err(err)
        }
        Err(err) => match guard_nesting(src) {
            Ok(()) => natural::parse(src).map_err(|_| err),
            Err(_) => Err(err),
        },
    }
}

/// Pick between a canonical tree whose values hold `&&`/`||` and the
/// relaxed reading of the same text.
fn choose_reading(src: &str, parsed: canonical::Parsed) -> Result<Expr, MalformedFilter> {
    if guard_nesting(src).is_err() {
        return Ok(parsed.expr);
    }
    let relaxed = match natural::parse(src) {
        Ok(relaxed) => relaxed,
        Err(_) => return Ok(parsed.expr),
    };
    if relaxed == parsed.expr {
        return Ok(relaxed);
    }
    match parsed.unspaced_connective {
        None => Ok(relaxed),
        Some(offset) => Err(MalformedFilter::Ambiguous {
            connective: src[offset..offset + 2].to_string(),
            src: src.to_string(),
            span: (offset, 2).into(),
        }),
    }
}

fn guard_nesting(src: &str) -> Result<(), MalformedFilter> {
    if natural::nesting_bound(src) > MAX_NESTING_DEPTH {
        return Err(MalformedFilter::NestingTooDeep {
            limit: MAX_NESTING_DEPTH,
            src: src.to_string(),
            span: (0, src.len()).into(),
        });
    }
    Ok(())
}
