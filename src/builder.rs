//! Compose filters without writing filter strings.
//!
//! ```
//! use ldap_filter::builder::Prop;
//!
//! let f = Prop::new("objectclass").equal("Person") & !Prop::new("disabled");
//! assert_eq!(f.to_string(), "(&(objectclass=Person)(!(disabled=*)))");
//! ```
//!
//! A comparison against an empty value, or on an attribute name that would
//! not parse back (empty, or holding `=`, `<`, `>`, `~`, `(` or `)`), yields
//! the null expression: no constraint at all. Combining with null
//! yields the other operand, so optional constraints need no branching.

use std::fmt::{self, Display};
use std::ops::{BitAnd, BitOr, Not};

use crate::expr::{is_valid_attribute, CompareOp, Expr, Pattern};
use crate::filter::Filter;

/// A filter expression, or the null expression
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterExpr(Option<Expr>);

impl FilterExpr {
    pub fn null() -> Self {
        Self(None)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn expr(&self) -> Option<&Expr> {
        self.0.as_ref()
    }

    pub fn into_expr(self) -> Option<Expr> {
        self.0
    }

    /// `None` for the null expression
    pub fn into_filter(self) -> Option<Filter> {
        self.0.map(Filter::from)
    }

    pub fn and(self, other: impl Into<FilterExpr>) -> Self {
        match (self.0, other.into().0) {
            (Some(a), Some(b)) => Self(Some(Expr::and(a, b))),
            (a, b) => Self(a.or(b)),
        }
    }

    pub fn or(self, other: impl Into<FilterExpr>) -> Self {
        match (self.0, other.into().0) {
            (Some(a), Some(b)) => Self(Some(Expr::or(a, b))),
            (a, b) => Self(a.or(b)),
        }
    }

    pub fn negate(self) -> Self {
        Self(self.0.map(Expr::not))
    }
}

impl From<Expr> for FilterExpr {
    fn from(e: Expr) -> Self {
        Self(Some(e))
    }
}

impl From<Filter> for FilterExpr {
    fn from(f: Filter) -> Self {
        Self(Some(f.expr().clone()))
    }
}

/// A bare property is a presence test
impl From<Prop> for FilterExpr {
    fn from(p: Prop) -> Self {
        p.present()
    }
}

/// Canonical filter string; empty for the null expression
impl Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(e) => write!(f, "{e}"),
            None => Ok(()),
        }
    }
}

/// Starting point for comparisons on one attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prop {
    name: String,
}

impl Prop {
    /// Edge whitespace of `name` is dropped
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            name: name.trim().to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn leaf(&self, op: CompareOp, value: String, pattern: fn(&str) -> Pattern) -> FilterExpr {
        if !is_valid_attribute(&self.name) || value.is_empty() {
            return FilterExpr::null();
        }
        Expr::compare(self.name.clone(), op, pattern(&value)).into()
    }

    /// Equality; `*` in the value is a wildcard
    pub fn equal(&self, value: impl ToString) -> FilterExpr {
        self.leaf(CompareOp::Equal, value.to_string(), Pattern::from_wildcard_text)
    }

    /// Equality where every character, `*` included, matches itself
    pub fn equal_literal(&self, value: impl ToString) -> FilterExpr {
        self.leaf(CompareOp::Equal, value.to_string(), |v| Pattern::literal(v))
    }

    pub fn less_or_equal(&self, value: impl ToString) -> FilterExpr {
        self.leaf(CompareOp::LessOrEqual, value.to_string(), |v| Pattern::literal(v))
    }

    pub fn greater_or_equal(&self, value: impl ToString) -> FilterExpr {
        self.leaf(CompareOp::GreaterOrEqual, value.to_string(), |v| Pattern::literal(v))
    }

    pub fn approx(&self, value: impl ToString) -> FilterExpr {
        self.leaf(CompareOp::Approx, value.to_string(), |v| Pattern::literal(v))
    }

    pub fn present(&self) -> FilterExpr {
        if !is_valid_attribute(&self.name) {
            return FilterExpr::null();
        }
        Expr::present(self.name.clone()).into()
    }

    pub fn absent(&self) -> FilterExpr {
        self.present().negate()
    }
}

impl<T: Into<FilterExpr>> BitAnd<T> for FilterExpr {
    type Output = FilterExpr;

    fn bitand(self, rhs: T) -> FilterExpr {
        self.and(rhs)
    }
}

impl<T: Into<FilterExpr>> BitOr<T> for FilterExpr {
    type Output = FilterExpr;

    fn bitor(self, rhs: T) -> FilterExpr {
        self.or(rhs)
    }
}

impl Not for FilterExpr {
    type Output = FilterExpr;

    fn not(self) -> FilterExpr {
        self.negate()
    }
}

impl<T: Into<FilterExpr>> BitAnd<T> for Prop {
    type Output = FilterExpr;

    fn bitand(self, rhs: T) -> FilterExpr {
        self.present().and(rhs)
    }
}

impl<T: Into<FilterExpr>> BitOr<T> for Prop {
    type Output = FilterExpr;

    fn bitor(self, rhs: T) -> FilterExpr {
        self.present().or(rhs)
    }
}

/// `!Prop::new("x")` tests that `x` is absent
impl Not for Prop {
    type Output = FilterExpr;

    fn not(self) -> FilterExpr {
        self.absent()
    }
}
