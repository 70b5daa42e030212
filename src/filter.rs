use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

use slog::{o, Discard, Logger};

use crate::eval::eval;
use crate::expr::Expr;
use crate::parser::{parse_expr, MalformedFilter};
use crate::property::PropertySource;

/// A parsed filter, paired with its canonical string.
///
/// Two filters are equal when their canonical strings are, so `(a = 1)` and
/// `(a=1)` compare equal.
#[derive(Clone)]
pub struct Filter {
    expr: Expr,
    canonical: String,
}

fn discard() -> &'static Logger {
    static DISCARD: OnceLock<Logger> = OnceLock::new();
    DISCARD.get_or_init(|| Logger::root(Discard, o!()))
}

impl Filter {
    pub fn parse(s: &str) -> Result<Self, MalformedFilter> {
        Ok(parse_expr(s)?.into())
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    pub fn matches<S: PropertySource + ?Sized>(&self, source: &S) -> bool {
        eval(discard(), &self.expr, source)
    }

    /// Like [`Filter::matches`], logging to `logger`
    pub fn matches_logged<S: PropertySource + ?Sized>(&self, logger: &Logger, source: &S) -> bool {
        eval(logger, &self.expr, source)
    }

    /// The sources this filter matches, in order
    pub fn select<I>(&self, sources: I) -> Vec<I::Item>
    where
        I: IntoIterator,
        I::Item: PropertySource,
    {
        sources.into_iter().filter(|s| self.matches(s)).collect()
    }
}

impl From<Expr> for Filter {
    fn from(expr: Expr) -> Self {
        let canonical = expr.to_string();
        Self { expr, canonical }
    }
}

impl FromStr for Filter {
    type Err = MalformedFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Filter {
    type Error = MalformedFilter;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Filter {
    type Error = MalformedFilter;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl AsRef<Expr> for Filter {
    fn as_ref(&self) -> &Expr {
        &self.expr
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Filter").field(&self.canonical).finish()
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Filter {}

impl Hash for Filter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    use super::Filter;

    impl Serialize for Filter {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(self.as_str())
        }
    }

    impl<'de> Deserialize<'de> for Filter {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            Filter::parse(&s).map_err(de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::Properties;
    use std::collections::HashSet;

    #[test]
    fn test_identity_is_canonical_string() {
        let a = Filter::parse("  ( |(cn=Babs *)(sn=1) )").unwrap();
        let b: Filter = "(|(cn=Babs *)(sn=1))".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "(|(cn=Babs *)(sn=1))");

        let set: HashSet<Filter> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_select() {
        let people = vec![
            Properties::new().with("cn", "Babs Jensen"),
            Properties::new().with("cn", "Tim Howes"),
            Properties::new().with("sn", "Jensen"),
        ];
        let f = Filter::parse("(cn=Babs*)").unwrap();
        let selected = f.select(&people);
        assert_eq!(selected.len(), 1);
        assert!(std::ptr::eq(selected[0], &people[0]));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_as_string() {
        let f = Filter::parse("(&(a=1)(b = 2))").unwrap();
        let json = serde_json::to_string(&f).unwrap();
        assert_eq!(json, r#""(&(a=1)(b=2))""#);
        let back: Filter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
        assert!(serde_json::from_str::<Filter>(r#""(a=1""#).is_err());
    }
}
