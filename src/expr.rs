pub mod frame;
mod pattern;

use std::collections::BTreeSet;
use std::fmt::{self, Display};
use std::sync::Arc;

use recursion::CollapsibleExt;

use self::frame::ExprFrame;
pub use self::pattern::{escape_value, Pattern};
pub(crate) use self::pattern::trim_value;

/// Comparison operators, rendered with their filter-string symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Equal,          // =
    LessOrEqual,    // <=
    GreaterOrEqual, // >=
    Approx,         // ~=
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Equal => "=",
            CompareOp::LessOrEqual => "<=",
            CompareOp::GreaterOrEqual => ">=",
            CompareOp::Approx => "~=",
        }
    }

    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "=" => Some(CompareOp::Equal),
            "<=" => Some(CompareOp::LessOrEqual),
            ">=" => Some(CompareOp::GreaterOrEqual),
            "~=" => Some(CompareOp::Approx),
            _ => None,
        }
    }
}

impl Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Leaf comparing one attribute against a value
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    attribute: String,
    op: CompareOp,
    value: Pattern,
}

impl Comparison {
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn value(&self) -> &Pattern {
        &self.value
    }
}

impl Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}{}{})", self.attribute, self.op, self.value)
    }
}

/// Immutable filter expression tree.
///
/// Children are reference counted, so cloning an `Expr` or reusing it as an
/// operand of several parents is cheap and never copies the subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // predicates
    Compare(Arc<Comparison>),
    Present(Arc<str>),
    // boolean operators, each group holding at least two operands
    And(Arc<[Expr]>),
    Or(Arc<[Expr]>),
    Not(Arc<Expr>),
}

/// Whether `name` renders as an attribute that parses back to itself: non
/// empty, no operator or parenthesis characters, no edge whitespace, and not
/// starting with a connective.
pub fn is_valid_attribute(name: &str) -> bool {
    !name.is_empty()
        && name.trim() == name
        && !name.starts_with(['&', '|', '!'])
        && !name.contains(['=', '<', '>', '~', '(', ')'])
}

impl Expr {
    /// Comparison leaf. `attr=*` becomes a presence test. Edge whitespace of
    /// the attribute is dropped, as the parser drops it.
    pub fn compare(attribute: impl Into<String>, op: CompareOp, value: Pattern) -> Self {
        let attribute = trimmed(attribute.into());
        if op == CompareOp::Equal && value.is_presence() {
            return Self::present(attribute);
        }
        Self::Compare(Arc::new(Comparison {
            attribute,
            op,
            value,
        }))
    }

    pub fn present(attribute: impl Into<String>) -> Self {
        let attribute = trimmed(attribute.into());
        Self::Present(Arc::from(attribute))
    }

    pub fn and(a: Self, b: Self) -> Self {
        Self::And(Arc::from(vec![a, b]))
    }

    pub fn or(a: Self, b: Self) -> Self {
        Self::Or(Arc::from(vec![a, b]))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(a: Self) -> Self {
        Self::Not(Arc::new(a))
    }

    pub(crate) fn all_of(operands: Vec<Self>) -> Self {
        debug_assert!(operands.len() >= 2, "'&' needs two operands");
        Self::And(Arc::from(operands))
    }

    pub(crate) fn any_of(operands: Vec<Self>) -> Self {
        debug_assert!(operands.len() >= 2, "'|' needs two operands");
        Self::Or(Arc::from(operands))
    }

    /// Every attribute name the expression refers to, lowercased
    pub fn attributes(&self) -> BTreeSet<String> {
        self.collapse_frames(|frame| match frame {
            ExprFrame::Compare(c) => BTreeSet::from([c.attribute.to_lowercase()]),
            ExprFrame::Present(a) => BTreeSet::from([a.to_lowercase()]),
            ExprFrame::And(xs) | ExprFrame::Or(xs) => xs.into_iter().flatten().collect(),
            ExprFrame::Not(x) => x,
        })
    }

    /// The finite set of exact values `attribute` must take for the
    /// expression to match, when that can be read off the tree.
    ///
    /// `None` means no such set is known. Registries use this to narrow a
    /// lookup (e.g. by `objectclass`) before evaluating the full filter.
    pub fn required_values(&self, attribute: &str) -> Option<BTreeSet<String>> {
        let attribute = attribute.to_lowercase();
        self.collapse_frames(|frame| match frame {
            ExprFrame::Compare(c)
                if c.op == CompareOp::Equal
                    && !c.value.has_wildcard()
                    && c.attribute.to_lowercase() == attribute =>
            {
                Some(BTreeSet::from([c.value.text()]))
            }
            ExprFrame::Compare(_) | ExprFrame::Present(_) | ExprFrame::Not(_) => None,
            ExprFrame::And(xs) => xs
                .into_iter()
                .flatten()
                .reduce(|a: BTreeSet<String>, b| a.intersection(&b).cloned().collect::<BTreeSet<_>>()),
            ExprFrame::Or(xs) => xs
                .into_iter()
                .collect::<Option<Vec<_>>>()
                .map(|sets| sets.into_iter().flatten().collect()),
        })
    }
}

fn trimmed(s: String) -> String {
    match s.trim() {
        t if t.len() == s.len() => s,
        t => t.to_string(),
    }
}

/// Canonical, fully parenthesized prefix form
impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.collapse_frames(|frame| match frame {
            ExprFrame::Compare(c) => c.to_string(),
            ExprFrame::Present(a) => format!("({a}=*)"),
            ExprFrame::And(xs) => format!("(&{})", xs.concat()),
            ExprFrame::Or(xs) => format!("(|{})", xs.concat()),
            ExprFrame::Not(x) => format!("(!{x})"),
        });
        write!(f, "{rendered}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(attr: &str, value: &str) -> Expr {
        Expr::compare(attr, CompareOp::Equal, Pattern::parse_escaped(value))
    }

    #[test]
    fn test_presence_from_wildcard_value() {
        assert_eq!(eq("cn", "*"), Expr::present("cn"));
        assert_eq!(eq("cn", "*").to_string(), "(cn=*)");
        assert!(matches!(eq("cn", r"\*"), Expr::Compare(_)));
    }

    #[test]
    fn test_display_is_prefix_form() {
        let e = Expr::and(
            eq("objectClass", "Person"),
            Expr::or(eq("sn", "Jensen"), eq("cn", "Babs J*")),
        );
        assert_eq!(e.to_string(), "(&(objectClass=Person)(|(sn=Jensen)(cn=Babs J*)))");

        let e = Expr::not(Expr::compare(
            "le",
            CompareOp::LessOrEqual,
            Pattern::literal("4.1"),
        ));
        assert_eq!(e.to_string(), "(!(le<=4.1))");
    }

    #[test]
    fn test_shared_subtrees() {
        let shared = eq("cn", "x");
        let e = Expr::or(Expr::not(shared.clone()), shared.clone());
        assert_eq!(e.to_string(), "(|(!(cn=x))(cn=x))");
        if let (Expr::Or(xs), Expr::Compare(leaf)) = (&e, &shared) {
            let Expr::Compare(inner) = &xs[1] else {
                panic!("expected comparison")
            };
            assert!(Arc::ptr_eq(inner, leaf));
        }
    }

    #[test]
    fn test_attribute_names() {
        assert_eq!(eq(" cn ", "x"), eq("cn", "x"));
        assert_eq!(Expr::present("sn\t"), Expr::present("sn"));

        assert!(is_valid_attribute("service.id"));
        assert!(is_valid_attribute("a&b"));
        assert!(!is_valid_attribute(""));
        assert!(!is_valid_attribute(" cn"));
        assert!(!is_valid_attribute("a=b"));
        assert!(!is_valid_attribute("a)"));
        assert!(!is_valid_attribute("!a"));
    }

    #[test]
    fn test_attributes() {
        let e = Expr::and(eq("CN", "x"), Expr::not(Expr::present("Sn")));
        let attrs: Vec<String> = e.attributes().into_iter().collect();
        assert_eq!(attrs, vec!["cn", "sn"]);
    }

    #[test]
    fn test_required_values() {
        let e = Expr::all_of(vec![
            Expr::or(eq("objectclass", "a"), eq("ObjectClass", "b")),
            eq("cn", "x"),
        ]);
        assert_eq!(
            e.required_values("objectClass"),
            Some(BTreeSet::from(["a".to_string(), "b".to_string()]))
        );
        assert_eq!(e.required_values("sn"), None);

        // a disjunct that does not constrain the attribute loses the hint
        let e = Expr::or(eq("objectclass", "a"), eq("cn", "x"));
        assert_eq!(e.required_values("objectclass"), None);

        // wildcards and negations give no hint
        assert_eq!(eq("objectclass", "a*").required_values("objectclass"), None);
        assert_eq!(
            Expr::not(eq("objectclass", "a")).required_values("objectclass"),
            None
        );

        let e = Expr::and(eq("objectclass", "a"), eq("objectclass", "b"));
        assert_eq!(e.required_values("objectclass"), Some(BTreeSet::new()));
    }
}
