//! Directory-style search filters over loosely typed property sets.
//!
//! ```
//! use ldap_filter::{parse, Properties};
//!
//! let filter = parse("(&(objectclass=Person)(|(sn=Jensen)(cn=Babs J*)))").unwrap();
//! let props = Properties::new()
//!     .with("objectClass", "Person")
//!     .with("cn", "Babs Jensen");
//! assert!(filter.matches(&props));
//! ```

pub mod builder;
pub mod eval;
pub mod expr;
pub mod filter;
pub mod parser;
pub mod property;

pub use builder::{FilterExpr, Prop};
pub use expr::{escape_value, CompareOp, Expr, Pattern};
pub use filter::Filter;
pub use parser::{MalformedFilter, MAX_NESTING_DEPTH};
pub use property::{Properties, PropertySource, PropertySourceError, PropertyValue, Scalar};

/// Parse a filter string
pub fn parse(s: &str) -> Result<Filter, MalformedFilter> {
    Filter::parse(s)
}
