use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use super::natural::Rule;

/// Error raised for structurally invalid filter strings
#[allow(dead_code)] // Fields are used by miette's derive macros
#[derive(Debug, Clone, Diagnostic, Error)]
pub enum MalformedFilter {
    #[error("Empty filter")]
    #[diagnostic(
        code(ldap_filter::empty),
        help("A filter looks like (attribute=value)")
    )]
    Empty {
        #[source_code]
        src: String,
        #[label("no filter here")]
        span: SourceSpan,
    },

    #[error("Filter must be enclosed in parentheses")]
    #[diagnostic(
        code(ldap_filter::missing_open_paren),
        help("Wrap the filter in parentheses, e.g. (cn=Babs Jensen)")
    )]
    MissingOpenParen {
        #[source_code]
        src: String,
        #[label("expected '(' here")]
        span: SourceSpan,
    },

    #[error("Unbalanced parentheses")]
    #[diagnostic(code(ldap_filter::unbalanced_parens))]
    UnbalancedParens {
        #[source_code]
        src: String,
        #[label("{detail}")]
        span: SourceSpan,
        detail: String,
    },

    #[error("Missing operand for '{operator}'")]
    #[diagnostic(
        code(ldap_filter::missing_operand),
        help("'&' and '|' take two or more sub-filters, '!' takes exactly one")
    )]
    MissingOperand {
        operator: char,
        #[source_code]
        src: String,
        #[label("sub-filter expected here")]
        span: SourceSpan,
    },

    #[error("Missing attribute name")]
    #[diagnostic(code(ldap_filter::missing_attribute))]
    MissingAttribute {
        #[source_code]
        src: String,
        #[label("attribute name expected here")]
        span: SourceSpan,
    },

    #[error("Missing comparison operator after '{attribute}'")]
    #[diagnostic(
        code(ldap_filter::missing_operator),
        help("Valid operators: =, <=, >=, ~=")
    )]
    MissingOperator {
        attribute: String,
        #[source_code]
        src: String,
        #[label("operator expected here")]
        span: SourceSpan,
    },

    #[error("Unknown operator: {operator}")]
    #[diagnostic(
        code(ldap_filter::unknown_operator),
        help("Valid operators: =, <=, >=, ~=")
    )]
    UnknownOperator {
        operator: String,
        #[source_code]
        src: String,
        #[label("unknown operator")]
        span: SourceSpan,
    },

    #[error("Expected {expected}, found {found}")]
    #[diagnostic(code(ldap_filter::unexpected))]
    Unexpected {
        expected: &'static str,
        found: String,
        #[source_code]
        src: String,
        #[label("unexpected {found}")]
        span: SourceSpan,
        #[help]
        help: Option<String>,
    },

    #[error("Ambiguous '{connective}' inside a value")]
    #[diagnostic(
        code(ldap_filter::ambiguous),
        help(
            "Escape it as &\\& or |\\| to keep it in the value, or put spaces around it to join two comparisons"
        )
    )]
    Ambiguous {
        connective: String,
        #[source_code]
        src: String,
        #[label("value text or connective?")]
        span: SourceSpan,
    },

    #[error("Unexpected input after end of filter")]
    #[diagnostic(code(ldap_filter::trailing_input))]
    TrailingInput {
        #[source_code]
        src: String,
        #[label("filter already ended")]
        span: SourceSpan,
    },

    #[error("Filter nesting exceeds {limit} levels")]
    #[diagnostic(code(ldap_filter::nesting_too_deep))]
    NestingTooDeep {
        limit: usize,
        #[source_code]
        src: String,
        #[label("too deeply nested")]
        span: SourceSpan,
    },

    // Syntax errors from the relaxed dialect's pest grammar
    #[error("Syntax error at line {line}, column {col}")]
    #[diagnostic(code(ldap_filter::syntax))]
    Syntax {
        #[source_code]
        src: String,
        #[label("{expected_msg}")]
        span: SourceSpan,
        #[help]
        help: Option<String>,
        expected_msg: String,
        line: usize,
        col: usize,
    },

    #[error("Internal parser error: {message}")]
    #[diagnostic(code(ldap_filter::internal))]
    Internal {
        message: String,
        #[source_code]
        src: String,
    },
}

/// Span of `len` bytes at `offset`, widened to one character so miette can
/// point at it. At end of input it points back at the last character.
pub(crate) fn span_at(src: &str, offset: usize, len: usize) -> SourceSpan {
    if len > 0 {
        return (offset, len).into();
    }
    match src[..offset.min(src.len())].chars().next_back() {
        Some(c) if offset >= src.len() => (offset - c.len_utf8(), c.len_utf8()).into(),
        _ => match src[offset.min(src.len())..].chars().next() {
            Some(c) => (offset, c.len_utf8()).into(),
            None => (offset, 0).into(),
        },
    }
}

/// Convert pest Rule enum to user-friendly names
fn rule_to_friendly_name(rule: &Rule) -> &'static str {
    match rule {
        Rule::expr => "filter expression",
        Rule::and => "'&&'",
        Rule::or => "'||'",
        Rule::neg => "'!'",
        Rule::comparison => "comparison",
        Rule::presence => "attribute",
        Rule::attribute => "attribute name",
        Rule::operator => "operator (=, <=, >=, ~=)",
        Rule::value => "value",
        Rule::EOI => "end of input",
        _ => "filter",
    }
}

/// Generate contextual help text based on error patterns
fn generate_help_text(positives: &[Rule], found_eoi: bool) -> Option<String> {
    if positives.contains(&Rule::value) {
        return Some("Add a value after the operator, like: (cn=Babs Jensen)".to_string());
    }
    if positives.contains(&Rule::operator) {
        return Some("Compare the attribute with =, <=, >= or ~=".to_string());
    }
    if found_eoi {
        return Some("Filter is incomplete. Check for a missing ')' or operand.".to_string());
    }
    None
}

impl MalformedFilter {
    /// Create a syntax error from pest error with diagnostic information
    pub(crate) fn from_pest(pest_err: Box<pest::error::Error<Rule>>, src: &str) -> Self {
        use pest::error::{ErrorVariant, InputLocation, LineColLocation};

        let (offset, width) = match pest_err.location {
            InputLocation::Pos(pos) => (pos, 0),
            InputLocation::Span((start, end)) => (start, end.saturating_sub(start)),
        };
        let span = span_at(src, offset, width);

        let (line, col) = match pest_err.line_col {
            LineColLocation::Pos((line, col)) => (line, col),
            LineColLocation::Span((line, col), _) => (line, col),
        };

        let (expected_msg, help) = match &pest_err.variant {
            ErrorVariant::ParsingError { positives, .. } => {
                let found_eoi = offset >= src.len();
                let expected_msg = match positives.as_slice() {
                    [] => "Unexpected input".to_string(),
                    [one] => format!("Expected {}", rule_to_friendly_name(one)),
                    many => {
                        let mut names: Vec<&str> =
                            many.iter().map(rule_to_friendly_name).collect();
                        names.dedup();
                        format!("Expected one of: {}", names.join(", "))
                    }
                };
                (expected_msg, generate_help_text(positives, found_eoi))
            }
            ErrorVariant::CustomError { message } => (message.clone(), None),
        };

        MalformedFilter::Syntax {
            src: src.to_string(),
            span,
            help,
            expected_msg,
            line,
            col,
        }
    }

    pub(crate) fn internal(msg: impl Into<String>, src: &str) -> Self {
        MalformedFilter::Internal {
            message: msg.into(),
            src: src.to_string(),
        }
    }

    /// The filter string the error was raised for
    pub fn source_text(&self) -> &str {
        match self {
            MalformedFilter::Empty { src, .. }
            | MalformedFilter::MissingOpenParen { src, .. }
            | MalformedFilter::UnbalancedParens { src, .. }
            | MalformedFilter::MissingOperand { src, .. }
            | MalformedFilter::MissingAttribute { src, .. }
            | MalformedFilter::MissingOperator { src, .. }
            | MalformedFilter::UnknownOperator { src, .. }
            | MalformedFilter::Unexpected { src, .. }
            | MalformedFilter::Ambiguous { src, .. }
            | MalformedFilter::TrailingInput { src, .. }
            | MalformedFilter::NestingTooDeep { src, .. }
            | MalformedFilter::Syntax { src, .. }
            | MalformedFilter::Internal { src, .. } => src,
        }
    }

    fn source_span(&self) -> Option<SourceSpan> {
        match self {
            MalformedFilter::Empty { span, .. }
            | MalformedFilter::MissingOpenParen { span, .. }
            | MalformedFilter::UnbalancedParens { span, .. }
            | MalformedFilter::MissingOperand { span, .. }
            | MalformedFilter::MissingAttribute { span, .. }
            | MalformedFilter::MissingOperator { span, .. }
            | MalformedFilter::UnknownOperator { span, .. }
            | MalformedFilter::Unexpected { span, .. }
            | MalformedFilter::Ambiguous { span, .. }
            | MalformedFilter::TrailingInput { span, .. }
            | MalformedFilter::NestingTooDeep { span, .. }
            | MalformedFilter::Syntax { span, .. } => Some(*span),
            MalformedFilter::Internal { .. } => None,
        }
    }

    /// Byte offset of the offending fragment
    pub fn offset(&self) -> Option<usize> {
        self.source_span().map(|s| s.offset())
    }

    /// The offending fragment of the filter string
    pub fn fragment(&self) -> &str {
        self.source_span()
            .and_then(|s| self.source_text().get(s.offset()..s.offset() + s.len()))
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_at_end_points_at_last_char() {
        let span = span_at("(a=b", 4, 0);
        assert_eq!((span.offset(), span.len()), (3, 1));
    }

    #[test]
    fn test_span_at_empty_input() {
        let span = span_at("", 0, 0);
        assert_eq!((span.offset(), span.len()), (0, 0));
    }

    #[test]
    fn test_span_inside_input_is_one_char_wide() {
        let span = span_at("(a<b)", 2, 0);
        assert_eq!((span.offset(), span.len()), (2, 1));
    }
}
