use crate::expr::{Expr, Pattern};

use super::error::{span_at, MalformedFilter};
use super::scanner::{Scanner, Token, TokenKind};
use super::MAX_NESTING_DEPTH;

/// Result of a canonical parse: the tree, whether some value held an
/// unescaped `&&`/`||` that the relaxed dialect reads as a connective, and
/// where the first such pair without surrounding whitespace sits
pub(super) struct Parsed {
    pub expr: Expr,
    pub connective_in_value: bool,
    pub unspaced_connective: Option<usize>,
}

/// Recursive-descent parser for the prefix grammar:
///
/// ```text
/// filter     := '(' filtercomp ')'
/// filtercomp := '&' filter filter+ | '|' filter filter+ | '!' filter | item
/// item       := attr ('=' | '<=' | '>=' | '~=') value
/// ```
pub(super) fn parse(src: &str) -> Result<Parsed, MalformedFilter> {
    let mut parser = CanonicalParser {
        src,
        scanner: Scanner::new(src),
    };
    let expr = parser.root()?;
    Ok(Parsed {
        expr,
        connective_in_value: parser.scanner.saw_connective_in_value(),
        unspaced_connective: parser.scanner.unspaced_connective(),
    })
}

struct CanonicalParser<'a> {
    src: &'a str,
    scanner: Scanner<'a>,
}

impl<'a> CanonicalParser<'a> {
    fn root(&mut self) -> Result<Expr, MalformedFilter> {
        let first = self.scanner.peek();
        match first.kind {
            TokenKind::End => {
                return Err(MalformedFilter::Empty {
                    src: self.src.to_string(),
                    span: (0, self.src.len()).into(),
                })
            }
            TokenKind::Open => {}
            _ => {
                return Err(MalformedFilter::MissingOpenParen {
                    src: self.src.to_string(),
                    span: self.span(&first),
                })
            }
        }

        let expr = self.filter(0)?;

        let rest = self.scanner.next_token();
        match rest.kind {
            TokenKind::End => Ok(expr),
            TokenKind::Close => Err(MalformedFilter::UnbalancedParens {
                src: self.src.to_string(),
                span: self.span(&rest),
                detail: "unmatched ')'".to_string(),
            }),
            _ => Err(MalformedFilter::TrailingInput {
                src: self.src.to_string(),
                span: (rest.offset, self.src.len() - rest.offset).into(),
            }),
        }
    }

    fn filter(&mut self, depth: usize) -> Result<Expr, MalformedFilter> {
        let open = self.scanner.next_token();
        if depth >= MAX_NESTING_DEPTH {
            return Err(MalformedFilter::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
                src: self.src.to_string(),
                span: self.span(&open),
            });
        }
        if open.kind != TokenKind::Open {
            return Err(self.unexpected("'('", &open, None));
        }

        let expr = self.filtercomp(depth)?;
        self.expect_close(&open)?;
        Ok(expr)
    }

    fn filtercomp(&mut self, depth: usize) -> Result<Expr, MalformedFilter> {
        let head = self.scanner.peek();
        match head.kind {
            TokenKind::And | TokenKind::Or => {
                self.scanner.next_token();
                let mut operands = Vec::new();
                while self.scanner.peek().kind == TokenKind::Open {
                    operands.push(self.filter(depth + 1)?);
                }
                if operands.len() < 2 {
                    let at = self.scanner.peek();
                    return Err(self.missing_operand(&head, &at));
                }
                Ok(match head.kind {
                    TokenKind::And => Expr::all_of(operands),
                    _ => Expr::any_of(operands),
                })
            }
            TokenKind::Not => {
                self.scanner.next_token();
                let at = self.scanner.peek();
                if at.kind != TokenKind::Open {
                    return Err(self.missing_operand(&head, &at));
                }
                Ok(Expr::not(self.filter(depth + 1)?))
            }
            _ => self.item(),
        }
    }

    fn item(&mut self) -> Result<Expr, MalformedFilter> {
        let attr = self.scanner.next_token();
        let attribute = match attr.kind {
            TokenKind::Attribute(a) if !a.is_empty() => a,
            _ => {
                return Err(MalformedFilter::MissingAttribute {
                    src: self.src.to_string(),
                    span: self.span(&attr),
                })
            }
        };

        let op = self.scanner.next_token();
        let op = match op.kind {
            TokenKind::Operator(op) => op,
            TokenKind::UnknownOperator(symbol) => {
                return Err(MalformedFilter::UnknownOperator {
                    operator: symbol.to_string(),
                    src: self.src.to_string(),
                    span: self.span(&op),
                })
            }
            _ => {
                return Err(MalformedFilter::MissingOperator {
                    attribute: attribute.to_string(),
                    src: self.src.to_string(),
                    span: self.span(&op),
                })
            }
        };

        let value = self.scanner.next_token();
        match value.kind {
            TokenKind::Value(raw) => Ok(Expr::compare(attribute, op, Pattern::parse_escaped(raw))),
            other => Err(MalformedFilter::internal(
                format!("scanner produced {} after an operator", other.describe()),
                self.src,
            )),
        }
    }

    fn expect_close(&mut self, open: &Token<'a>) -> Result<(), MalformedFilter> {
        let close = self.scanner.next_token();
        match close.kind {
            TokenKind::Close => Ok(()),
            TokenKind::End => Err(MalformedFilter::UnbalancedParens {
                src: self.src.to_string(),
                span: self.span(open),
                detail: "this '(' is never closed".to_string(),
            }),
            TokenKind::Open => Err(self.unexpected(
                "')'",
                &close,
                Some(r"Parentheses inside a value must be escaped as \( and \)".to_string()),
            )),
            _ => Err(self.unexpected("')'", &close, None)),
        }
    }

    fn missing_operand(&self, head: &Token<'a>, at: &Token<'a>) -> MalformedFilter {
        let operator = match head.kind {
            TokenKind::And => '&',
            TokenKind::Or => '|',
            _ => '!',
        };
        MalformedFilter::MissingOperand {
            operator,
            src: self.src.to_string(),
            span: self.span(at),
        }
    }

    fn unexpected(
        &self,
        expected: &'static str,
        found: &Token<'a>,
        help: Option<String>,
    ) -> MalformedFilter {
        MalformedFilter::Unexpected {
            expected,
            found: found.kind.describe(),
            src: self.src.to_string(),
            span: self.span(found),
            help,
        }
    }

    fn span(&self, token: &Token<'a>) -> miette::SourceSpan {
        span_at(self.src, token.offset, token.len)
    }
}
