use crate::expr::{trim_value, CompareOp};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind<'a> {
    Open,
    Close,
    And,
    Or,
    Not,
    Attribute(&'a str),
    Operator(CompareOp),
    /// `<`, `>` or `~` not followed by `=`
    UnknownOperator(&'a str),
    /// Raw value text: escapes intact, unescaped edge whitespace trimmed
    Value(&'a str),
    End,
}

impl TokenKind<'_> {
    /// Human-readable token description for error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Open => "'('".to_string(),
            TokenKind::Close => "')'".to_string(),
            TokenKind::And => "'&'".to_string(),
            TokenKind::Or => "'|'".to_string(),
            TokenKind::Not => "'!'".to_string(),
            TokenKind::Attribute(a) => format!("attribute '{a}'"),
            TokenKind::Operator(op) => format!("operator '{op}'"),
            TokenKind::UnknownOperator(op) => format!("operator '{op}'"),
            TokenKind::Value(v) => format!("value '{v}'"),
            TokenKind::End => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    /// Byte offset into the filter string
    pub offset: usize,
    pub len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Structure,
    Operator,
    Value,
}

/// Splits a filter string into tokens. What a character means depends on
/// what came before it: `&` opens a conjunction right after `(` but is plain
/// text inside a value, so the scanner tracks whether it expects structure,
/// an operator or a value. It never fails; the parser decides what is
/// malformed.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    mode: Mode,
    connective_in_value: bool,
    unspaced_connective: Option<usize>,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            mode: Mode::Structure,
            connective_in_value: false,
            unspaced_connective: None,
        }
    }

    /// True once a scanned value held an unescaped `&&` or `||`, which
    /// only the relaxed dialect gives meaning to.
    pub fn saw_connective_in_value(&self) -> bool {
        self.connective_in_value
    }

    /// Offset of the first in-value `&&`/`||` not set off by whitespace on
    /// both sides, e.g. `a&&b`. Such a pair may be value text or a connective.
    pub fn unspaced_connective(&self) -> Option<usize> {
        self.unspaced_connective
    }

    /// Look at the next token without consuming it
    pub fn peek(&self) -> Token<'a> {
        self.clone().next_token()
    }

    pub fn next_token(&mut self) -> Token<'a> {
        match self.mode {
            Mode::Structure => self.structure(),
            Mode::Operator => self.operator(),
            Mode::Value => self.value(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn emit(&mut self, kind: TokenKind<'a>, offset: usize, len: usize) -> Token<'a> {
        self.pos = offset + len;
        Token { kind, offset, len }
    }

    fn structure(&mut self) -> Token<'a> {
        self.skip_whitespace();
        let start = self.pos;
        let kind = match self.rest().chars().next() {
            None => return Token { kind: TokenKind::End, offset: start, len: 0 },
            Some('(') => TokenKind::Open,
            Some(')') => TokenKind::Close,
            Some('&') => TokenKind::And,
            Some('|') => TokenKind::Or,
            Some('!') => TokenKind::Not,
            Some(_) => return self.attribute(),
        };
        self.emit(kind, start, 1)
    }

    fn attribute(&mut self) -> Token<'a> {
        let rest = self.rest();
        let raw_len = rest
            .find(|c| matches!(c, '=' | '<' | '>' | '~' | '(' | ')'))
            .unwrap_or(rest.len());
        let name = rest[..raw_len].trim_end();
        let token = Token {
            kind: TokenKind::Attribute(name),
            offset: self.pos,
            len: name.len(),
        };
        self.pos += raw_len;
        self.mode = Mode::Operator;
        token
    }

    fn operator(&mut self) -> Token<'a> {
        self.skip_whitespace();
        let start = self.pos;
        let rest = self.rest();
        let two = rest.get(..2).unwrap_or(rest);
        if let Some(op) = CompareOp::from_symbol(two).filter(|op| op.symbol().len() == 2) {
            self.mode = Mode::Value;
            return self.emit(TokenKind::Operator(op), start, 2);
        }
        match rest.chars().next() {
            Some('=') => {
                self.mode = Mode::Value;
                self.emit(TokenKind::Operator(CompareOp::Equal), start, 1)
            }
            Some(c @ ('<' | '>' | '~')) => {
                self.mode = Mode::Value;
                self.emit(TokenKind::UnknownOperator(&rest[..c.len_utf8()]), start, 1)
            }
            // no operator at all; let the parser see what is there
            _ => {
                self.mode = Mode::Structure;
                self.structure()
            }
        }
    }

    fn value(&mut self) -> Token<'a> {
        let rest = self.rest();
        let mut end = rest.len();
        let mut prev: Option<(usize, char)> = None;
        let mut chars = rest.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                    prev = None;
                }
                '(' | ')' => {
                    end = i;
                    break;
                }
                '&' | '|' if prev.map(|(_, p)| p) == Some(c) => {
                    let start = prev.map_or(i, |(j, _)| j);
                    let before = rest[..start].chars().next_back();
                    let after = rest[i + 1..].chars().next();
                    let spaced = before.map_or(true, char::is_whitespace)
                        && after.map_or(true, |a| a.is_whitespace() || a == '(' || a == ')');
                    self.connective_in_value = true;
                    if !spaced && self.unspaced_connective.is_none() {
                        self.unspaced_connective = Some(self.pos + start);
                    }
                    prev = None;
                }
                c => prev = Some((i, c)),
            }
        }
        let raw = &rest[..end];
        let value = trim_value(raw);
        let leading = raw.len() - raw.trim_start().len();
        let token = Token {
            kind: TokenKind::Value(value),
            offset: self.pos + leading,
            len: value.len(),
        };
        self.pos += end;
        self.mode = Mode::Structure;
        token
    }
}
