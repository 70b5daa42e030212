use std::fmt::{self, Debug, Display};
use std::sync::OnceLock;

use itertools::Itertools;
use regex::Regex;

/// Right-hand side of a comparison.
///
/// Stored as the literal runs between unescaped `*` wildcards, so a value
/// without wildcards has exactly one segment and the presence value `*` is
/// two empty segments.
#[derive(Clone)]
pub struct Pattern {
    segments: Vec<String>,
    glob: OnceLock<Option<Regex>>,
}

impl Pattern {
    fn from_segments(segments: Vec<String>) -> Self {
        Self {
            segments,
            glob: OnceLock::new(),
        }
    }

    /// A value with no wildcards; every character matches itself
    pub fn literal(s: impl Into<String>) -> Self {
        Self::from_segments(vec![s.into()])
    }

    /// Unescaped text where every `*` is a wildcard
    pub fn from_wildcard_text(s: &str) -> Self {
        Self::from_segments(s.split('*').map(str::to_string).collect())
    }

    /// Filter-string form: `\` escapes the following character, unescaped
    /// `*` is a wildcard. A trailing lone `\` stands for itself.
    pub fn parse_escaped(raw: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => current.push(chars.next().unwrap_or('\\')),
                '*' => segments.push(std::mem::take(&mut current)),
                c => current.push(c),
            }
        }
        segments.push(current);
        Self::from_segments(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.len() > 1
    }

    /// True for the bare `*` value
    pub fn is_presence(&self) -> bool {
        self.segments.len() == 2 && self.segments.iter().all(String::is_empty)
    }

    /// The value with wildcards read back as plain `*` characters, as used
    /// by ordering and approximate comparisons
    pub fn text(&self) -> String {
        self.segments.join("*")
    }

    /// Exact match, or glob match when the value holds wildcards.
    ///
    /// Returns `None` only if the glob could not be compiled.
    pub fn is_match(&self, s: &str) -> Option<bool> {
        match self.segments.as_slice() {
            [exact] => Some(exact == s),
            _ => self.glob().map(|re| re.is_match(s)),
        }
    }

    fn glob(&self) -> Option<&Regex> {
        self.glob
            .get_or_init(|| {
                let body = self.segments.iter().map(|s| regex::escape(s)).join(".*");
                Regex::new(&format!("(?s)^{body}$")).ok()
            })
            .as_ref()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for Pattern {}

impl Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.segments).finish()
    }
}

/// Escaped filter-string form; parsing it back yields an equal pattern
impl Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.segments.iter().map(|s| escape_segment(s)).join("*");
        write!(f, "{}", protect_edges(&body))
    }
}

/// Escape a plain string so that it is read back literally inside a filter
/// value (no wildcards, no structural characters)
pub fn escape_value(s: &str) -> String {
    protect_edges(&escape_segment(s))
}

fn escape_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev = None;
    for c in s.chars() {
        match c {
            '\\' | '(' | ')' | '*' => {
                out.push('\\');
                out.push(c);
                prev = None;
            }
            // a doubled '&' or '|' would read as a relaxed-dialect connective
            '&' | '|' if prev == Some(c) => {
                out.push('\\');
                out.push(c);
                prev = None;
            }
            c => {
                out.push(c);
                prev = Some(c);
            }
        }
    }
    out
}

/// Escape the first leading and last trailing whitespace character, which
/// the scanner would otherwise trim away.
fn protect_edges(body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 2);
    let mut chars = body.char_indices().peekable();
    let last_ws = body
        .char_indices()
        .next_back()
        .filter(|(_, c)| c.is_whitespace())
        .map(|(i, _)| i);
    while let Some((i, c)) = chars.next() {
        if c.is_whitespace() && (i == 0 || Some(i) == last_ws) {
            out.push('\\');
        }
        out.push(c);
        // an escaped character is copied through as-is
        if c == '\\' {
            if let Some((_, next)) = chars.next() {
                out.push(next);
            }
        }
    }
    out
}

/// Strip unescaped whitespace from both ends of a raw value
pub(crate) fn trim_value(raw: &str) -> &str {
    let raw = raw.trim_start();
    let mut end = 0;
    let mut chars = raw.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            end = chars
                .next()
                .map_or(raw.len(), |(j, escaped)| j + escaped.len_utf8());
        } else if !c.is_whitespace() {
            end = i + c.len_utf8();
        }
    }
    &raw[..end]
}
