use std::{fmt::Formatter, str::Chars};

mod source_range;
pub use source_range::*;

/// Character-level position into a source string.
///
/// Line and column always describe the character that `next()` would return, both 1-based.
#[derive(Clone)]
pub struct Cursor<'a> {
    source: &'a str,
    chars: Chars<'a>,
    line: Line,
    col: Col,
}

impl<'a> std::fmt::Debug for Cursor<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Printing the source is usually too verbose, so only do it for {:#?}
        let alternate = f.alternate();
        let mut s = f.debug_struct("Cursor");
        s.field("line", &self.line).field("col", &self.col);
        if alternate {
            s.field("rest", &self.chars.as_str());
        }
        s.finish()
    }
}

impl<'a> PartialEq for Cursor<'a> {
    fn eq(&self, other: &Self) -> bool {
        (self.source, self.chars.as_str()) == (other.source, other.chars.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, derive_more::Display)]
pub struct Line(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, derive_more::Display)]
pub struct Col(pub usize);

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, chars: source.chars(), line: Line(1), col: Col(1) }
    }

    pub fn line(&self) -> Line {
        self.line
    }

    pub fn col(&self) -> Col {
        self.col
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    /// Consumes the next character if it equals `expected`.
    pub fn consume_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.next();
            true
        } else {
            false
        }
    }

    /// Consumes characters as long as `predicate` holds.
    pub fn consume_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&predicate) {
            self.next();
        }
    }

    fn offset(&self) -> usize {
        self.source.len() - self.chars.as_str().len()
    }

    pub fn slice_until<'c>(&self, end: &'c Cursor<'a>) -> &'a str {
        assert!(self.source == end.source);
        &self.source[self.offset()..end.offset()]
    }
}

impl<'a> From<&'a str> for Cursor<'a> {
    fn from(source: &'a str) -> Self {
        Self::new(source)
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line.0 += 1;
            self.col = Col(1);
        } else {
            self.col.0 += 1;
        }
        Some(c)
    }
}
