use std::fmt;

use crate::{
    cursor::{Cursor, Position, Span},
    parser::{Definitions, Grammar},
};

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A branch failed after consuming input outside of an `attempt`. This is a
    /// bug in the grammar rather than in the input.
    Consumed,
    /// A required symbol or rule did not match.
    Expected,
    /// A `strict` rule did not match.
    Strict,
    /// A semantic action returned an error.
    Action,
    /// A grammar handle was used before it was defined.
    Undefined,
    /// The root rule matched but input remained.
    Trailing,
}

/// The offending symbol of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(pub Option<char>);

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(c) if !c.is_control() => write!(f, "'{c}'"),
            Some(c) => write!(f, "{:#04x}", u32::from(c)),
            None => f.write_str("end of input"),
        }
    }
}

/// A fatal parse error.
///
/// `row` and `column` point at the offending symbol, except for errors raised
/// by semantic actions, which point at the start of the failing rule. `span`
/// covers the input consumed by the failing rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at line {row}, column {column}: found {found}, expecting {expected}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    pub found: Symbol,
    pub row: usize,
    pub column: usize,
    pub span: Span,
    /// EBNF of the failing rule.
    pub expected: String,
    /// Definitions of the named rules reachable from the failing rule.
    pub definitions: Vec<(String, String)>,
    excerpt: String,
}

impl ParseError {
    /// Build an error for `grammar`, which started at `start` and failed at the
    /// cursor's current position.
    pub fn new<G: Grammar + ?Sized>(
        kind: ErrorKind,
        message: impl Into<String>,
        grammar: &G,
        start: Position,
        cursor: &Cursor<'_>,
    ) -> Self {
        Self::at(kind, message, grammar, start, cursor.position(), cursor)
    }

    /// Build an error reported at `at` instead of the cursor's position.
    pub fn at<G: Grammar + ?Sized>(
        kind: ErrorKind,
        message: impl Into<String>,
        grammar: &G,
        start: Position,
        at: Position,
        cursor: &Cursor<'_>,
    ) -> Self {
        let mut defs = Definitions::default();
        let expected = grammar.ebnf(Some(&mut defs));
        let message = message.into();
        let end = cursor.position();
        let found = Symbol(cursor.input()[at.offset..].chars().next());
        log::debug!(
            "{message} at {}:{} (expecting {expected})",
            at.row,
            at.column
        );
        Self {
            kind,
            message,
            found,
            row: at.row,
            column: at.column,
            span: Span {
                start: start.offset,
                end: end.offset,
            },
            expected,
            definitions: defs.into_iter().collect(),
            excerpt: excerpt(cursor, start, at, end),
        }
    }

    pub(crate) fn consumed<G: Grammar + ?Sized>(
        grammar: &G,
        start: Position,
        cursor: &Cursor<'_>,
    ) -> Self {
        Self::new(
            ErrorKind::Consumed,
            "failed parser consumed input",
            grammar,
            start,
            cursor,
        )
    }

    pub(crate) fn undefined(cursor: &Cursor<'_>) -> Self {
        Self::new(
            ErrorKind::Undefined,
            "grammar handle used before definition",
            &Undefined,
            cursor.position(),
            cursor,
        )
    }

    /// The full diagnostic: the headline, the offending line with the failing
    /// span marked, the expected grammar and the named rules it refers to.
    pub fn report(&self) -> Report<'_> {
        Report(self)
    }
}

/// Multi-line rendering of a [`ParseError`], see [`ParseError::report`].
pub struct Report<'a>(&'a ParseError);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let error = self.0;
        writeln!(f, "{} at line: {} column: {}", error.message, error.row, error.column)?;
        writeln!(f, "{}", error.excerpt)?;
        writeln!(f, "expecting: {}", error.expected)?;
        if !error.definitions.is_empty() {
            writeln!(f, "where:")?;
            for (name, definition) in &error.definitions {
                writeln!(f, "\t{name} = {definition};")?;
            }
        }
        Ok(())
    }
}

struct Undefined;

impl Grammar for Undefined {
    fn ebnf(&self, _defs: Option<&mut Definitions>) -> String {
        "?".to_string()
    }
}

/// The line containing `start`, with a caret under `start` and, when the span
/// continues on the same line, a second caret under `end`. If the error is
/// reported on a later line than `start`, that line is shown instead, with a
/// caret under `at`.
fn excerpt(cursor: &Cursor<'_>, start: Position, at: Position, end: Position) -> String {
    let from = if at.row == start.row { start } else { at };
    let line: String = cursor
        .line(from)
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    let mut marker = " ".repeat(from.column - 1);
    marker.push('^');
    if end.row == from.row && end.column > from.column {
        marker.push_str(&"-".repeat(end.column - from.column - 1));
        marker.push('^');
    }
    format!("{line}\n{marker}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_render_readably() {
        assert_eq!(Symbol(Some('x')).to_string(), "'x'");
        assert_eq!(Symbol(Some('\n')).to_string(), "0x0a");
        assert_eq!(Symbol(None).to_string(), "end of input");
    }

    #[test]
    fn excerpt_marks_the_span() {
        let mut cursor = Cursor::new("7,8,x\n");
        cursor.advance_to(3);
        let start = cursor.position();
        cursor.advance();
        let error = ParseError::new(ErrorKind::Strict, "oops", &Undefined, start, &cursor);
        assert_eq!(error.column, 5);
        assert_eq!(error.found, Symbol(Some('x')));
        assert_eq!(error.span, Span { start: 3, end: 4 });
        let report = error.report().to_string();
        assert_eq!(
            report,
            "oops at line: 1 column: 5\n7,8,x\n   ^^\nexpecting: ?\n"
        );
    }

    #[test]
    fn excerpt_follows_the_error_to_a_later_line() {
        let mut cursor = Cursor::new("[1,\n  2;\n");
        let start = cursor.position();
        cursor.advance_to(7);
        let error = ParseError::new(ErrorKind::Strict, "oops", &Undefined, start, &cursor);
        assert_eq!((error.row, error.column), (2, 4));
        assert_eq!(error.span, Span { start: 0, end: 7 });
        assert_eq!(
            error.report().to_string(),
            "oops at line: 2 column: 4\n  2;\n   ^\nexpecting: ?\n"
        );
    }
}
