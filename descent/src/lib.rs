#![doc=include_str!("../../README.md")]

pub mod arena;
pub mod combinator;
pub mod cursor;
pub mod error;
pub mod lift;
pub mod parser;
pub mod predicate;
pub mod primitive;
pub mod recursive;
pub mod token;

pub use crate::{
    arena::Arena,
    combinator::{
        attempt, attempt_pure, choice, discard, except, many, option, sep_by, sequence, some,
        strict, trace,
    },
    cursor::{Cursor, Position, Span},
    error::{ErrorKind, ParseError, Report, Symbol},
    lift::{all, all_with, any, any_with, Alt1, Alt2, Alt3, Alt4, Alt5, Alt6},
    parser::{Definitions, Grammar, Parser, Rank},
    predicate::{
        satisfy, Alnum, Alpha, Anything, Blank, Char, Control, Digit, Eof, Eol, Graphic,
        HexDigit, Lower, Predicate, PredicateExt, Print, Punctuation, Space, Upper,
    },
    primitive::{accept, expect, fail, literal, succeed},
    recursive::{define, fix, reference, rename, Fix, Handle, Recur, Reference},
    token::{first_token, token},
};

#[cfg(feature = "regex")]
pub use crate::primitive::pattern;

/// Run `parser` on `input` from the start.
///
/// Returns `Ok(None)` if the parser does not match. The parser does not have to
/// consume the whole input; see [`parse_complete`] for that.
pub fn parse<S, P>(parser: &P, input: &str, state: &mut S) -> Result<Option<P::Output>, ParseError>
where
    P: Parser<S> + ?Sized,
    P::Output: Default,
{
    let mut cursor = Cursor::new(input);
    let mut out = P::Output::default();
    let matched = parser.parse(&mut cursor, Some(&mut out), state)?;
    Ok(matched.then_some(out))
}

/// Run `parser` on the whole of `input`.
///
/// A mismatch and leftover input are both reported as errors.
pub fn parse_complete<S, P>(parser: &P, input: &str, state: &mut S) -> Result<P::Output, ParseError>
where
    P: Parser<S> + ?Sized,
    P::Output: Default,
{
    let mut cursor = Cursor::new(input);
    let start = cursor.position();
    let mut out = P::Output::default();
    if !parser.parse(&mut cursor, Some(&mut out), state)? {
        return Err(ParseError::new(
            ErrorKind::Expected,
            "syntax error",
            parser,
            start,
            &cursor,
        ));
    }
    if !cursor.is_empty() {
        return Err(ParseError::new(
            ErrorKind::Trailing,
            "unexpected trailing input",
            parser,
            start,
            &cursor,
        ));
    }
    Ok(out)
}
