use std::marker::PhantomData;

use crate::{
    cursor::Cursor,
    error::{ErrorKind, ParseError},
    parser::{Definitions, Grammar, Parser, Rank},
    predicate::Predicate,
};

/// See [`accept`].
#[derive(Debug, Clone, Copy)]
pub struct Accept<P> {
    pub pred: P,
}

/// Consume one symbol matching `pred` and append it to the output.
///
/// A predicate that matches the end of the input (such as [`Eof`](crate::Eof))
/// succeeds there without consuming anything.
pub fn accept<P: Predicate>(pred: P) -> Accept<P> {
    Accept { pred }
}

impl<P: Predicate> Grammar for Accept<P> {
    fn ebnf(&self, _defs: Option<&mut Definitions>) -> String {
        self.pred.name()
    }

    fn rank(&self) -> Rank {
        self.pred.rank()
    }
}

impl<S, P: Predicate> Parser<S> for Accept<P> {
    type Output = String;

    #[inline]
    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut String>,
        _state: &mut S,
    ) -> Result<bool, ParseError> {
        if !self.pred.matches(cursor.peek()) {
            return Ok(false);
        }
        if let (Some(c), Some(out)) = (cursor.advance(), out) {
            out.push(c);
        }
        Ok(true)
    }
}

/// See [`expect`].
#[derive(Debug, Clone, Copy)]
pub struct Expect<P> {
    pub pred: P,
}

/// Like [`accept`], but a mismatch is a fatal error.
pub fn expect<P: Predicate>(pred: P) -> Expect<P> {
    Expect { pred }
}

impl<P: Predicate> Grammar for Expect<P> {
    fn ebnf(&self, _defs: Option<&mut Definitions>) -> String {
        self.pred.name()
    }

    fn rank(&self) -> Rank {
        self.pred.rank()
    }
}

impl<S, P: Predicate> Parser<S> for Expect<P> {
    type Output = String;

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut String>,
        _state: &mut S,
    ) -> Result<bool, ParseError> {
        if !self.pred.matches(cursor.peek()) {
            return Err(ParseError::new(
                ErrorKind::Expected,
                "unexpected symbol",
                self,
                cursor.position(),
                cursor,
            ));
        }
        if let (Some(c), Some(out)) = (cursor.advance(), out) {
            out.push(c);
        }
        Ok(true)
    }
}

/// See [`literal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    text: String,
}

/// Match a fixed sequence of symbols.
///
/// The match is atomic: a mismatch part way through leaves the cursor where
/// it started.
///
/// ```
/// # use descent::*;
/// let keyword = choice(literal("let"), literal("loop"));
/// assert_eq!(parse(&keyword, "loop", &mut ()).unwrap(), Some("loop".to_string()));
/// assert_eq!(keyword.ebnf(None), "\"let\" | \"loop\"");
/// ```
pub fn literal(text: impl Into<String>) -> Literal {
    Literal { text: text.into() }
}

impl Grammar for Literal {
    fn ebnf(&self, _defs: Option<&mut Definitions>) -> String {
        format!("{:?}", self.text)
    }
}

impl<S> Parser<S> for Literal {
    type Output = String;

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut String>,
        _state: &mut S,
    ) -> Result<bool, ParseError> {
        if !cursor.rest().starts_with(self.text.as_str()) {
            return Ok(false);
        }
        cursor.advance_to(cursor.offset() + self.text.len());
        if let Some(out) = out {
            out.push_str(&self.text);
        }
        Ok(true)
    }
}

#[cfg(feature = "regex")]
pub use self::regex::{pattern, Pattern};

#[cfg(feature = "regex")]
mod regex {
    use regex_automata::{
        meta::{BuildError, Regex},
        Anchored, Input,
    };

    use super::*;

    /// See [`pattern`].
    #[derive(Debug, Clone)]
    pub struct Pattern {
        source: String,
        regex: Regex,
    }

    /// Match a regular expression anchored at the cursor, with leftmost-first
    /// semantics.
    ///
    /// ```
    /// # use descent::*;
    /// let number = pattern(r"[0-9]+(\.[0-9]+)?").unwrap();
    /// assert_eq!(parse(&number, "3.14 ", &mut ()).unwrap(), Some("3.14".to_string()));
    /// assert_eq!(parse(&number, "x", &mut ()).unwrap(), None);
    /// ```
    pub fn pattern(source: &str) -> Result<Pattern, BuildError> {
        Ok(Pattern {
            source: source.to_string(),
            regex: Regex::new(source)?,
        })
    }

    impl Grammar for Pattern {
        fn ebnf(&self, _defs: Option<&mut Definitions>) -> String {
            format!("/{}/", self.source)
        }
    }

    impl<S> Parser<S> for Pattern {
        type Output = String;

        fn parse(
            &self,
            cursor: &mut Cursor<'_>,
            out: Option<&mut String>,
            _state: &mut S,
        ) -> Result<bool, ParseError> {
            let input = Input::new(cursor.input())
                .range(cursor.offset()..)
                .anchored(Anchored::Yes);
            let Some(end) = self.regex.search_half(&input) else {
                return Ok(false);
            };
            let start = cursor.offset();
            cursor.advance_to(end.offset());
            if let Some(out) = out {
                out.push_str(&cursor.input()[start..end.offset()]);
            }
            Ok(true)
        }
    }
}

/// See [`succeed`].
pub struct Succeed<O> {
    _phantom: PhantomData<fn() -> O>,
}

/// Always succeeds without consuming input.
pub fn succeed<O>() -> Succeed<O> {
    Succeed {
        _phantom: PhantomData,
    }
}

impl<O> Clone for Succeed<O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O> Copy for Succeed<O> {}

impl<O> Grammar for Succeed<O> {
    fn ebnf(&self, _defs: Option<&mut Definitions>) -> String {
        "succ".to_string()
    }
}

impl<S, O> Parser<S> for Succeed<O> {
    type Output = O;

    #[inline(always)]
    fn parse(
        &self,
        _cursor: &mut Cursor<'_>,
        _out: Option<&mut O>,
        _state: &mut S,
    ) -> Result<bool, ParseError> {
        Ok(true)
    }
}

/// See [`fail`].
pub struct Fail<O> {
    _phantom: PhantomData<fn() -> O>,
}

/// Never succeeds.
pub fn fail<O>() -> Fail<O> {
    Fail {
        _phantom: PhantomData,
    }
}

impl<O> Clone for Fail<O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O> Copy for Fail<O> {}

impl<O> Grammar for Fail<O> {
    fn ebnf(&self, _defs: Option<&mut Definitions>) -> String {
        "fail".to_string()
    }
}

impl<S, O> Parser<S> for Fail<O> {
    type Output = O;

    #[inline(always)]
    fn parse(
        &self,
        _cursor: &mut Cursor<'_>,
        _out: Option<&mut O>,
        _state: &mut S,
    ) -> Result<bool, ParseError> {
        Ok(false)
    }
}
