//! The combinator algebra.
//!
//! All combinators here are plain values. They share the no-partial-consumption
//! discipline: a combinator that tries alternatives (`choice`, `many`, `option`,
//! `sep_by`) checks that a failed branch left the cursor untouched, and reports
//! [`ErrorKind::Consumed`] otherwise. Wrap a branch in [`attempt`] to allow it
//! to fail after consuming input.

use std::{fmt::Debug, marker::PhantomData};

use crate::{
    cursor::Cursor,
    error::{ErrorKind, ParseError},
    parser::{format_name, Definitions, Grammar, Parser, Rank},
};

#[derive(Debug, Clone, Copy)]
pub struct Sequence<A, B> {
    pub first: A,
    pub second: B,
}

/// Run `first`, then `second`, into the same output.
pub fn sequence<A, B>(first: A, second: B) -> Sequence<A, B> {
    Sequence { first, second }
}

impl<A: Grammar, B: Grammar> Grammar for Sequence<A, B> {
    fn ebnf(&self, mut defs: Option<&mut Definitions>) -> String {
        let first = format_name(&self.first, Rank::Sequence, defs.as_deref_mut());
        let second = format_name(&self.second, Rank::Sequence, defs);
        format!("{first}, {second}")
    }

    fn rank(&self) -> Rank {
        Rank::Sequence
    }

    fn has_side_effects(&self) -> bool {
        self.first.has_side_effects() || self.second.has_side_effects()
    }
}

impl<S, A, B> Parser<S> for Sequence<A, B>
where
    A: Parser<S>,
    B: Parser<S, Output = A::Output>,
{
    type Output = A::Output;

    #[inline]
    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        mut out: Option<&mut Self::Output>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        Ok(self.first.parse(cursor, out.as_deref_mut(), state)?
            && self.second.parse(cursor, out, state)?)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Choice<A, B> {
    pub first: A,
    pub second: B,
}

/// Ordered choice: `second` runs only when `first` fails without consuming.
pub fn choice<A, B>(first: A, second: B) -> Choice<A, B> {
    Choice { first, second }
}

impl<A: Grammar, B: Grammar> Grammar for Choice<A, B> {
    fn ebnf(&self, mut defs: Option<&mut Definitions>) -> String {
        let first = format_name(&self.first, Rank::Choice, defs.as_deref_mut());
        let second = format_name(&self.second, Rank::Choice, defs);
        format!("{first} | {second}")
    }

    fn rank(&self) -> Rank {
        Rank::Choice
    }

    fn has_side_effects(&self) -> bool {
        self.first.has_side_effects() || self.second.has_side_effects()
    }
}

impl<S, A, B> Parser<S> for Choice<A, B>
where
    A: Parser<S>,
    B: Parser<S, Output = A::Output>,
{
    type Output = A::Output;

    #[inline]
    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        mut out: Option<&mut Self::Output>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        let start = cursor.position();
        if self.first.parse(cursor, out.as_deref_mut(), state)? {
            return Ok(true);
        }
        if cursor.offset() != start.offset {
            return Err(ParseError::consumed(&self.first, start, cursor));
        }
        self.second.parse(cursor, out, state)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Repeat<P> {
    parser: P,
    at_least: usize,
}

/// Zero or more repetitions. Never fails.
///
/// Repetition stops at the first failure, or after an iteration that succeeds
/// without consuming input.
pub fn many<P>(parser: P) -> Repeat<P> {
    Repeat {
        parser,
        at_least: 0,
    }
}

/// One or more repetitions.
pub fn some<P>(parser: P) -> Repeat<P> {
    Repeat {
        parser,
        at_least: 1,
    }
}

impl<P: Grammar> Grammar for Repeat<P> {
    fn ebnf(&self, defs: Option<&mut Definitions>) -> String {
        let inner = self.parser.ebnf(defs);
        if self.at_least == 0 {
            format!("{{{inner}}}")
        } else {
            format!("{{{inner}}}-")
        }
    }

    fn has_side_effects(&self) -> bool {
        self.parser.has_side_effects()
    }
}

impl<S, P: Parser<S>> Parser<S> for Repeat<P> {
    type Output = P::Output;

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        mut out: Option<&mut Self::Output>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        let mut count = 0;
        loop {
            let start = cursor.position();
            if !self.parser.parse(cursor, out.as_deref_mut(), state)? {
                if cursor.offset() != start.offset {
                    return Err(ParseError::new(
                        ErrorKind::Consumed,
                        "failed many-parser consumed input",
                        &self.parser,
                        start,
                        cursor,
                    ));
                }
                break;
            }
            count += 1;
            if cursor.offset() == start.offset {
                break;
            }
        }
        Ok(count >= self.at_least)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Optional<P> {
    pub parser: P,
}

/// Zero or one occurrence. Never fails.
pub fn option<P>(parser: P) -> Optional<P> {
    Optional { parser }
}

impl<P: Grammar> Grammar for Optional<P> {
    fn ebnf(&self, defs: Option<&mut Definitions>) -> String {
        format!("[{}]", self.parser.ebnf(defs))
    }

    fn has_side_effects(&self) -> bool {
        self.parser.has_side_effects()
    }
}

impl<S, P: Parser<S>> Parser<S> for Optional<P> {
    type Output = P::Output;

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut Self::Output>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        let start = cursor.position();
        if !self.parser.parse(cursor, out, state)? && cursor.offset() != start.offset {
            return Err(ParseError::consumed(&self.parser, start, cursor));
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SepBy<P, Q> {
    pub item: P,
    pub separator: Q,
}

/// One or more `item`s separated by `separator`, whose output is dropped.
///
/// ```
/// # use descent::*;
/// let list = sep_by(some(accept(Digit)), accept(Char(',')));
/// assert_eq!(parse(&list, "1,22,3;", &mut ()).unwrap(), Some("1223".to_string()));
/// assert_eq!(list.ebnf(None), "{digit}-, {',', {digit}-}");
/// ```
pub fn sep_by<P, Q>(item: P, separator: Q) -> SepBy<P, Q> {
    SepBy { item, separator }
}

impl<P: Grammar, Q: Grammar> Grammar for SepBy<P, Q> {
    fn ebnf(&self, mut defs: Option<&mut Definitions>) -> String {
        let item = format_name(&self.item, Rank::Sequence, defs.as_deref_mut());
        let separator = format_name(&self.separator, Rank::Sequence, defs.as_deref_mut());
        let again = format_name(&self.item, Rank::Sequence, defs);
        format!("{item}, {{{separator}, {again}}}")
    }

    fn rank(&self) -> Rank {
        Rank::Sequence
    }

    fn has_side_effects(&self) -> bool {
        self.item.has_side_effects() || self.separator.has_side_effects()
    }
}

impl<S, P: Parser<S>, Q: Parser<S>> Parser<S> for SepBy<P, Q> {
    type Output = P::Output;

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        mut out: Option<&mut Self::Output>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        if !self.item.parse(cursor, out.as_deref_mut(), state)? {
            return Ok(false);
        }
        loop {
            let start = cursor.position();
            let matched = self.separator.parse(cursor, None, state)?
                && self.item.parse(cursor, out.as_deref_mut(), state)?;
            if !matched {
                if cursor.offset() != start.offset {
                    return Err(ParseError::new(
                        ErrorKind::Consumed,
                        "failed many-parser consumed input",
                        self,
                        start,
                        cursor,
                    ));
                }
                break;
            }
            if cursor.offset() == start.offset {
                break;
            }
        }
        Ok(true)
    }
}

pub struct Discard<P, O> {
    pub parser: P,
    _phantom: PhantomData<fn() -> O>,
}

/// Run `parser` for its success alone. The output type is free, so a discarded
/// recognizer fits into any typed context.
pub fn discard<P, O>(parser: P) -> Discard<P, O> {
    Discard {
        parser,
        _phantom: PhantomData,
    }
}

impl<P: Clone, O> Clone for Discard<P, O> {
    fn clone(&self) -> Self {
        discard(self.parser.clone())
    }
}

impl<P: Grammar, O> Grammar for Discard<P, O> {
    fn ebnf(&self, defs: Option<&mut Definitions>) -> String {
        self.parser.ebnf(defs)
    }

    fn rank(&self) -> Rank {
        self.parser.rank()
    }

    fn has_side_effects(&self) -> bool {
        self.parser.has_side_effects()
    }
}

impl<S, P: Parser<S>, O> Parser<S> for Discard<P, O> {
    type Output = O;

    #[inline(always)]
    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        _out: Option<&mut O>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        self.parser.parse(cursor, None, state)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Except<P, T> {
    pub parser: P,
    pub forbidden: T,
}

/// Run `parser`, but fail if its result equals `forbidden`.
///
/// The result replaces the contents of the output slot. When the forbidden
/// value is matched, the cursor returns to where `parser` started, and so does
/// the external state if `parser` has side effects. Any other mismatch is
/// passed on as is, consumed input included.
///
/// ```
/// # use descent::*;
/// let name = except(some(accept(Alpha)), "let");
/// assert_eq!(parse(&name, "lettuce", &mut ()).unwrap(), Some("lettuce".to_string()));
/// assert_eq!(parse(&name, "let", &mut ()).unwrap(), None);
/// assert_eq!(name.ebnf(None), "{alphabetic}- - \"let\"");
/// ```
pub fn except<P, T>(parser: P, forbidden: T) -> Except<P, T> {
    Except { parser, forbidden }
}

impl<P: Grammar, T: Debug> Grammar for Except<P, T> {
    fn ebnf(&self, defs: Option<&mut Definitions>) -> String {
        format!(
            "{} - {:?}",
            format_name(&self.parser, Rank::Except, defs),
            self.forbidden
        )
    }

    fn rank(&self) -> Rank {
        Rank::Except
    }

    fn has_side_effects(&self) -> bool {
        self.parser.has_side_effects()
    }
}

impl<S, P, T> Parser<S> for Except<P, T>
where
    S: Clone,
    P: Parser<S>,
    P::Output: PartialEq<T> + Default,
    T: Debug,
{
    type Output = P::Output;

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut Self::Output>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        let saved_state = self.parser.has_side_effects().then(|| state.clone());
        let mut value = P::Output::default();
        cursor.checkpoint();
        match self.parser.parse(cursor, Some(&mut value), state) {
            Ok(true) if value == self.forbidden => {
                log::trace!("rejected {:?} at offset {}", self.forbidden, cursor.offset());
                cursor.backtrack();
                if let Some(saved) = saved_state {
                    *state = saved;
                }
                Ok(false)
            }
            Ok(true) => {
                cursor.commit();
                if let Some(out) = out {
                    *out = value;
                }
                Ok(true)
            }
            // A mismatch keeps whatever it consumed, for the enclosing
            // combinator to check.
            result => {
                cursor.commit();
                result
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Attempt<P> {
    pub parser: P,
}

/// Speculative parsing: if `parser` fails, return the cursor, the output slot
/// and (when `parser` may run user code) the external state to where they were.
///
/// Fatal errors are still propagated, after the rollback.
pub fn attempt<P>(parser: P) -> Attempt<P> {
    Attempt { parser }
}

impl<P: Grammar> Grammar for Attempt<P> {
    fn ebnf(&self, defs: Option<&mut Definitions>) -> String {
        self.parser.ebnf(defs)
    }

    fn rank(&self) -> Rank {
        self.parser.rank()
    }

    fn has_side_effects(&self) -> bool {
        self.parser.has_side_effects()
    }
}

impl<S, P> Parser<S> for Attempt<P>
where
    S: Clone,
    P: Parser<S>,
    P::Output: Clone,
{
    type Output = P::Output;

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut Self::Output>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        let saved_state = self.parser.has_side_effects().then(|| state.clone());
        speculate(&self.parser, cursor, out, state, |state| {
            if let Some(saved) = saved_state {
                *state = saved;
            }
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AttemptPure<P> {
    pub parser: P,
}

/// Like [`attempt`], but the external state is never snapshotted, so it need
/// not be `Clone`.
///
/// Only the cursor and the output slot are rolled back. Use it for parsers
/// whose actions do not touch the state.
///
/// ```
/// # use descent::*;
/// struct Symbols(Vec<String>);
///
/// let arrow = attempt_pure(sequence(accept(Char('-')), accept(Char('>'))));
/// let op = choice(arrow, literal("-"));
/// let mut symbols = Symbols(Vec::new());
/// assert_eq!(parse(&op, "-1", &mut symbols).unwrap(), Some("-".to_string()));
/// assert!(symbols.0.is_empty());
/// ```
pub fn attempt_pure<P>(parser: P) -> AttemptPure<P> {
    AttemptPure { parser }
}

impl<P: Grammar> Grammar for AttemptPure<P> {
    fn ebnf(&self, defs: Option<&mut Definitions>) -> String {
        self.parser.ebnf(defs)
    }

    fn rank(&self) -> Rank {
        self.parser.rank()
    }

    fn has_side_effects(&self) -> bool {
        self.parser.has_side_effects()
    }
}

impl<S, P> Parser<S> for AttemptPure<P>
where
    P: Parser<S>,
    P::Output: Clone,
{
    type Output = P::Output;

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut Self::Output>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        speculate(&self.parser, cursor, out, state, |_| {})
    }
}

/// Run `parser` under a checkpoint. On anything but a match, roll back the
/// cursor and the output slot, then let `restore` roll back the state.
fn speculate<S, P>(
    parser: &P,
    cursor: &mut Cursor<'_>,
    mut out: Option<&mut P::Output>,
    state: &mut S,
    restore: impl FnOnce(&mut S),
) -> Result<bool, ParseError>
where
    P: Parser<S>,
    P::Output: Clone,
{
    let saved_out = out.as_deref().cloned();
    let start = cursor.offset();
    cursor.checkpoint();
    let result = parser.parse(cursor, out.as_deref_mut(), state);
    if let Ok(true) = result {
        cursor.commit();
        return result;
    }
    log::trace!(
        "backtracking from {} to {start} after {}",
        cursor.offset(),
        parser.ebnf(None)
    );
    cursor.backtrack();
    restore(state);
    if let (Some(out), Some(saved)) = (out, saved_out) {
        *out = saved;
    }
    result
}

#[derive(Debug, Clone)]
pub struct Strict<P> {
    pub message: String,
    pub parser: P,
}

/// Turn a mismatch of `parser` into a fatal error carrying `message`.
pub fn strict<P>(message: impl Into<String>, parser: P) -> Strict<P> {
    Strict {
        message: message.into(),
        parser,
    }
}

impl<P: Grammar> Grammar for Strict<P> {
    fn ebnf(&self, defs: Option<&mut Definitions>) -> String {
        self.parser.ebnf(defs)
    }

    fn rank(&self) -> Rank {
        self.parser.rank()
    }

    fn has_side_effects(&self) -> bool {
        self.parser.has_side_effects()
    }
}

impl<S, P: Parser<S>> Parser<S> for Strict<P> {
    type Output = P::Output;

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut Self::Output>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        let start = cursor.position();
        if self.parser.parse(cursor, out, state)? {
            Ok(true)
        } else {
            Err(ParseError::new(
                ErrorKind::Strict,
                self.message.clone(),
                &self.parser,
                start,
                cursor,
            ))
        }
    }
}

#[derive(Debug, Clone)]
pub struct Trace<P> {
    pub label: String,
    pub parser: P,
}

/// Log every run of `parser` under `label`: matches at debug level, mismatches
/// and errors at trace level.
pub fn trace<P>(label: impl Into<String>, parser: P) -> Trace<P> {
    Trace {
        label: label.into(),
        parser,
    }
}

impl<P: Grammar> Grammar for Trace<P> {
    fn ebnf(&self, defs: Option<&mut Definitions>) -> String {
        self.parser.ebnf(defs)
    }

    fn rank(&self) -> Rank {
        self.parser.rank()
    }

    fn has_side_effects(&self) -> bool {
        self.parser.has_side_effects()
    }
}

impl<S, P: Parser<S>> Parser<S> for Trace<P> {
    type Output = P::Output;

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut Self::Output>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        let start = cursor.position();
        let result = self.parser.parse(cursor, out, state);
        match &result {
            Ok(true) => {
                let span = cursor.span_from(start);
                log::debug!(
                    "{}: matched {:?} at {}:{}",
                    self.label,
                    &cursor.input()[span.start..span.end],
                    start.row,
                    start.column
                );
            }
            Ok(false) => log::trace!("{}: no match at {}:{}", self.label, start.row, start.column),
            Err(err) => log::trace!("{}: {err}", self.label),
        }
        result
    }
}
