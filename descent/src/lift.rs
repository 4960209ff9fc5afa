//! Semantic actions.
//!
//! [`all`] runs a tuple of parsers in order and, when every one of them
//! succeeds, hands their outputs to a callback that builds the result. [`any`]
//! tries a tuple of alternatives and hands the first match, tagged with its
//! position, to the callback.
//!
//! Callbacks receive the output slot by reference, so they can accumulate
//! (push onto a `Vec`, add to a sum) as well as replace. A callback that
//! returns an error aborts the parse with an [`ErrorKind::Action`] error
//! pointing at the start of the lifted rule.
//!
//! ```
//! # use descent::*;
//! #[derive(Debug, Default, PartialEq)]
//! enum Token {
//!     #[default]
//!     None,
//!     Number(u32),
//!     Word(String),
//! }
//!
//! let token = any(
//!     |token: &mut Token, alt: Alt2<String, String>| {
//!         *token = match alt {
//!             Alt2::A(digits) => Token::Number(digits.parse()?),
//!             Alt2::B(word) => Token::Word(word),
//!         };
//!         Ok(())
//!     },
//!     (some(accept(Digit)), some(accept(Alpha))),
//! );
//!
//! assert_eq!(parse(&token, "42", &mut ()).unwrap(), Some(Token::Number(42)));
//! assert_eq!(parse(&token, "abc", &mut ()).unwrap(), Some(Token::Word("abc".into())));
//! assert_eq!(token.ebnf(None), "{digit}- | {alphabetic}-");
//!
//! let err = parse(&token, "99999999999", &mut ()).unwrap_err();
//! assert_eq!(err.kind, ErrorKind::Action);
//! assert_eq!(err.column, 1);
//! ```

use std::marker::PhantomData;

use crate::{
    cursor::{Cursor, Position},
    error::{ErrorKind, ParseError},
    parser::{format_name, Definitions, Grammar, Parser, Rank},
};

/// A fixed-size group of grammars, as a tuple.
pub trait Group {
    fn items(&self) -> Vec<&dyn Grammar>;
}

/// A tuple of parsers run in sequence.
pub trait Steps<S>: Group {
    type Outputs;

    /// Run every step into a fresh output. `None` if a step failed.
    fn run(
        &self,
        cursor: &mut Cursor<'_>,
        state: &mut S,
    ) -> Result<Option<Self::Outputs>, ParseError>;
}

/// A tuple of parsers tried in order.
pub trait Alternatives<S>: Group {
    type Outputs;

    /// Output of the first alternative that matched. `None` if none did.
    fn run(
        &self,
        cursor: &mut Cursor<'_>,
        state: &mut S,
    ) -> Result<Option<Self::Outputs>, ParseError>;
}

macro_rules! impl_group {
    ($alt:ident; $($idx:tt $p:ident $v:ident),+) => {
        /// The output of the matching alternative, tagged by position.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $alt<$($v),+> {
            $($v($v)),+
        }

        impl<$($v),+> $alt<$($v),+> {
            /// Zero-based position of the alternative.
            pub fn index(&self) -> usize {
                match self {
                    $($alt::$v(_) => $idx),+
                }
            }
        }

        impl<$($p: Grammar),+> Group for ($($p,)+) {
            fn items(&self) -> Vec<&dyn Grammar> {
                vec![$(&self.$idx as &dyn Grammar),+]
            }
        }

        impl<S, $($p: Parser<S>),+> Steps<S> for ($($p,)+)
        where
            $($p::Output: Default),+
        {
            type Outputs = ($($p::Output,)+);

            fn run(
                &self,
                cursor: &mut Cursor<'_>,
                state: &mut S,
            ) -> Result<Option<Self::Outputs>, ParseError> {
                let mut outputs: Self::Outputs = Default::default();
                $(
                    if !self.$idx.parse(cursor, Some(&mut outputs.$idx), state)? {
                        return Ok(None);
                    }
                )+
                Ok(Some(outputs))
            }
        }

        impl<S, $($p: Parser<S>),+> Alternatives<S> for ($($p,)+)
        where
            $($p::Output: Default),+
        {
            type Outputs = $alt<$($p::Output),+>;

            fn run(
                &self,
                cursor: &mut Cursor<'_>,
                state: &mut S,
            ) -> Result<Option<Self::Outputs>, ParseError> {
                let start = cursor.position();
                $(
                    let mut value = Default::default();
                    if self.$idx.parse(cursor, Some(&mut value), state)? {
                        return Ok(Some($alt::$v(value)));
                    }
                    if cursor.offset() != start.offset {
                        return Err(ParseError::consumed(&self.$idx, start, cursor));
                    }
                )+
                Ok(None)
            }
        }
    };
}

impl_group!(Alt1; 0 P0 A);
impl_group!(Alt2; 0 P0 A, 1 P1 B);
impl_group!(Alt3; 0 P0 A, 1 P1 B, 2 P2 C);
impl_group!(Alt4; 0 P0 A, 1 P1 B, 2 P2 C, 3 P3 D);
impl_group!(Alt5; 0 P0 A, 1 P1 B, 2 P2 C, 3 P3 D, 4 P4 E);
impl_group!(Alt6; 0 P0 A, 1 P1 B, 2 P2 C, 3 P3 D, 4 P4 E, 5 P5 F);

/// A semantic action: combine `args` into the output slot.
pub trait Action<R, A, S> {
    fn call(&self, out: &mut R, args: A, state: &mut S) -> anyhow::Result<()>;
}

/// An action that ignores the external state.
#[derive(Debug, Clone, Copy)]
pub struct Pure<F>(pub F);

impl<R, A, S, F> Action<R, A, S> for Pure<F>
where
    F: Fn(&mut R, A) -> anyhow::Result<()>,
{
    #[inline(always)]
    fn call(&self, out: &mut R, args: A, _state: &mut S) -> anyhow::Result<()> {
        (self.0)(out, args)
    }
}

/// An action that also receives the external state.
#[derive(Debug, Clone, Copy)]
pub struct Stateful<F>(pub F);

impl<R, A, S, F> Action<R, A, S> for Stateful<F>
where
    F: Fn(&mut R, A, &mut S) -> anyhow::Result<()>,
{
    #[inline(always)]
    fn call(&self, out: &mut R, args: A, state: &mut S) -> anyhow::Result<()> {
        (self.0)(out, args, state)
    }
}

fn render(
    items: Vec<&dyn Grammar>,
    rank: Rank,
    separator: &str,
    mut defs: Option<&mut Definitions>,
) -> String {
    if let [item] = items.as_slice() {
        return item.ebnf(defs);
    }
    items
        .iter()
        .map(|item| format_name(*item, rank, defs.as_deref_mut()))
        .collect::<Vec<_>>()
        .join(separator)
}

fn group_rank(items: Vec<&dyn Grammar>, rank: Rank) -> Rank {
    match items.as_slice() {
        [item] => item.rank(),
        _ => rank,
    }
}

fn action_error<G: Grammar + ?Sized>(
    err: anyhow::Error,
    grammar: &G,
    start: Position,
    cursor: &Cursor<'_>,
) -> ParseError {
    ParseError::at(
        ErrorKind::Action,
        format!("{err:#}"),
        grammar,
        start,
        start,
        cursor,
    )
}

pub struct All<F, P, R> {
    action: F,
    steps: P,
    _phantom: PhantomData<fn() -> R>,
}

impl<F: Clone, P: Clone, R> Clone for All<F, P, R> {
    fn clone(&self) -> Self {
        All {
            action: self.action.clone(),
            steps: self.steps.clone(),
            _phantom: PhantomData,
        }
    }
}

/// Run every parser in `steps`, then call `f` with the output slot and a tuple
/// of their outputs.
///
/// The callback runs even when the caller passes no output slot (it then gets a
/// scratch value), so effects on the external state are never skipped.
pub fn all<R, P, F, A>(f: F, steps: P) -> All<Pure<F>, P, R>
where
    P: Group,
    F: Fn(&mut R, A) -> anyhow::Result<()>,
{
    All {
        action: Pure(f),
        steps,
        _phantom: PhantomData,
    }
}

/// Like [`all`], with the external state passed to the callback.
pub fn all_with<R, S, P, F, A>(f: F, steps: P) -> All<Stateful<F>, P, R>
where
    P: Group,
    F: Fn(&mut R, A, &mut S) -> anyhow::Result<()>,
{
    All {
        action: Stateful(f),
        steps,
        _phantom: PhantomData,
    }
}

impl<F, P: Group, R> Grammar for All<F, P, R> {
    fn ebnf(&self, defs: Option<&mut Definitions>) -> String {
        render(self.steps.items(), Rank::Sequence, ", ", defs)
    }

    fn rank(&self) -> Rank {
        group_rank(self.steps.items(), Rank::Sequence)
    }

    fn has_side_effects(&self) -> bool {
        true
    }
}

impl<S, F, P, R> Parser<S> for All<F, P, R>
where
    P: Steps<S>,
    F: Action<R, P::Outputs, S>,
    R: Default,
{
    type Output = R;

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut R>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        let start = cursor.position();
        let Some(outputs) = self.steps.run(cursor, state)? else {
            return Ok(false);
        };
        let mut scratch;
        let out = match out {
            Some(out) => out,
            None => {
                scratch = R::default();
                &mut scratch
            }
        };
        self.action
            .call(out, outputs, state)
            .map_err(|err| action_error(err, self, start, cursor))?;
        Ok(true)
    }
}

pub struct Any<F, P, R> {
    action: F,
    alternatives: P,
    _phantom: PhantomData<fn() -> R>,
}

impl<F: Clone, P: Clone, R> Clone for Any<F, P, R> {
    fn clone(&self) -> Self {
        Any {
            action: self.action.clone(),
            alternatives: self.alternatives.clone(),
            _phantom: PhantomData,
        }
    }
}

/// Try the parsers in `alternatives` in order, then call `f` with the output
/// slot and the first match, tagged with its position (`Alt1` to `Alt6`).
///
/// An alternative that fails after consuming input is a fatal error, as in
/// [`choice`](crate::choice).
pub fn any<R, P, F, A>(f: F, alternatives: P) -> Any<Pure<F>, P, R>
where
    P: Group,
    F: Fn(&mut R, A) -> anyhow::Result<()>,
{
    Any {
        action: Pure(f),
        alternatives,
        _phantom: PhantomData,
    }
}

/// Like [`any`], with the external state passed to the callback.
pub fn any_with<R, S, P, F, A>(f: F, alternatives: P) -> Any<Stateful<F>, P, R>
where
    P: Group,
    F: Fn(&mut R, A, &mut S) -> anyhow::Result<()>,
{
    Any {
        action: Stateful(f),
        alternatives,
        _phantom: PhantomData,
    }
}

impl<F, P: Group, R> Grammar for Any<F, P, R> {
    fn ebnf(&self, defs: Option<&mut Definitions>) -> String {
        render(self.alternatives.items(), Rank::Choice, " | ", defs)
    }

    fn rank(&self) -> Rank {
        group_rank(self.alternatives.items(), Rank::Choice)
    }

    fn has_side_effects(&self) -> bool {
        true
    }
}

impl<S, F, P, R> Parser<S> for Any<F, P, R>
where
    P: Alternatives<S>,
    F: Action<R, P::Outputs, S>,
    R: Default,
{
    type Output = R;

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut R>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        let start = cursor.position();
        let Some(matched) = self.alternatives.run(cursor, state)? else {
            return Ok(false);
        };
        let mut scratch;
        let out = match out {
            Some(out) => out,
            None => {
                scratch = R::default();
                &mut scratch
            }
        };
        self.action
            .call(out, matched, state)
            .map_err(|err| action_error(err, self, start, cursor))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        combinator::{discard, many, sequence, some},
        predicate::{Alpha, Char, Digit, Space},
        primitive::{accept, literal},
    };

    fn run<P: Parser<S>, S>(p: &P, input: &str, state: &mut S) -> Result<Option<P::Output>, ParseError>
    where
        P::Output: Default,
    {
        let mut cursor = Cursor::new(input);
        let mut out = P::Output::default();
        Ok(p.parse(&mut cursor, Some(&mut out), state)?.then_some(out))
    }

    #[test]
    fn all_collects_every_output() {
        let pair = all(
            |out: &mut (String, String), (key, _, value): (String, String, String)| {
                *out = (key, value);
                Ok(())
            },
            (some(accept(Alpha)), accept(Char('=')), some(accept(Digit))),
        );
        assert_eq!(
            run(&pair, "x=10", &mut ()).unwrap(),
            Some(("x".to_string(), "10".to_string()))
        );
        assert_eq!(run(&pair, "=10", &mut ()).unwrap(), None);
        assert_eq!(pair.ebnf(None), "{alphabetic}-, '=', {digit}-");
    }

    #[test]
    fn outputs_accumulate_across_repetitions() {
        let number = all(
            |sum: &mut u32, (digits,): (String,)| {
                *sum += digits.parse::<u32>()?;
                Ok(())
            },
            (sequence(some(accept(Digit)), discard(many(accept(Space)))),),
        );
        assert_eq!(run(&many(number), "1 2 39", &mut ()).unwrap(), Some(42));
    }

    #[test]
    fn single_step_renders_as_its_step() {
        let p = all(
            |_: &mut (), (_,): (String,)| Ok(()),
            (sequence(literal("a"), literal("b")),),
        );
        assert_eq!(p.ebnf(None), "\"a\", \"b\"");
        assert_eq!(p.rank(), Rank::Sequence);
    }

    #[test]
    fn callbacks_see_the_external_state() {
        let word = all_with(
            |_: &mut (), (w,): (String,), seen: &mut Vec<String>| {
                seen.push(w);
                Ok(())
            },
            (sequence(some(accept(Alpha)), discard(many(accept(Space)))),),
        );
        let mut seen = Vec::new();
        let mut cursor = Cursor::new("ab cd");
        assert_eq!(many(word).parse(&mut cursor, None, &mut seen), Ok(true));
        assert_eq!(seen, ["ab", "cd"]);
    }

    #[test]
    fn any_tags_the_alternative() {
        let p = any_with(
            |out: &mut usize, alt: Alt3<String, String, String>, count: &mut u32| {
                *count += 1;
                *out = alt.index();
                Ok(())
            },
            (accept(Digit), accept(Alpha), literal("--")),
        );
        let mut count = 0;
        assert_eq!(run(&p, "7", &mut count).unwrap(), Some(0));
        assert_eq!(run(&p, "--", &mut count).unwrap(), Some(2));
        assert_eq!(run(&p, "?", &mut count).unwrap(), None);
        assert_eq!(count, 2);
        assert_eq!(p.ebnf(None), "digit | alphabetic | \"--\"");
    }

    #[test]
    fn any_rejects_partial_consumption() {
        let p = any(
            |_: &mut (), _: Alt2<String, String>| Ok(()),
            (sequence(literal("a"), literal("b")), literal("ac")),
        );
        let err = run(&p, "ac", &mut ()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Consumed);
        assert_eq!(err.expected, "\"a\", \"b\"");
    }

    #[test]
    fn action_errors_point_at_the_rule_start() {
        let p = sequence(
            many(accept(Space)),
            all(
                |_: &mut String, (w,): (String,)| {
                    anyhow::ensure!(w != "bad", "reserved word {w:?}");
                    Ok(())
                },
                (some(accept(Alpha)),),
            ),
        );
        let err = run(&p, "  bad", &mut ()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Action);
        assert_eq!(err.message, "reserved word \"bad\"");
        assert_eq!((err.row, err.column), (1, 3));
        assert_eq!(err.span.start, 2);
        assert_eq!(err.span.end, 5);
    }
}
