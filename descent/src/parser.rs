//! Basic definitions for working with parsers.
//!
//! If you're looking for a convenient way to parse data, you don't need to dive into
//! the details of the parser. The [`parse`](crate::parse) function abstracts away
//! the cursor and the output slot.
//!
//! However, if you're interested in how the combinators work under the hood, or want
//! to write your own, read on.

use std::rc::Rc;

use hashlink::LinkedHashMap;
use rustc_hash::FxBuildHasher;

use crate::{cursor::Cursor, error::ParseError};

/// Named rule definitions collected while rendering EBNF, in the order the
/// rules were first reached.
pub type Definitions = LinkedHashMap<String, String, FxBuildHasher>;

/// EBNF precedence of a rendered grammar fragment, from tightest to loosest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    /// Names, literals and bracketed forms.
    Atom,
    /// `a - b`
    Except,
    /// `a, b`
    Sequence,
    /// `a | b`
    Choice,
}

/// The description of a grammar rule.
///
/// Every parser is also a grammar: it can render itself as EBNF for
/// diagnostics. When `defs` is given, named rules reached during rendering are
/// recorded there exactly once, and the rendering refers to them by name.
pub trait Grammar {
    fn ebnf(&self, defs: Option<&mut Definitions>) -> String;

    fn rank(&self) -> Rank {
        Rank::Atom
    }

    /// Whether running this rule may call user code, which could change the
    /// external state. [`attempt`](crate::attempt) snapshots the state only when
    /// this is set.
    fn has_side_effects(&self) -> bool {
        false
    }
}

/// A parser over the external state `S`.
///
/// # Writing a Parser
///
/// [`parse`](Parser::parse) returns `Ok(true)` on success, `Ok(false)` for an
/// ordinary mismatch and `Err` for a fatal error. A mismatch must leave the
/// cursor where it was, otherwise the enclosing combinator reports the grammar
/// as broken. On success the parser may write its result into `out`; results
/// accumulate, so a recognizer appends to a `String` rather than replacing it.
///
/// ```
/// # use descent::*;
/// struct Ab;
///
/// impl Grammar for Ab {
///     fn ebnf(&self, _defs: Option<&mut Definitions>) -> String {
///         "\"ab\"".to_string()
///     }
/// }
///
/// impl<S> Parser<S> for Ab {
///     type Output = String;
///
///     fn parse(
///         &self,
///         cursor: &mut Cursor<'_>,
///         out: Option<&mut String>,
///         _state: &mut S,
///     ) -> Result<bool, ParseError> {
///         if !cursor.rest().starts_with("ab") {
///             return Ok(false);
///         }
///         cursor.advance_to(cursor.offset() + 2);
///         if let Some(out) = out {
///             out.push_str("ab");
///         }
///         Ok(true)
///     }
/// }
///
/// assert_eq!(parse(&many(Ab), "ababc", &mut ()).unwrap(), Some("abab".to_string()));
/// ```
pub trait Parser<S = ()>: Grammar {
    type Output;

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut Self::Output>,
        state: &mut S,
    ) -> Result<bool, ParseError>;
}

/// Render `grammar`, parenthesized if it binds looser than `rank`.
pub fn format_name<G: Grammar + ?Sized>(
    grammar: &G,
    rank: Rank,
    defs: Option<&mut Definitions>,
) -> String {
    if grammar.rank() > rank {
        format!("({})", grammar.ebnf(defs))
    } else {
        grammar.ebnf(defs)
    }
}

macro_rules! impl_grammar_for_pointer {
    ($($ptr:ty),+$(,)?) => {
        $(
            impl<G: Grammar + ?Sized> Grammar for $ptr {
                fn ebnf(&self, defs: Option<&mut Definitions>) -> String {
                    (**self).ebnf(defs)
                }

                fn rank(&self) -> Rank {
                    (**self).rank()
                }

                fn has_side_effects(&self) -> bool {
                    (**self).has_side_effects()
                }
            }

            impl<S, G: Parser<S> + ?Sized> Parser<S> for $ptr {
                type Output = G::Output;

                #[inline(always)]
                fn parse(
                    &self,
                    cursor: &mut Cursor<'_>,
                    out: Option<&mut Self::Output>,
                    state: &mut S,
                ) -> Result<bool, ParseError> {
                    (**self).parse(cursor, out, state)
                }
            }
        )+
    };
}

impl_grammar_for_pointer! {
    &G,
    Box<G>,
    Rc<G>,
}
