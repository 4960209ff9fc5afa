//! Token-level parsing.
//!
//! The convention is that every token consumes the layout (whitespace) that
//! follows it, so the cursor always rests on the first symbol of the next
//! token. Leading layout is skipped once, with [`first_token`], before the
//! first token is read.
//!
//! ```
//! # use descent::*;
//! let word = token(some(accept(Alpha)));
//! let words = sequence(first_token(), many(word));
//! assert_eq!(parse(&words, "  hello \n world ", &mut ()).unwrap(), Some("helloworld".to_string()));
//! ```

use crate::{
    combinator::{discard, many, Discard, Repeat},
    cursor::Cursor,
    error::ParseError,
    parser::{Definitions, Grammar, Parser, Rank},
    predicate::{Predicate, Space},
    primitive::{accept, Accept},
};

/// See [`token`].
#[derive(Debug, Clone, Copy)]
pub struct Token<P> {
    pub parser: P,
}

/// Run `parser`, then skip any whitespace after it.
///
/// The layout is not part of the rendered grammar.
pub fn token<P>(parser: P) -> Token<P> {
    Token { parser }
}

impl<P: Grammar> Grammar for Token<P> {
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

impl<S, P: Parser<S>> Parser<S> for Token<P> {
    type Output = P::Output;

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut Self::Output>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        if !self.parser.parse(cursor, out, state)? {
            return Ok(false);
        }
        while Space.matches(cursor.peek()) {
            cursor.advance();
        }
        Ok(true)
    }
}

/// Skip leading whitespace. Always succeeds.
pub fn first_token<O>() -> Discard<Repeat<Accept<Space>>, O> {
    discard(many(accept(Space)))
}
