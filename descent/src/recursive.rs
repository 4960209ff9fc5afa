//! Self-referential grammars.
//!
//! There are two ways to build a rule that refers to itself. A [`Handle`] is
//! declared empty, captured by the parsers that need it, and defined once
//! they exist:
//!
//! ```
//! # use descent::*;
//! let arena = Arena::new();
//! let nested = Handle::<String>::declare(&arena);
//! nested.define(choice(
//!     sequence(
//!         accept(Char('[')),
//!         sequence(many(reference("nested", nested.clone())), accept(Char(']'))),
//!     ),
//!     literal("x"),
//! ));
//! assert_eq!(parse(&nested, "[x[x]]", &mut ()).unwrap(), Some("[x[x]]".to_string()));
//! ```
//!
//! For a single rule, [`fix`] does the same in one step. Either way, wrap the
//! recursive occurrence in a named [`reference`] so that rendering the grammar
//! prints the rule once under its name instead of expanding it forever.
//!
//! Handles and fixed points share their rule through `Rc`, so a grammar that
//! contains one stays on the thread that built it.

use std::{
    cell::OnceCell,
    rc::{Rc, Weak},
};

use crate::{
    arena::{Arena, Slot},
    cursor::Cursor,
    error::ParseError,
    parser::{Definitions, Grammar, Parser, Rank},
};

type Dyn<O, S> = Box<dyn Parser<S, Output = O>>;

/// A grammar rule that is assigned after it is referenced.
pub struct Handle<O, S = ()> {
    slot: Slot<Dyn<O, S>>,
}

impl<O, S> Clone for Handle<O, S> {
    fn clone(&self) -> Self {
        Handle {
            slot: self.slot.clone(),
        }
    }
}

impl<O: 'static, S: 'static> Handle<O, S> {
    pub fn declare(arena: &Rc<Arena>) -> Self {
        Handle {
            slot: arena.alloc(),
        }
    }

    /// Assign the rule.
    ///
    /// # Panics
    /// Panics if the handle was already defined, or if its arena was dropped.
    pub fn define(&self, parser: impl Parser<S, Output = O> + 'static) {
        self.slot.store(Box::new(parser));
    }
}

impl<O: 'static, S: 'static> Grammar for Handle<O, S> {
    fn ebnf(&self, defs: Option<&mut Definitions>) -> String {
        let Some(parser) = self.slot.get() else {
            return "?".to_string();
        };
        if !self.slot.enter() {
            return "...".to_string();
        }
        let rendered = parser.ebnf(defs);
        self.slot.leave();
        rendered
    }

    fn rank(&self) -> Rank {
        match self.slot.get() {
            Some(parser) if self.slot.enter() => {
                let rank = parser.rank();
                self.slot.leave();
                rank
            }
            _ => Rank::Atom,
        }
    }

    // The assigned rule is unknown when the handle is captured.
    fn has_side_effects(&self) -> bool {
        true
    }
}

impl<O: 'static, S: 'static> Parser<S> for Handle<O, S> {
    type Output = O;

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut O>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        match self.slot.get() {
            Some(parser) => parser.parse(cursor, out, state),
            None => Err(ParseError::undefined(cursor)),
        }
    }
}

/// See [`reference`].
#[derive(Debug, Clone)]
pub struct Reference<P> {
    name: String,
    parser: P,
}

/// Give `parser` a name for diagnostics.
///
/// A reference always renders as its name. When definitions are collected,
/// the first reference to reach a name records the definition; cycles back to
/// the same name stop there.
pub fn reference<P>(name: impl Into<String>, parser: P) -> Reference<P> {
    Reference {
        name: name.into(),
        parser,
    }
}

impl<P: Grammar> Grammar for Reference<P> {
    fn ebnf(&self, defs: Option<&mut Definitions>) -> String {
        if let Some(defs) = defs {
            if !defs.contains_key(&self.name) {
                defs.insert(self.name.clone(), self.name.clone());
                let body = self.parser.ebnf(Some(&mut *defs));
                if let Some(definition) = defs.get_mut(&self.name) {
                    *definition = body;
                }
            }
        }
        self.name.clone()
    }

    fn has_side_effects(&self) -> bool {
        self.parser.has_side_effects()
    }
}

impl<S, P: Parser<S>> Parser<S> for Reference<P> {
    type Output = P::Output;

    #[inline(always)]
    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut Self::Output>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        self.parser.parse(cursor, out, state)
    }
}

/// See [`define`].
#[derive(Debug, Clone)]
pub struct Define<P> {
    name: String,
    parser: P,
}

/// Name a sub-rule so that diagnostics list it separately.
///
/// Unlike [`reference`], the sub-rule is recorded after its body has been
/// rendered, so it must not be part of a cycle.
///
/// ```
/// # use descent::*;
/// let number = define("number", some(accept(Digit)));
/// let sum = sequence(number.clone(), sequence(literal("+"), number));
///
/// let mut defs = Definitions::default();
/// assert_eq!(sum.ebnf(Some(&mut defs)), "number, \"+\", number");
/// assert_eq!(defs["number"], "{digit}-");
/// ```
pub fn define<P>(name: impl Into<String>, parser: P) -> Define<P> {
    Define {
        name: name.into(),
        parser,
    }
}

impl<P: Grammar> Grammar for Define<P> {
    fn ebnf(&self, defs: Option<&mut Definitions>) -> String {
        if let Some(defs) = defs {
            if !defs.contains_key(&self.name) {
                let body = self.parser.ebnf(Some(&mut *defs));
                defs.insert(self.name.clone(), body);
            }
        }
        self.name.clone()
    }

    fn has_side_effects(&self) -> bool {
        self.parser.has_side_effects()
    }
}

impl<S, P: Parser<S>> Parser<S> for Define<P> {
    type Output = P::Output;

    #[inline(always)]
    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut Self::Output>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        self.parser.parse(cursor, out, state)
    }
}

/// See [`rename`].
#[derive(Debug, Clone)]
pub struct Rename<P> {
    name: String,
    rank: Rank,
    parser: P,
}

/// Render `parser` as `name`, at precedence `rank`.
///
/// The body is never rendered, so nothing is recorded in the definitions.
///
/// ```
/// # use descent::*;
/// let sign = rename("sign", Rank::Atom, accept(Char('+').or(Char('-'))));
/// let number = sequence(option(sign), some(accept(Digit)));
/// assert_eq!(number.ebnf(None), "[sign], {digit}-");
/// assert_eq!(parse(&number, "-12", &mut ()).unwrap(), Some("-12".to_string()));
/// ```
pub fn rename<P>(name: impl Into<String>, rank: Rank, parser: P) -> Rename<P> {
    Rename {
        name: name.into(),
        rank,
        parser,
    }
}

impl<P: Grammar> Grammar for Rename<P> {
    fn ebnf(&self, _defs: Option<&mut Definitions>) -> String {
        self.name.clone()
    }

    fn rank(&self) -> Rank {
        self.rank
    }

    fn has_side_effects(&self) -> bool {
        self.parser.has_side_effects()
    }
}

impl<S, P: Parser<S>> Parser<S> for Rename<P> {
    type Output = P::Output;

    #[inline(always)]
    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut Self::Output>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        self.parser.parse(cursor, out, state)
    }
}

type FixCell<O, S> = OnceCell<Dyn<O, S>>;

/// A rule built by [`fix`].
pub struct Fix<O, S = ()> {
    name: String,
    cell: Rc<FixCell<O, S>>,
}

impl<O, S> Clone for Fix<O, S> {
    fn clone(&self) -> Self {
        Fix {
            name: self.name.clone(),
            cell: self.cell.clone(),
        }
    }
}

/// The recursive occurrence of a [`Fix`] rule inside its own body.
pub struct Recur<O, S = ()> {
    cell: Weak<FixCell<O, S>>,
}

impl<O, S> Clone for Recur<O, S> {
    fn clone(&self) -> Self {
        Recur {
            cell: self.cell.clone(),
        }
    }
}

/// Build the rule `p = f(p)` in one step.
///
/// `f` receives a named reference to the rule being defined.
///
/// ```
/// # use descent::*;
/// let parens = fix("parens", |parens: Reference<Recur<String>>| {
///     option(sequence(accept(Char('(')), sequence(parens, accept(Char(')')))))
/// });
/// assert_eq!(parse(&parens, "(())", &mut ()).unwrap(), Some("(())".to_string()));
///
/// let mut defs = Definitions::default();
/// assert_eq!(parens.ebnf(Some(&mut defs)), "parens");
/// assert_eq!(defs["parens"], "['(', parens, ')']");
/// ```
pub fn fix<O, S, P, F>(name: impl Into<String>, f: F) -> Fix<O, S>
where
    O: 'static,
    S: 'static,
    P: Parser<S, Output = O> + 'static,
    F: FnOnce(Reference<Recur<O, S>>) -> P,
{
    let name = name.into();
    let cell = Rc::new(OnceCell::new());
    let body = f(reference(
        name.clone(),
        Recur {
            cell: Rc::downgrade(&cell),
        },
    ));
    cell.get_or_init(|| Box::new(body) as Dyn<O, S>);
    Fix { name, cell }
}

impl<O, S> Grammar for Fix<O, S> {
    fn ebnf(&self, defs: Option<&mut Definitions>) -> String {
        let Some(defs) = defs else {
            return self.name.clone();
        };
        if !defs.contains_key(&self.name) {
            defs.insert(self.name.clone(), self.name.clone());
            let body = match self.cell.get() {
                Some(parser) => parser.ebnf(Some(&mut *defs)),
                None => "?".to_string(),
            };
            if let Some(definition) = defs.get_mut(&self.name) {
                *definition = body;
            }
        }
        self.name.clone()
    }

    fn has_side_effects(&self) -> bool {
        true
    }
}

impl<O, S> Parser<S> for Fix<O, S> {
    type Output = O;

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut O>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        match self.cell.get() {
            Some(parser) => parser.parse(cursor, out, state),
            None => Err(ParseError::undefined(cursor)),
        }
    }
}

impl<O, S> Grammar for Recur<O, S> {
    fn ebnf(&self, defs: Option<&mut Definitions>) -> String {
        match self.cell.upgrade() {
            Some(cell) => match cell.get() {
                Some(parser) => parser.ebnf(defs),
                None => "?".to_string(),
            },
            None => "?".to_string(),
        }
    }

    fn has_side_effects(&self) -> bool {
        true
    }
}

impl<O, S> Parser<S> for Recur<O, S> {
    type Output = O;

    fn parse(
        &self,
        cursor: &mut Cursor<'_>,
        out: Option<&mut O>,
        state: &mut S,
    ) -> Result<bool, ParseError> {
        let Some(cell) = self.cell.upgrade() else {
            return Err(ParseError::undefined(cursor));
        };
        match cell.get() {
            Some(parser) => parser.parse(cursor, out, state),
            None => Err(ParseError::undefined(cursor)),
        }
    }
}
