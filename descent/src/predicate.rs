//! Single-symbol classifiers.
//!
//! A predicate looks at the current symbol (or `None` at the end of the input)
//! and says yes or no. Predicates carry a display name so that recognizers
//! built from them render readable EBNF, and compose with
//! [`or`](PredicateExt::or), [`not`](PredicateExt::not) and
//! [`except`](PredicateExt::except):
//!
//! ```
//! # use descent::*;
//! let ident_tail = Alnum.or(Char('_'));
//! assert!(ident_tail.matches(Some('_')));
//! assert_eq!(ident_tail.name(), "alphanumeric | '_'");
//!
//! let cell = Anything.except(Char(',').or(Eol));
//! assert_eq!(cell.name(), "anything - (',' | EOL)");
//! ```

use crate::parser::Rank;

pub trait Predicate {
    fn matches(&self, c: Option<char>) -> bool;

    fn name(&self) -> String;

    fn rank(&self) -> Rank {
        Rank::Atom
    }
}

impl<P: Predicate + ?Sized> Predicate for &P {
    fn matches(&self, c: Option<char>) -> bool {
        (**self).matches(c)
    }

    fn name(&self) -> String {
        (**self).name()
    }

    fn rank(&self) -> Rank {
        (**self).rank()
    }
}

fn format_predicate<P: Predicate + ?Sized>(pred: &P, rank: Rank) -> String {
    if pred.rank() > rank {
        format!("({})", pred.name())
    } else {
        pred.name()
    }
}

macro_rules! class {
    ($($(#[$attr:meta])* $ty:ident = $label:literal, |$c:ident| $test:expr;)+) => {
        $(
            $(#[$attr])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
            pub struct $ty;

            impl Predicate for $ty {
                #[inline]
                fn matches(&self, c: Option<char>) -> bool {
                    c.is_some_and(|$c| $test)
                }

                fn name(&self) -> String {
                    $label.to_string()
                }
            }
        )+
    };
}

class! {
    /// Any symbol. Does not match the end of the input.
    Anything = "anything", |_c| true;
    /// Whitespace, including newlines.
    Space = "space", |c| c.is_whitespace();
    /// Space or horizontal tab.
    Blank = "blank", |c| c == ' ' || c == '\t';
    Digit = "digit", |c| c.is_ascii_digit();
    HexDigit = "hexdigit", |c| c.is_ascii_hexdigit();
    Alpha = "alphabetic", |c| c.is_alphabetic();
    Alnum = "alphanumeric", |c| c.is_alphanumeric();
    Upper = "uppercase", |c| c.is_uppercase();
    Lower = "lowercase", |c| c.is_lowercase();
    /// Anything but a control character.
    Print = "printable", |c| !c.is_control();
    /// Printable and not whitespace.
    Graphic = "graphic", |c| !c.is_control() && !c.is_whitespace();
    Punctuation = "punctuation", |c| c.is_ascii_punctuation();
    Control = "control", |c| c.is_control();
    /// Line feed.
    Eol = "EOL", |c| c == '\n';
}

/// Exactly the given symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Char(pub char);

impl Predicate for Char {
    #[inline]
    fn matches(&self, c: Option<char>) -> bool {
        c == Some(self.0)
    }

    fn name(&self) -> String {
        format!("'{}'", self.0.escape_default())
    }
}

/// The end of the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Eof;

impl Predicate for Eof {
    #[inline]
    fn matches(&self, c: Option<char>) -> bool {
        c.is_none()
    }

    fn name(&self) -> String {
        "end of input".to_string()
    }
}

/// See [`satisfy`].
#[derive(Clone)]
pub struct Satisfy<F> {
    name: String,
    f: F,
}

/// A named class defined by a function.
///
/// ```
/// # use descent::*;
/// let vowel = satisfy("vowel", |c| "aeiou".contains(c));
/// assert!(vowel.matches(Some('e')));
/// assert!(!vowel.matches(None));
/// ```
pub fn satisfy<F: Fn(char) -> bool>(name: impl Into<String>, f: F) -> Satisfy<F> {
    Satisfy {
        name: name.into(),
        f,
    }
}

impl<F: Fn(char) -> bool> Predicate for Satisfy<F> {
    fn matches(&self, c: Option<char>) -> bool {
        c.is_some_and(&self.f)
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Either of two predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Either<A, B> {
    pub left: A,
    pub right: B,
}

impl<A: Predicate, B: Predicate> Predicate for Either<A, B> {
    #[inline]
    fn matches(&self, c: Option<char>) -> bool {
        self.left.matches(c) || self.right.matches(c)
    }

    fn name(&self) -> String {
        format!(
            "{} | {}",
            format_predicate(&self.left, Rank::Choice),
            format_predicate(&self.right, Rank::Choice)
        )
    }

    fn rank(&self) -> Rank {
        Rank::Choice
    }
}

/// Any symbol the inner predicate rejects. Never matches the end of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negate<A> {
    pub inner: A,
}

impl<A: Predicate> Predicate for Negate<A> {
    #[inline]
    fn matches(&self, c: Option<char>) -> bool {
        c.is_some() && !self.inner.matches(c)
    }

    fn name(&self) -> String {
        format!("~{}", format_predicate(&self.inner, Rank::Atom))
    }
}

/// Set difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Without<A, B> {
    pub base: A,
    pub excluded: B,
}

impl<A: Predicate, B: Predicate> Predicate for Without<A, B> {
    #[inline]
    fn matches(&self, c: Option<char>) -> bool {
        self.base.matches(c) && !self.excluded.matches(c)
    }

    fn name(&self) -> String {
        format!(
            "{} - {}",
            format_predicate(&self.base, Rank::Except),
            format_predicate(&self.excluded, Rank::Atom)
        )
    }

    fn rank(&self) -> Rank {
        Rank::Except
    }
}

pub trait PredicateExt: Predicate + Sized {
    fn or<B: Predicate>(self, other: B) -> Either<Self, B> {
        Either {
            left: self,
            right: other,
        }
    }

    fn not(self) -> Negate<Self> {
        Negate { inner: self }
    }

    fn except<B: Predicate>(self, excluded: B) -> Without<Self, B> {
        Without {
            base: self,
            excluded,
        }
    }
}

impl<P: Predicate> PredicateExt for P {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes() {
        assert!(Digit.matches(Some('7')));
        assert!(!Digit.matches(Some('x')));
        assert!(HexDigit.matches(Some('F')));
        assert!(Space.matches(Some('\n')));
        assert!(!Blank.matches(Some('\n')));
        assert!(Upper.matches(Some('X')) && !Upper.matches(Some('x')));
        assert!(Punctuation.matches(Some('(')));
        assert!(Graphic.matches(Some('#')) && !Graphic.matches(Some(' ')));
        assert!(Eol.matches(Some('\n')));
    }

    #[test]
    fn end_of_input_only_matches_eof() {
        for class in [&Anything as &dyn Predicate, &Print, &Control, &Space] {
            assert!(!class.matches(None), "{} matched EOF", class.name());
        }
        assert!(Eof.matches(None));
        assert!(!Eof.matches(Some('a')));
        assert!(!Digit.not().matches(None));
    }

    #[test]
    fn composites_render_minimal_parentheses() {
        assert_eq!(Digit.or(Alpha).name(), "digit | alphabetic");
        assert_eq!(Digit.or(Alpha).or(Char('_')).name(), "digit | alphabetic | '_'");
        assert_eq!(Digit.or(Alpha).not().name(), "~(digit | alphabetic)");
        assert_eq!(
            Anything.except(Digit).except(Space).name(),
            "anything - digit - space"
        );
        assert_eq!(
            Anything.except(Digit.except(Char('0'))).name(),
            "anything - (digit - '0')"
        );
        assert_eq!(Alpha.except(Upper).or(Digit).name(), "alphabetic - uppercase | digit");
        assert_eq!(Char('\n').name(), "'\\n'");
    }

    #[test]
    fn set_difference() {
        let p = Alpha.except(Char('q'));
        assert!(p.matches(Some('a')));
        assert!(!p.matches(Some('q')));
        assert!(!p.matches(Some('1')));
    }
}
