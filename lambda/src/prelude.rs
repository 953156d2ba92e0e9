use std::rc::Rc;

pub type Identifier = Rc<String>;

/// Char-indexed range into a source string.
pub type Span = std::ops::Range<usize>;

#[derive(Clone, derive_more::Display, Debug)]
#[display(bound = "T: std::fmt::Display")]
#[display(fmt = "{value}")]
pub struct Spanned<T> {
    pub span: Span,
    pub value: T,
}
impl<T> Spanned<T> {
    pub fn value(&self) -> &T {
        &self.value
    }
}

pub fn identifier(name: impl Into<String>) -> Identifier {
    Rc::new(name.into())
}

pub use chumsky::error::Error as _;
pub type Error<I> = chumsky::error::Simple<I, Span>;
