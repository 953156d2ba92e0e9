use std::{collections::HashMap, rc::Rc};

use chumsky::{error::SimpleReason, prelude::*, Stream};

use crate::{
    error::ParseError,
    expand::{expand, Expansion},
    prelude::*,
    registry::Registry,
    term::Term,
};

#[derive(PartialEq, Eq, Hash, Clone, derive_more::Display, Debug)]
pub enum Token {
    #[display(fmt = "(")]
    LParen,
    #[display(fmt = ")")]
    RParen,
    #[display(fmt = ".")]
    Dot,
    #[display(fmt = "λ")]
    Lambda,
    #[display(fmt = "{}", "_0")]
    Identifier(Identifier),
}

pub trait SimpleParser<I: Clone + std::hash::Hash, O>:
    Parser<I, O, Error = Error<I>> + Clone
{
    #[allow(clippy::type_complexity)]
    fn spanned(self) -> chumsky::combinator::MapWithSpan<Self, fn(O, Span) -> Spanned<O>, O>
    where
        Self: Sized,
        I: std::cmp::Eq,
    {
        self.map_with_span(|value, span| Spanned { span, value })
    }
}
impl<I: Clone + std::hash::Hash, O, T> SimpleParser<I, O> for T where
    T: Parser<I, O, Error = Error<I>> + Clone
{
}

fn is_ident_start(c: &char) -> bool {
    c.is_ascii_alphabetic() || *c == '_'
}

fn is_ident_continue(c: &char) -> bool {
    c.is_ascii_alphanumeric() || *c == '_' || *c == '\''
}

/// `λ`, `\` and a token-initial `L` all lex as the binder.
pub fn lexer() -> impl SimpleParser<char, Vec<Spanned<Token>>> {
    let binder = one_of("λ\\L").to(Token::Lambda);
    let symbols = choice((
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('.').to(Token::Dot),
    ));
    let ident = filter(is_ident_start)
        .map(Some)
        .chain::<char, Vec<_>, _>(filter(is_ident_continue).repeated())
        .collect::<String>()
        .map(|name| Token::Identifier(identifier(name)));
    let token = choice((binder, symbols, ident));
    token.spanned().padded().repeated().then_ignore(end())
}

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().map_or(false, |c| is_ident_start(&c)) && chars.all(|c| is_ident_continue(&c))
}

fn parameter() -> impl SimpleParser<Token, Identifier> {
    any().try_map(|token: Token, span: Span| match token {
        Token::Identifier(name) if is_identifier(&name) => Ok(name),
        other => Err(Error::custom(span, other.to_string())),
    })
}

/// `sequence := term+`, `term := λ IDENT . sequence | ( sequence ) | IDENT`.
///
/// A parenthesized group whose span was recorded by the expander receives
/// that origin tag.
fn sequence_parser(origins: Rc<HashMap<Span, Identifier>>) -> impl SimpleParser<Token, Term> {
    recursive(move |sequence: Recursive<_, Term, _>| {
        let variable = select! { Token::Identifier(name) => name }
            .map(Term::variable)
            .labelled("variable");

        let group = sequence
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map_with_span(move |term: Term, span: Span| {
                let tag = origins.get(&span).cloned();
                match tag {
                    Some(tag) => term.with_tag(Some(tag)),
                    None => term,
                }
            })
            .labelled("group");

        let lambda = just(Token::Lambda)
            .ignore_then(parameter())
            .then_ignore(just(Token::Dot))
            .then(sequence)
            .map(|(param, body)| Term::lambda(param, body))
            .labelled("lambda");

        let term = choice((lambda, group, variable));
        term.clone()
            .then(term.repeated())
            .foldl(|func, arg| Term::application(func, arg))
    })
    .labelled("term")
}

fn describe_expected(error: &Error<Token>) -> String {
    let mut expected = error
        .expected()
        .map(|t| {
            t.as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "end of input".to_string())
        })
        .collect::<Vec<_>>();
    expected.sort();
    if expected.is_empty() {
        "a term".to_string()
    } else {
        expected.join(", ")
    }
}

fn classify(error: Error<Token>) -> ParseError {
    let span = error.span();
    match (error.reason(), error.found()) {
        (SimpleReason::Custom(found), _) => ParseError::InvalidParameter {
            found: found.clone(),
            span,
        },
        (_, None) => ParseError::UnexpectedEnd {
            expected: describe_expected(&error),
            span,
        },
        (_, Some(found)) if error.expected().any(Option::is_none) => ParseError::TrailingInput {
            found: found.to_string(),
            span,
        },
        (_, Some(found)) => ParseError::UnexpectedToken {
            found: found.to_string(),
            expected: describe_expected(&error),
            span,
        },
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Spanned<Token>>, ParseError> {
    lexer().parse(source).map_err(|es| {
        let error = es.into_iter().next();
        match error.as_ref().and_then(|e| e.found().map(|c| (*c, e.span()))) {
            Some((found, span)) => ParseError::InvalidCharacter { found, span },
            None => ParseError::UnexpectedEnd {
                expected: "a token".to_string(),
                span: error.map(|e| e.span()).unwrap_or_default(),
            },
        }
    })
}

/// Parses already-expanded text. Error spans index into `expansion.text`.
pub fn parse_expansion(expansion: &Expansion) -> Result<Term, ParseError> {
    let source = expansion.text.as_str();
    if source.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let tokens = tokenize(source)?;
    let len = source.chars().count();
    let eoi = Span {
        start: len,
        end: len + 1,
    };
    let origins = expansion
        .origins
        .iter()
        .map(|origin| (origin.span.clone(), origin.tag.clone()))
        .collect::<HashMap<_, _>>();
    sequence_parser(Rc::new(origins))
        .then_ignore(end())
        .parse(Stream::from_iter(
            eoi.clone(),
            tokens
                .into_iter()
                .map(|Spanned { span, value }| (value, span)),
        ))
        .map_err(|es| match es.into_iter().next() {
            Some(error) => classify(error),
            None => ParseError::UnexpectedEnd {
                expected: "a term".to_string(),
                span: eoi,
            },
        })
}

pub fn parse(input: &str, registry: &Registry) -> Result<Term, ParseError> {
    parse_expansion(&expand(input, registry))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        printer::{canonical, print, Mode},
        term::TermKind,
    };

    fn lex(s: &str) -> Result<Vec<Token>, ParseError> {
        Ok(tokenize(s)?
            .iter()
            .map(Spanned::value)
            .cloned()
            .collect::<Vec<_>>())
    }

    fn run(s: &str) -> Result<String, ParseError> {
        parse(s, &Registry::builtin()).map(|t| print(&t, Mode::AsWritten))
    }

    #[test]
    fn test_lexer() {
        let ident = |s: &str| Token::Identifier(identifier(s));
        assert_eq!(
            lex(r"\x.x' Ly._a1").unwrap(),
            vec![
                Token::Lambda,
                ident("x"),
                Token::Dot,
                ident("x'"),
                Token::Lambda,
                ident("y"),
                Token::Dot,
                ident("_a1"),
            ]
        );
        assert_eq!(lex("(fooL)").unwrap(), vec![Token::LParen, ident("fooL"), Token::RParen]);
        assert_eq!(
            lex("x + y").unwrap_err(),
            ParseError::InvalidCharacter {
                found: '+',
                span: 2..3
            }
        );
    }

    #[test]
    fn test_parser() {
        assert_eq!(run("x").unwrap(), "x");
        assert_eq!(run("a b c").unwrap(), "(a b) c");
        assert_eq!(run("a (b c)").unwrap(), "a (b c)");
        assert_eq!(run(r"\x.\y.x y").unwrap(), "λx.λy.x y");
        assert_eq!(run("(λx.x) (Ly.y)").unwrap(), "(λx.x) (λy.y)");
        assert_eq!(run("λx. x λy. y").unwrap(), "λx.x (λy.y)");
        assert_eq!(run("((x))").unwrap(), "x");
    }

    #[test]
    fn test_application_is_left_associative() {
        let term = parse("f a b", &Registry::builtin()).unwrap();
        let TermKind::Application { func, arg } = term.kind() else {
            panic!("expected an application");
        };
        assert!(matches!(arg.kind(), TermKind::Variable(b) if b.as_str() == "b"));
        assert!(matches!(func.kind(), TermKind::Application { .. }));
    }

    #[test]
    fn test_errors() {
        assert_eq!(run("").unwrap_err(), ParseError::Empty);
        assert_eq!(run("  \n\t").unwrap_err(), ParseError::Empty);
        assert!(matches!(
            run("λ(.x").unwrap_err(),
            ParseError::InvalidParameter { found, span } if found == "(" && span == (1..2)
        ));
        assert!(matches!(
            run("λx x").unwrap_err(),
            ParseError::UnexpectedToken { found, .. } if found == "x"
        ));
        assert!(matches!(run("(x").unwrap_err(), ParseError::UnexpectedEnd { .. }));
        assert!(matches!(run("λx.").unwrap_err(), ParseError::UnexpectedEnd { .. }));
        assert!(matches!(
            run("(x))").unwrap_err(),
            ParseError::TrailingInput { found, span } if found == ")" && span == (3..4)
        ));
        assert!(matches!(
            run("x y . z").unwrap_err(),
            ParseError::TrailingInput { found, .. } if found == "."
        ));
        assert!(matches!(
            run("x $").unwrap_err(),
            ParseError::InvalidCharacter { found: '$', .. }
        ));
        assert!(is_identifier("_a'"));
        assert!(!is_identifier("1a"));
    }

    #[test]
    fn test_named_terms_are_tagged() {
        let term = parse("_SUCC _2", &Registry::builtin()).unwrap();
        let TermKind::Application { func, arg } = term.kind() else {
            panic!("expected an application");
        };
        assert_eq!(func.tag().map(|t| t.as_str()), Some("SUCC"));
        assert_eq!(arg.tag().map(|t| t.as_str()), Some("_2"));
        assert!(term.tag().is_none());
        assert_eq!(print(&term, Mode::AsWritten), "(λn.λf.λx.f ((n f) x)) (_2)");
    }

    #[test]
    fn test_unresolved_reference_is_free() {
        let term = parse("λx. _MISSING x", &Registry::builtin()).unwrap();
        assert_eq!(
            term.free_variables().into_iter().map(|v| v.to_string()).collect::<Vec<_>>(),
            vec!["_MISSING"]
        );
    }

    #[test]
    fn test_custom_reference_matches_definition() {
        let mut registry = Registry::builtin();
        registry.define("SWAP", "λp.λq.q p", None).unwrap();
        let via_name = parse("_SWAP", &registry).unwrap();
        let direct = parse("λp.λq.q p", &registry).unwrap();
        assert_eq!(canonical(&via_name), canonical(&direct));
    }
}
