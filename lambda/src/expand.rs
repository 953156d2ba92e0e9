//! Textual expansion of `_NAME` and `_N` references.
//!
//! Every inserted definition is wrapped in parentheses, and the char span of
//! that group is remembered together with the origin tag so the parser can
//! label the node it builds from it.

use std::sync::OnceLock;

use regex::Regex;

use crate::{prelude::*, registry::Registry};

/// Nested definitions are expanded at most this deep; deeper references stay
/// literal and parse as free variables.
pub const MAX_DEPTH: usize = 10;
/// Larger numeral literals are left as they are.
pub const MAX_NUMERAL: usize = 4096;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Origin {
    pub span: Span,
    pub tag: Identifier,
}

#[derive(Clone, Default, Debug)]
pub struct Expansion {
    pub text: String,
    pub origins: Vec<Origin>,
    chars: usize,
}

impl Expansion {
    fn push_str(&mut self, s: &str) {
        self.text.push_str(s);
        self.chars += s.chars().count();
    }
}

fn words() -> &'static Regex {
    static WORDS: OnceLock<Regex> = OnceLock::new();
    WORDS.get_or_init(|| Regex::new(r"[A-Za-z0-9_']+").expect("valid regex"))
}

/// Names referenced as `_NAME` in `text`, numerals excluded.
pub fn references(text: &str) -> Vec<String> {
    words()
        .find_iter(text)
        .filter_map(|m| m.as_str().strip_prefix('_'))
        .filter(|name| !name.is_empty() && !name.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}

/// `λf.λx. f (f (... (f x)))` with `n` applications of `f`.
pub fn church_numeral(n: usize) -> String {
    let mut body = "x".to_string();
    for i in 0..n {
        body = if i == 0 {
            "f x".to_string()
        } else {
            format!("f ({body})")
        };
    }
    format!("λf.λx.{body}")
}

pub fn expand(input: &str, registry: &Registry) -> Expansion {
    let mut expansion = Expansion::default();
    expand_into(input, registry, 0, &mut expansion);
    expansion
}

fn expand_into(input: &str, registry: &Registry, depth: usize, out: &mut Expansion) {
    let mut last = 0;
    for word in words().find_iter(input) {
        out.push_str(&input[last..word.start()]);
        last = word.end();
        let replacement = word
            .as_str()
            .strip_prefix('_')
            .filter(|_| depth < MAX_DEPTH)
            .and_then(|name| resolve(name, registry));
        match replacement {
            Some((tag, definition)) => {
                tracing::trace!(%tag, depth, "expanding reference");
                let start = out.chars;
                out.push_str("(");
                if is_numeral(&tag) {
                    out.push_str(&definition);
                } else {
                    expand_into(&definition, registry, depth + 1, out);
                }
                out.push_str(")");
                out.origins.push(Origin {
                    span: start..out.chars,
                    tag,
                });
            }
            None => out.push_str(word.as_str()),
        }
    }
    out.push_str(&input[last..]);
}

fn is_numeral(tag: &str) -> bool {
    crate::term::is_numeral_tag(tag)
}

fn resolve(name: &str, registry: &Registry) -> Option<(Identifier, String)> {
    if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
        return match name.parse::<usize>() {
            Ok(n) if n <= MAX_NUMERAL => Some((identifier(format!("_{name}")), church_numeral(n))),
            _ => {
                tracing::warn!(numeral = name, "numeral too large to expand");
                None
            }
        };
    }
    registry
        .lookup(name)
        .map(|entry| (entry.name.clone(), entry.lambda.clone()))
}
