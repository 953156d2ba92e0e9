//! Recovers `_N` numerals and `_NAME` registry references in reduced terms.

use std::collections::HashMap;

use crate::{
    config::PrettifyConfig,
    parser::parse,
    prelude::*,
    printer::{canonical, print_with, Mode},
    registry::Registry,
    term::{Term, TermKind},
};

/// Longest numeral walk attempted before giving up.
pub const MAX_NUMERAL_WALK: usize = 100_000;

/// Reads `λf.λx. f (f (… x))` as its numeral.
pub fn church_numeral(term: &Term) -> Option<usize> {
    let TermKind::Lambda { param: f, body } = term.kind() else {
        return None;
    };
    let TermKind::Lambda { param: x, body } = body.kind() else {
        return None;
    };
    let mut current = body;
    for n in 0..MAX_NUMERAL_WALK {
        match current.kind() {
            TermKind::Variable(v) if v == x => return Some(n),
            // when `x` shadows `f`, no occurrence can refer to `f`
            TermKind::Application { func, arg } => match func.kind() {
                TermKind::Variable(v) if v == f && f != x => current = arg,
                _ => return None,
            },
            _ => return None,
        }
    }
    None
}

pub struct Prettifier {
    /// Canonical form to name, longest canonical form first.
    table: Vec<(String, Identifier)>,
    lookup: HashMap<String, Identifier>,
}

impl Prettifier {
    pub fn new(registry: &Registry, config: &PrettifyConfig) -> Self {
        let mut table = registry
            .entries()
            .filter_map(|entry| {
                let term = match parse(&entry.lambda, registry) {
                    Ok(term) => term,
                    Err(error) => {
                        tracing::warn!(name = %entry.name, %error, "skipping unparsable named term");
                        return None;
                    }
                };
                let form = canonical(&term);
                let trivial = matches!(term.kind(), TermKind::Variable(_))
                    || form.chars().count() < config.min_length;
                if trivial && !config.always.iter().any(|name| name == entry.name.as_str()) {
                    return None;
                }
                Some((form, entry.name.clone()))
            })
            .collect::<Vec<_>>();
        table.sort_by_key(|(form, _)| std::cmp::Reverse(form.chars().count()));
        let mut lookup = HashMap::new();
        for (form, name) in &table {
            lookup.entry(form.clone()).or_insert_with(|| name.clone());
        }
        Prettifier { table, lookup }
    }

    pub fn table(&self) -> &[(String, Identifier)] {
        &self.table
    }

    fn name_of(&self, term: &Term) -> Option<String> {
        if !term.is_closed() {
            return None;
        }
        if let Some(n) = church_numeral(term) {
            return Some(format!("_{n}"));
        }
        self.lookup.get(&canonical(term)).map(|name| format!("_{name}"))
    }

    /// Whole-term numeral first, then a numeral origin tag, then outermost
    /// closed subterms matching a numeral or a registry entry.
    pub fn prettify(&self, term: &Term) -> String {
        if let Some(n) = church_numeral(term) {
            return format!("_{n}");
        }
        if let Some(tag) = term.numeral_tag() {
            return tag.to_string();
        }
        print_with(term, Mode::Canonical, &|sub| self.name_of(sub))
    }
}

pub fn prettify(term: &Term, registry: &Registry, config: &PrettifyConfig) -> String {
    Prettifier::new(registry, config).prettify(term)
}
