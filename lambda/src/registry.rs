use std::{collections::HashSet, sync::OnceLock};

use regex::Regex;

use crate::{error::RegistryError, expand, parser, prelude::*};

#[derive(Clone, serde::Serialize, Debug)]
pub struct NamedTerm {
    pub name: Identifier,
    pub lambda: String,
    pub description: Option<String>,
}

impl NamedTerm {
    fn new(name: &str, lambda: &str, description: &str) -> Self {
        NamedTerm {
            name: identifier(name),
            lambda: lambda.to_string(),
            description: Some(description.to_string()),
        }
    }
}

/// Built-in named terms followed by user definitions. Names are unique
/// across both lists.
#[derive(Clone, Debug)]
pub struct Registry {
    builtin: Vec<NamedTerm>,
    custom: Vec<NamedTerm>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

pub fn is_valid_name(name: &str) -> bool {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_']*$").expect("valid regex"))
        .is_match(name)
}

impl Registry {
    pub fn builtin() -> Self {
        let builtin = vec![
            NamedTerm::new("I", "λx.x", "identity"),
            NamedTerm::new("TRUE", "λx.λy.x", "Church boolean true"),
            NamedTerm::new("FALSE", "λx.λy.y", "Church boolean false"),
            NamedTerm::new("ZERO", "λf.λx.x", "Church numeral 0"),
            NamedTerm::new("ONE", "λf.λx.f x", "Church numeral 1"),
            NamedTerm::new("TWO", "λf.λx.f (f x)", "Church numeral 2"),
            NamedTerm::new("THREE", "λf.λx.f (f (f x))", "Church numeral 3"),
            NamedTerm::new("SUCC", "λn.λf.λx.f (n f x)", "successor"),
            NamedTerm::new("PLUS", "λm.λn.λf.λx.m f (n f x)", "addition"),
            NamedTerm::new("MULT", "λm.λn.λf.m (n f)", "multiplication"),
            NamedTerm::new("POW", "λb.λe.e b", "exponentiation"),
            NamedTerm::new("Y", "λf.(λx.f (x x)) (λx.f (x x))", "fixed-point combinator"),
        ];
        Registry {
            builtin,
            custom: vec![],
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&NamedTerm> {
        self.entries().find(|entry| entry.name.as_str() == name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &NamedTerm> {
        self.builtin.iter().chain(self.custom.iter())
    }

    pub fn custom(&self) -> &[NamedTerm] {
        &self.custom
    }

    /// Registers a user definition.
    ///
    /// Rejects malformed or taken names, bodies that do not parse, and bodies
    /// whose `_NAME` references lead back to `name`.
    pub fn define(
        &mut self,
        name: &str,
        lambda: &str,
        description: Option<String>,
    ) -> Result<&NamedTerm, RegistryError> {
        if !is_valid_name(name) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        if self.lookup(name).is_some() {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        if let Some(via) = self.reaches(lambda, name) {
            return Err(RegistryError::Cyclic {
                name: name.to_string(),
                via,
            });
        }
        parser::parse(lambda, self).map_err(|source| RegistryError::Unparsable {
            name: name.to_string(),
            source,
        })?;
        tracing::debug!(name, lambda, "registered custom term");
        self.custom.push(NamedTerm {
            name: identifier(name),
            lambda: lambda.to_string(),
            description,
        });
        Ok(&self.custom[self.custom.len() - 1])
    }

    /// Walks the `_NAME` references of `lambda` through the registry and
    /// returns the first reference from which `target` is reachable.
    fn reaches(&self, lambda: &str, target: &str) -> Option<String> {
        let mut visited = HashSet::new();
        expand::references(lambda).into_iter().find(|start| {
            let mut stack = vec![start.clone()];
            while let Some(name) = stack.pop() {
                if name == target {
                    return true;
                }
                if !visited.insert(name.clone()) {
                    continue;
                }
                if let Some(entry) = self.lookup(&name) {
                    stack.extend(expand::references(&entry.lambda));
                }
            }
            false
        })
    }
}
