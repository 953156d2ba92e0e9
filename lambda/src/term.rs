use std::{
    collections::HashSet,
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

use rpds::HashTrieSet;

use crate::prelude::*;

pub type TermRef = Rc<Term>;

/// Identity of a term node.
///
/// Drawn from a process-wide counter that wraps at [`TermId::WRAP`], so two
/// nodes of the same tree never share an identity.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display, serde::Serialize, Debug,
)]
#[display(fmt = "#{}", "_0")]
#[serde(transparent)]
pub struct TermId(u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

impl TermId {
    pub const WRAP: u64 = 1 << 48;

    pub fn fresh() -> Self {
        let id = NEXT_ID
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| {
                Some(if id + 1 >= Self::WRAP { 0 } else { id + 1 })
            })
            .unwrap_or_else(|id| id);
        TermId(id)
    }
}

#[derive(Debug)]
pub enum TermKind {
    /// `x`
    Variable(Identifier),
    /// `λx. t`
    Lambda { param: Identifier, body: TermRef },
    /// `t t`
    Application { func: TermRef, arg: TermRef },
}

/// A node of a lambda term. Never mutated once built; every rewrite builds
/// fresh nodes with fresh identities.
#[derive(Debug)]
pub struct Term {
    id: TermId,
    tag: Option<Identifier>,
    kind: TermKind,
}

/// `_` followed by digits only, the tag carried by an expanded Church numeral.
pub fn is_numeral_tag(tag: &str) -> bool {
    tag.strip_prefix('_')
        .map_or(false, |digits| {
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        })
}

impl Term {
    fn new(kind: TermKind) -> Self {
        Term {
            id: TermId::fresh(),
            tag: None,
            kind,
        }
    }

    pub fn variable(name: Identifier) -> Self {
        Self::new(TermKind::Variable(name))
    }

    pub fn lambda(param: Identifier, body: impl Into<TermRef>) -> Self {
        Self::new(TermKind::Lambda {
            param,
            body: body.into(),
        })
    }

    pub fn application(func: impl Into<TermRef>, arg: impl Into<TermRef>) -> Self {
        Self::new(TermKind::Application {
            func: func.into(),
            arg: arg.into(),
        })
    }

    /// Attaches the origin tag. Only meant for use while a node is being built.
    pub fn with_tag(mut self, tag: Option<Identifier>) -> Self {
        self.tag = tag;
        self
    }

    pub fn id(&self) -> TermId {
        self.id
    }

    pub fn tag(&self) -> Option<&Identifier> {
        self.tag.as_ref()
    }

    pub fn kind(&self) -> &TermKind {
        &self.kind
    }

    pub fn numeral_tag(&self) -> Option<&Identifier> {
        self.tag.as_ref().filter(|tag| is_numeral_tag(tag))
    }

    /// An application whose function position is a lambda.
    pub fn is_redex(&self) -> bool {
        matches!(
            &self.kind,
            TermKind::Application { func, .. } if matches!(func.kind, TermKind::Lambda { .. })
        )
    }

    /// Structurally identical copy, tags included, with fresh identities.
    pub fn refresh(&self) -> Term {
        let kind = match &self.kind {
            TermKind::Variable(name) => TermKind::Variable(name.clone()),
            TermKind::Lambda { param, body } => TermKind::Lambda {
                param: param.clone(),
                body: body.refresh().into(),
            },
            TermKind::Application { func, arg } => TermKind::Application {
                func: func.refresh().into(),
                arg: arg.refresh().into(),
            },
        };
        Term::new(kind).with_tag(self.tag.clone())
    }

    pub fn free_variables(&self) -> HashSet<Identifier> {
        fn rec(term: &Term, bound: &HashTrieSet<Identifier>, free: &mut HashSet<Identifier>) {
            match &term.kind {
                TermKind::Variable(name) => {
                    if !bound.contains(name) {
                        free.insert(name.clone());
                    }
                }
                TermKind::Lambda { param, body } => rec(body, &bound.insert(param.clone()), free),
                TermKind::Application { func, arg } => {
                    rec(func, bound, free);
                    rec(arg, bound, free);
                }
            }
        }
        let mut free = HashSet::new();
        rec(self, &HashTrieSet::new(), &mut free);
        free
    }

    pub fn is_closed(&self) -> bool {
        self.free_variables().is_empty()
    }

    /// Number of variable occurrences bound by some enclosing lambda.
    pub fn bound_occurrences(&self) -> usize {
        fn rec(term: &Term, bound: &HashTrieSet<Identifier>) -> usize {
            match &term.kind {
                TermKind::Variable(name) => usize::from(bound.contains(name)),
                TermKind::Lambda { param, body } => rec(body, &bound.insert(param.clone())),
                TermKind::Application { func, arg } => rec(func, bound) + rec(arg, bound),
            }
        }
        rec(self, &HashTrieSet::new())
    }

    /// Looks up a node of this tree by identity.
    pub fn find(&self, id: TermId) -> Option<&Term> {
        if self.id == id {
            return Some(self);
        }
        match &self.kind {
            TermKind::Variable(_) => None,
            TermKind::Lambda { body, .. } => body.find(id),
            TermKind::Application { func, arg } => func.find(id).or_else(|| arg.find(id)),
        }
    }
}
