use std::collections::HashSet;

use crate::{
    error::ReductionError,
    prelude::*,
    term::{Term, TermId, TermKind},
};

/// Nesting bound guarding the native stack.
pub const MAX_DEPTH: usize = 2048;

#[derive(Debug)]
pub struct Step {
    pub term: Term,
    pub changed: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, derive_more::Display, Debug)]
pub enum Status {
    #[display(fmt = "normal form")]
    NormalForm,
    #[display(fmt = "step limit exceeded")]
    StepLimitExceeded,
}

#[derive(Debug)]
pub struct Normalized {
    pub term: Term,
    pub steps: usize,
    pub status: Status,
}

fn check_depth(depth: usize) -> Result<(), ReductionError> {
    if depth > MAX_DEPTH {
        return Err(ReductionError::DepthExceeded { limit: MAX_DEPTH });
    }
    Ok(())
}

/// State of a single reduction step. Fresh names are unique within one step
/// only, which suffices since every step builds an entirely new tree.
#[derive(Default)]
struct Reducer {
    tried: HashSet<Identifier>,
    counter: usize,
}

impl Reducer {
    fn reduce(&mut self, term: &Term, depth: usize) -> Result<Option<Term>, ReductionError> {
        check_depth(depth)?;
        let tag = term.tag().cloned();
        Ok(match term.kind() {
            TermKind::Variable(_) => None,
            TermKind::Lambda { param, body } => self
                .reduce(body, depth + 1)?
                .map(|body| Term::lambda(param.clone(), body).with_tag(tag)),
            TermKind::Application { func, arg } => {
                if let TermKind::Lambda { param, body } = func.kind() {
                    tracing::debug!(redex = %term.id(), %param, "contracting redex");
                    return Ok(Some(self.substitute(body, param, arg, depth + 1)?));
                }
                if let Some(func) = self.reduce(func, depth + 1)? {
                    Some(Term::application(func, arg.refresh()).with_tag(tag))
                } else {
                    self.reduce(arg, depth + 1)?
                        .map(|arg| Term::application(func.refresh(), arg).with_tag(tag))
                }
            }
        })
    }

    /// `term[name := replacement]`, alpha-converting binders that would
    /// capture a free variable of `replacement`.
    fn substitute(
        &mut self,
        term: &Term,
        name: &Identifier,
        replacement: &Term,
        depth: usize,
    ) -> Result<Term, ReductionError> {
        check_depth(depth)?;
        let tag = term.tag().cloned();
        Ok(match term.kind() {
            TermKind::Variable(v) if v == name => replacement.refresh(),
            TermKind::Variable(_) => term.refresh(),
            TermKind::Lambda { param, .. } if param == name => term.refresh(),
            TermKind::Lambda { param, body } => {
                let replacement_free = replacement.free_variables();
                if replacement_free.contains(param) {
                    let fresh = self.fresh_name(param, body, &replacement_free, name);
                    tracing::trace!(from = %param, to = %fresh, "alpha-converting");
                    let renamed =
                        self.substitute(body, param, &Term::variable(fresh.clone()), depth + 1)?;
                    let body = self.substitute(&renamed, name, replacement, depth + 1)?;
                    Term::lambda(fresh, body).with_tag(tag)
                } else {
                    let body = self.substitute(body, name, replacement, depth + 1)?;
                    Term::lambda(param.clone(), body).with_tag(tag)
                }
            }
            TermKind::Application { func, arg } => Term::application(
                self.substitute(func, name, replacement, depth + 1)?,
                self.substitute(arg, name, replacement, depth + 1)?,
            )
            .with_tag(tag),
        })
    }

    fn fresh_name(
        &mut self,
        param: &Identifier,
        body: &Term,
        replacement_free: &HashSet<Identifier>,
        name: &Identifier,
    ) -> Identifier {
        let body_free = body.free_variables();
        loop {
            self.counter += 1;
            let candidate = identifier(format!("{param}{}", self.counter));
            if body_free.contains(&candidate)
                || replacement_free.contains(&candidate)
                || &candidate == name
                || self.tried.contains(&candidate)
            {
                continue;
            }
            self.tried.insert(candidate.clone());
            break candidate;
        }
    }
}

/// Contracts the leftmost-outermost redex, if any. An unchanged result is a
/// fresh copy of `term`.
pub fn reduce_step(term: &Term) -> Result<Step, ReductionError> {
    Ok(match Reducer::default().reduce(term, 0)? {
        Some(term) => Step {
            term,
            changed: true,
        },
        None => Step {
            term: term.refresh(),
            changed: false,
        },
    })
}

/// Identity of the application `reduce_step` would contract next.
pub fn locate_next_redex(term: &Term) -> Option<TermId> {
    match term.kind() {
        TermKind::Variable(_) => None,
        TermKind::Lambda { body, .. } => locate_next_redex(body),
        TermKind::Application { func, .. } if matches!(func.kind(), TermKind::Lambda { .. }) => {
            Some(term.id())
        }
        TermKind::Application { func, arg } => {
            locate_next_redex(func).or_else(|| locate_next_redex(arg))
        }
    }
}

/// Reduces until normal form or until `step_limit` contractions were made.
pub fn normalize(term: &Term, step_limit: usize) -> Result<Normalized, ReductionError> {
    let mut term = term.refresh();
    for steps in 0..step_limit {
        let step = reduce_step(&term)?;
        if !step.changed {
            return Ok(Normalized {
                term: step.term,
                steps,
                status: Status::NormalForm,
            });
        }
        term = step.term;
    }
    let status = if locate_next_redex(&term).is_some() {
        tracing::debug!(step_limit, "reduction stopped at the step limit");
        Status::StepLimitExceeded
    } else {
        Status::NormalForm
    };
    Ok(Normalized {
        term,
        steps: step_limit,
        status,
    })
}
