use rpds::HashTrieMap;

use crate::{
    prelude::*,
    term::{Term, TermKind},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    /// Variable names as stored; numeral-tagged nodes print as their tag.
    AsWritten,
    /// Binders renamed `@a, @b, …` in print order, so alpha-equivalent terms
    /// print identically.
    Canonical,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Position {
    TopLevel,
    Function,
    Argument,
    LambdaBody,
}

fn needs_parens(term: &Term, position: Position) -> bool {
    match term.kind() {
        TermKind::Variable(_) => false,
        TermKind::Lambda { .. } | TermKind::Application { .. } => {
            matches!(position, Position::Function | Position::Argument)
        }
    }
}

/// `@a` … `@z`, then `@26`, `@27`, …
pub fn canonical_name(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => format!("@{}", (b'a' + i) as char),
        _ => format!("@{index}"),
    }
}

type Atom<'a> = &'a dyn Fn(&Term) -> Option<String>;

struct Printer<'a> {
    mode: Mode,
    next: usize,
    out: String,
    atom: Option<Atom<'a>>,
}

impl<'a> Printer<'a> {
    fn atom(&self, term: &Term) -> Option<String> {
        if let Some(atom) = self.atom.and_then(|atom| atom(term)) {
            return Some(atom);
        }
        match self.mode {
            Mode::AsWritten => term.numeral_tag().map(|tag| tag.to_string()),
            Mode::Canonical => None,
        }
    }

    fn write(
        &mut self,
        term: &Term,
        position: Position,
        names: &HashTrieMap<Identifier, Identifier>,
    ) {
        let parens = needs_parens(term, position);
        if parens {
            self.out.push('(');
        }
        if let Some(atom) = self.atom(term) {
            self.out.push_str(&atom);
        } else {
            match term.kind() {
                TermKind::Variable(name) => {
                    let name = names.get(name).unwrap_or(name);
                    self.out.push_str(name);
                }
                TermKind::Lambda { param, body } => {
                    let (shown, names) = match self.mode {
                        Mode::AsWritten => (param.clone(), names.clone()),
                        Mode::Canonical => {
                            let shown = identifier(canonical_name(self.next));
                            self.next += 1;
                            (shown.clone(), names.insert(param.clone(), shown))
                        }
                    };
                    self.out.push('λ');
                    self.out.push_str(&shown);
                    self.out.push('.');
                    self.write(body, Position::LambdaBody, &names);
                }
                TermKind::Application { func, arg } => {
                    self.write(func, Position::Function, names);
                    self.out.push(' ');
                    self.write(arg, Position::Argument, names);
                }
            }
        }
        if parens {
            self.out.push(')');
        }
    }
}

fn run(term: &Term, mode: Mode, atom: Option<Atom>) -> String {
    let mut printer = Printer {
        mode,
        next: 0,
        out: String::new(),
        atom,
    };
    printer.write(term, Position::TopLevel, &HashTrieMap::new());
    printer.out
}

pub fn print(term: &Term, mode: Mode) -> String {
    run(term, mode, None)
}

pub fn canonical(term: &Term) -> String {
    print(term, Mode::Canonical)
}

/// Prints `term`, letting `atom` stand in for any subterm it names.
pub(crate) fn print_with(term: &Term, mode: Mode, atom: Atom) -> String {
    run(term, mode, Some(atom))
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&print(self, Mode::AsWritten))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        parser::parse,
        registry::Registry,
        term::test::{apply, lambda, var},
    };

    fn canon(s: &str) -> String {
        canonical(&parse(s, &Registry::builtin()).unwrap())
    }

    #[test]
    fn test_parenthesization() {
        let id = || lambda!("x", var!("x"));
        assert_eq!(apply!(id(), id()).to_string(), "(λx.x) (λx.x)");
        assert_eq!(apply!(apply!(var!("a"), var!("b")), var!("c")).to_string(), "(a b) c");
        assert_eq!(apply!(var!("a"), apply!(var!("b"), var!("c"))).to_string(), "a (b c)");
        assert_eq!(lambda!("x", apply!(var!("x"), var!("y"))).to_string(), "λx.x y");
        assert_eq!(lambda!("x", lambda!("y", var!("x"))).to_string(), "λx.λy.x");
    }

    #[test]
    fn test_canonical_names() {
        assert_eq!(canonical_name(0), "@a");
        assert_eq!(canonical_name(25), "@z");
        assert_eq!(canonical_name(26), "@26");
        assert_eq!(canon("λx.λy.x y z"), "λ@a.λ@b.(@a @b) z");
        // one counter for the whole print, not per depth
        assert_eq!(canon("(λx.x) (λx.x)"), "(λ@a.@a) (λ@b.@b)");
        assert_eq!(canon("λx.(λx.x) x"), "λ@a.(λ@b.@b) @a");
    }

    #[test]
    fn test_alpha_equivalent_terms_print_identically() {
        assert_eq!(canon("λa.λb.b a"), canon("λq.λr.r q"));
        assert_ne!(canon("λa.λb.b a"), canon("λa.λb.a b"));
        let deep = (0..30).fold(var!("v"), |body, i| lambda!(format!("v{i}"), body));
        assert!(canonical(&deep).starts_with("λ@a.λ@b."));
        assert!(canonical(&deep).contains("λ@29.v"));
    }

    #[test]
    fn test_numeral_tag_only_when_as_written() {
        let term = parse("_2 f", &Registry::builtin()).unwrap();
        assert_eq!(print(&term, Mode::AsWritten), "(_2) f");
        assert_eq!(canonical(&term), "(λ@a.λ@b.@a (@a @b)) f");
        let bare = parse("_0", &Registry::builtin()).unwrap();
        assert_eq!(print(&bare, Mode::AsWritten), "_0");
    }
}
