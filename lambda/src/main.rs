use std::path::Path;

use anyhow::Result;
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use lambda::{
    config::Config,
    error::{ParseError, ReductionError, RegistryError},
    expand::expand,
    parser::{parse_expansion, tokenize},
    prelude::*,
    prettify::Prettifier,
    printer::{canonical, print, Mode},
    reducer::{locate_next_redex, normalize, reduce_step, Status},
    registry::Registry,
    term::Term,
    tree_layout::layout_tree,
    tromp::layout_circuit,
};
use tracing_subscriber::EnvFilter;
use util::repl;

fn build_report(e: &ParseError) -> Report<Span> {
    let span = e.span().unwrap_or_default();
    let report = Report::build(ReportKind::Error, (), span.start).with_message(e);
    let label = match e {
        ParseError::Empty => return report.finish(),
        ParseError::InvalidCharacter { found, .. } => {
            format!("Unrecognized {}", found.fg(Color::Red))
        }
        ParseError::InvalidParameter { found, .. } => {
            format!("{} cannot be a parameter", found.fg(Color::Red))
        }
        ParseError::UnexpectedToken { found, expected, .. } => {
            format!("Unexpected {}, expected {expected}", found.fg(Color::Red))
        }
        ParseError::UnexpectedEnd { expected, .. } => {
            format!("Expected {expected}")
        }
        ParseError::TrailingInput { found, .. } => {
            format!("Nothing can follow here, found {}", found.fg(Color::Red))
        }
    };
    report
        .with_label(Label::new(span).with_message(label).with_color(Color::Red))
        .finish()
}

#[derive(Debug, thiserror::Error)]
enum Failure {
    /// Error spans index into the expanded source carried alongside.
    #[error("{1}")]
    Parse(String, ParseError),
    #[error(transparent)]
    Reduction(#[from] ReductionError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

type CommandResult = Result<(), Failure>;

struct Repl {
    config: Config,
    registry: Registry,
}
impl Repl {
    fn new(config: Config) -> Self {
        Self {
            config,
            registry: Registry::builtin(),
        }
    }

    fn parse(&self, input: &str) -> Result<Term, Failure> {
        let expansion = expand(input, &self.registry);
        parse_expansion(&expansion).map_err(|e| Failure::Parse(expansion.text.clone(), e))
    }

    fn tokenize(&self, input: &str) -> CommandResult {
        let expansion = expand(input, &self.registry);
        let tokens = tokenize(&expansion.text)
            .map_err(|e| Failure::Parse(expansion.text.clone(), e))?
            .iter()
            .map(Spanned::value)
            .cloned()
            .collect::<Vec<_>>();
        println!("{tokens:?}");
        Ok(())
    }

    fn step(&self, input: &str) -> CommandResult {
        let term = self.parse(input)?;
        let step = reduce_step(&term)?;
        if step.changed {
            println!("{}", step.term);
        } else {
            println!("{} -- already in normal form", step.term);
        }
        Ok(())
    }

    fn redex(&self, input: &str) -> CommandResult {
        let term = self.parse(input)?;
        match locate_next_redex(&term).and_then(|id| term.find(id)) {
            Some(redex) => println!("{}: {redex}", redex.id()),
            None => println!("none"),
        }
        Ok(())
    }

    fn evaluate(&self, input: &str) -> CommandResult {
        let term = self.parse(input)?;
        let normalized = normalize(&term, self.config.reduction.step_limit)?;
        let prettifier = Prettifier::new(&self.registry, &self.config.prettify);
        println!("{}", canonical(&normalized.term));
        println!("= {}", prettifier.prettify(&normalized.term));
        match normalized.status {
            Status::NormalForm => {
                println!("({} after {} steps)", normalized.status, normalized.steps)
            }
            Status::StepLimitExceeded => eprintln!(
                "Warning: {} after {} steps, the result is not a normal form",
                normalized.status, normalized.steps
            ),
        }
        Ok(())
    }

    fn pretty(&self, input: &str) -> CommandResult {
        let term = self.parse(input)?;
        let prettifier = Prettifier::new(&self.registry, &self.config.prettify);
        println!("{}", prettifier.prettify(&term));
        Ok(())
    }

    fn tree(&self, input: &str) -> CommandResult {
        let term = self.parse(input)?;
        let layout = layout_tree(&term, locate_next_redex(&term), &self.config.tree);
        println!("{}", serde_json::to_string_pretty(&layout)?);
        Ok(())
    }

    fn tromp(&self, input: &str) -> CommandResult {
        let term = self.parse(input)?;
        let layout = layout_circuit(&term, self.config.tromp.scale, locate_next_redex(&term));
        println!("{}", serde_json::to_string_pretty(&layout)?);
        Ok(())
    }

    fn define(&mut self, input: &str) -> CommandResult {
        let Some((name, body)) = input.split_once('=') else {
            eprintln!("Usage: :def NAME = term");
            return Ok(());
        };
        let named = self.registry.define(name.trim(), body.trim(), None)?;
        println!("_{} = {}", named.name, named.lambda);
        Ok(())
    }

    fn show_names(&self) {
        for named in self.registry.entries() {
            match &named.description {
                Some(description) => {
                    println!("_{:<8} {:<36} -- {description}", named.name, named.lambda)
                }
                None => println!("_{:<8} {}", named.name, named.lambda),
            }
        }
    }

    fn show_help() {
        println!(
            "{}",
            r#"
term                -- same as :eval term
:tokens     term    -- show tokenized term
:parse      term    -- show parsed term
:canon      term    -- show the canonical form of the term
:step       term    -- reduce the leftmost outermost redex once
:redex      term    -- show the redex the next step contracts
:eval       term    -- reduce to normal form
:pretty     term    -- show the term with known subterms named
:tree       term    -- show the syntax tree layout as JSON
:tromp      term    -- show the Tromp diagram layout as JSON
:def NAME = term    -- define _NAME
:names              -- list defined names
:help               -- show this message
end a line with the continuation marker (`&` by default) to continue it
        "#
            .trim()
        );
    }

    fn handle_repl_input(&mut self, input: &str) -> CommandResult {
        let (cmd, input) = if let Some(stripped) = input.strip_prefix(':') {
            stripped
                .trim_start()
                .split_once(' ')
                .unwrap_or((stripped, ""))
        } else {
            ("", input)
        };
        match cmd {
            "to" | "tokens" => self.tokenize(input)?,
            "p" | "parse" => println!("{}", print(&self.parse(input)?, Mode::AsWritten)),
            "c" | "canon" => println!("{}", canonical(&self.parse(input)?)),
            "s" | "step" => self.step(input)?,
            "r" | "redex" => self.redex(input)?,
            "" | "e" | "eval" => self.evaluate(input)?,
            "pr" | "pretty" => self.pretty(input)?,
            "tree" => self.tree(input)?,
            "tromp" => self.tromp(input)?,
            "d" | "def" => self.define(input)?,
            "n" | "names" => self.show_names(),
            "h" | "he" | "hel" | "help" => Self::show_help(),
            _ => {
                eprintln!("Unknown command {cmd}");
                Self::show_help();
            }
        }
        Ok(())
    }
}
impl repl::Repl for Repl {
    type Error = anyhow::Error;
    fn prompt(&self) -> &str {
        &self.config.repl.prompt
    }
    fn history(&self) -> Option<&Path> {
        self.config.repl.history.as_deref()
    }
    fn continuation(&self) -> &str {
        &self.config.repl.continuation
    }
    fn evaluate(&mut self, input: String) -> Result<(), Self::Error> {
        if input.trim().is_empty() {
            return Ok(());
        }
        match self.handle_repl_input(&input) {
            Err(Failure::Parse(source, e)) => build_report(&e).eprint(Source::from(&source))?,
            Err(e) => eprintln!("Error: {e}"),
            Ok(()) => {}
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let config = Config::discover()?;
    println!("Hi, this is an untyped lambda calculus REPL. :h to show help");
    println!();
    repl::start_repl(Repl::new(config))?;
    Ok(())
}
