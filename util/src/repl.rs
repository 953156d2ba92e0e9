use std::path::Path;

use rustyline::{error::ReadlineError, Editor};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error<E> {
    #[error(transparent)]
    Readline(ReadlineError),
    #[error("Eval failed: {0:?}")]
    EvalError(E),
}

pub trait Repl {
    type Error: std::fmt::Debug;
    fn prompt(&self) -> &str {
        ">> "
    }
    fn history(&self) -> Option<&Path> {
        None
    }
    /// Suffix that continues the input onto the next line.
    fn continuation(&self) -> &str {
        "\\"
    }
    fn evaluate(&mut self, input: String) -> Result<(), Self::Error>;
}

/// Strips the continuation marker, if `line` ends in one.
pub fn continued<'l>(line: &'l str, marker: &str) -> Option<&'l str> {
    if marker.is_empty() {
        return None;
    }
    line.strip_suffix(marker)
}

/// Reads lines until EOF or interrupt. A line ending in
/// [`Repl::continuation`] continues onto the next one.
pub fn start_repl<R: Repl>(mut repl: R) -> Result<(), Error<R::Error>> {
    let mut editor = Editor::<()>::new();
    if let Some(history) = repl.history() {
        editor.load_history(history).ok();
    }
    let mut input: Option<String> = None;
    loop {
        let prompt = if input.is_some() { ".. " } else { repl.prompt() };
        match editor.readline(prompt) {
            Ok(line) => {
                if let Some(head) = continued(&line, repl.continuation()) {
                    let input = input.get_or_insert_with(String::new);
                    input.push_str(head);
                    input.push('\n');
                    continue;
                }
                let input = if let Some(mut input) = input.take() {
                    input.push_str(line.as_str());
                    input
                } else {
                    line
                };
                editor.add_history_entry(input.as_str());
                repl.evaluate(input).map_err(Error::EvalError)?;
                if let Some(history) = repl.history() {
                    editor.save_history(history).map_err(Error::Readline)?;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("Bye!");
                break Ok(());
            }
            Err(e) => break Err(Error::Readline(e)),
        }
    }
}
