//! Interactive prompts for inputs that could not be resolved automatically

use crate::error::Result;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Source of operator answers.
///
/// `Ok(None)` means the operator declined to answer (EOF, `q`, or a
/// non-interactive run); callers turn that into a cancellation.
pub trait Prompter {
    fn ask(&self, question: &str) -> Result<Option<String>>;
}

/// Prompts on stdout and reads answers from stdin
///
/// - Re-prompts on empty input
/// - `q`, `quit` or Ctrl+D (EOF) cancel
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&self, question: &str) -> Result<Option<String>> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        ask_with(&mut input, &mut output, question)
    }
}

fn ask_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> Result<Option<String>> {
    loop {
        write!(output, "{question}")?;
        output.flush()?;

        let mut line = String::new();
        let bytes_read = input.read_line(&mut line)?;

        // EOF (Ctrl+D on Unix, Ctrl+Z on Windows)
        if bytes_read == 0 {
            writeln!(output)?;
            return Ok(None);
        }

        let answer = line.trim();

        if answer.eq_ignore_ascii_case("q") || answer.eq_ignore_ascii_case("quit") {
            return Ok(None);
        }

        if answer.is_empty() {
            writeln!(output, "   Enter a value, or 'q' to cancel")?;
            continue;
        }

        return Ok(Some(answer.to_string()));
    }
}

/// Prompter for unattended runs: every question is declined.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractivePrompter;

impl Prompter for NonInteractivePrompter {
    fn ask(&self, _question: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Prompter replaying canned answers; declines once they run out.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<String>>,
    questions: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: RefCell::new(answers.into_iter().map(Into::into).collect()),
            questions: RefCell::new(Vec::new()),
        }
    }

    /// Questions asked so far
    #[must_use]
    pub fn questions(&self) -> Vec<String> {
        self.questions.borrow().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&self, question: &str) -> Result<Option<String>> {
        self.questions.borrow_mut().push(question.to_string());
        Ok(self.answers.borrow_mut().pop_front())
    }
}
