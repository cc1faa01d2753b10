//! Operator-facing diagnostics
//!
//! The pipeline never prints directly; it reports through a [`Reporter`]
//! handed in by the caller. [`TermReporter`] renders to the terminal with
//! termcolor, [`RecordingReporter`] keeps messages in memory.
//!
//! ERROR HANDLING STRATEGY FOR DECORATIVE I/O:
//! All termcolor operations use `let _ =` to deliberately ignore errors.
//! Colored output is decorative and non-essential. If stderr/stdout is
//! unavailable (broken pipe, no TTY, etc.), the run continues without it.

use std::cell::RefCell;
use std::io::Write;
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Severity of a reported message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
    Command,
    Output,
}

/// Sink for everything the pipeline wants the operator to see.
pub trait Reporter {
    fn report(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.report(Level::Info, message);
    }

    fn success(&self, message: &str) {
        self.report(Level::Success, message);
    }

    fn warn(&self, message: &str) {
        self.report(Level::Warning, message);
    }

    fn error(&self, message: &str) {
        self.report(Level::Error, message);
    }

    /// Command line about to be executed
    fn command(&self, command_line: &str) {
        self.report(Level::Command, command_line);
    }

    /// Captured output of an external process, passed through verbatim
    fn output(&self, output: &str) {
        self.report(Level::Output, output);
    }
}

/// Colored terminal reporter. Warnings and errors go to stderr.
#[derive(Debug, Clone, Copy)]
pub struct TermReporter {
    choice: ColorChoice,
}

impl TermReporter {
    #[must_use]
    pub fn new(choice: ColorChoice) -> Self {
        Self { choice }
    }
}

impl Default for TermReporter {
    fn default() -> Self {
        Self::new(ColorChoice::Auto)
    }
}

impl Reporter for TermReporter {
    fn report(&self, level: Level, message: &str) {
        let (bufwtr, color, prefix) = match level {
            Level::Info => (BufferWriter::stdout(self.choice), None, ""),
            Level::Success => (BufferWriter::stdout(self.choice), Some(Color::Green), "✓ "),
            Level::Warning => (BufferWriter::stderr(self.choice), Some(Color::Yellow), "⚠️  "),
            Level::Error => (BufferWriter::stderr(self.choice), Some(Color::Red), "❌ "),
            Level::Command => (BufferWriter::stdout(self.choice), Some(Color::Magenta), ""),
            Level::Output => (BufferWriter::stdout(self.choice), None, ""),
        };

        let mut buffer = bufwtr.buffer();
        match (level, color) {
            // whole line colored
            (Level::Command, Some(color)) => {
                let _ = buffer.set_color(ColorSpec::new().set_fg(Some(color)));
                let _ = writeln!(&mut buffer, "{message}");
                let _ = buffer.reset();
            }
            // colored marker, plain message
            (_, Some(color)) => {
                let _ = buffer.set_color(ColorSpec::new().set_fg(Some(color)));
                let _ = write!(&mut buffer, "{prefix}");
                let _ = buffer.reset();
                let _ = writeln!(&mut buffer, "{message}");
            }
            (Level::Output, None) => {
                let _ = write!(&mut buffer, "{message}");
                if !message.is_empty() && !message.ends_with('\n') {
                    let _ = writeln!(&mut buffer);
                }
            }
            (_, None) => {
                let _ = writeln!(&mut buffer, "{message}");
            }
        }
        let _ = bufwtr.print(&buffer);
    }
}

/// Reporter that keeps every message in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    messages: RefCell<Vec<(Level, String)>>,
}

impl RecordingReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<(Level, String)> {
        self.messages.borrow().clone()
    }

    /// Messages of one level, in order
    #[must_use]
    pub fn at(&self, level: Level) -> Vec<String> {
        self.messages
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    #[must_use]
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.messages
            .borrow()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, level: Level, message: &str) {
        self.messages.borrow_mut().push((level, message.to_string()));
    }
}
