//! Overwrite confirmation
//!
//! Placing a module over an existing directory needs an operator decision.
//! The decision is injected through [`OverwritePrompt`] so that the placement
//! logic never touches a terminal directly.

use std::io::{BufRead, StdinLock};
use std::path::Path;

/// Decides whether an existing destination may be replaced
pub trait OverwritePrompt {
    /// `Some(true)` to replace, `Some(false)` to keep the existing directory,
    /// `None` when no answer could be obtained.
    fn confirm_overwrite(&mut self, destination: &Path) -> Option<bool>;
}

/// Reads one answer per question from a line-oriented input
pub struct LinePrompt<R> {
    input: R,
}

impl<R: BufRead> LinePrompt<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }
}

impl<R: BufRead> OverwritePrompt for LinePrompt<R> {
    fn confirm_overwrite(&mut self, destination: &Path) -> Option<bool> {
        eprintln!("-----------------------------------------------");
        eprintln!(
            "Directory '{}' already exists. Replace it? (s/n)",
            destination.display()
        );
        eprintln!("-----------------------------------------------");

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(is_affirmative(&line)),
            Err(e) => {
                tracing::debug!("failed to read overwrite answer: {}", e);
                None
            }
        }
    }
}

/// Prompt reading answers from the process stdin
pub fn stdin_prompt() -> LinePrompt<StdinLock<'static>> {
    LinePrompt::new(std::io::stdin().lock())
}

/// Always gives the same answer; used for non-interactive callers
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub Option<bool>);

impl OverwritePrompt for FixedAnswer {
    fn confirm_overwrite(&mut self, _destination: &Path) -> Option<bool> {
        self.0
    }
}

/// Whether an operator answer means "yes" (`s`/`si` as well as `y`/`yes`)
pub fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "si" | "sí" | "y" | "yes"
    )
}
