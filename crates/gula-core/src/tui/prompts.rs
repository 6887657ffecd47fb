//! Charm-style overwrite confirmation

use crate::prompt::{stdin_prompt, OverwritePrompt};
use std::io::IsTerminal;
use std::path::Path;

/// Asks through a cliclack confirm on an attended terminal
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl OverwritePrompt for TerminalPrompt {
    fn confirm_overwrite(&mut self, destination: &Path) -> Option<bool> {
        let _ = cliclack::log::warning(format!(
            "Directory {} already exists",
            destination.display()
        ));

        // Esc and Ctrl-C count as no answer
        cliclack::confirm("Replace it?")
            .initial_value(false)
            .interact()
            .ok()
    }
}

/// Pick the prompt for this process
///
/// Piped or redirected stdin is read line by line so scripted answers
/// (`echo s | gula-xcode ...`) keep working.
pub fn overwrite_prompt() -> Box<dyn OverwritePrompt> {
    if std::io::stdin().is_terminal() && console::user_attended_stderr() {
        Box::new(TerminalPrompt)
    } else {
        Box::new(stdin_prompt())
    }
}
