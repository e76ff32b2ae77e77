//! Interactive prompts for values not supplied as flags.

use crate::dispatch::CommandError;
use dialoguer::{Input, Password};
use std::io::{self, IsTerminal};

/// Result of a single prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome<T> {
    Answered(T),
    Cancelled,
}

pub trait Prompter {
    fn text(&mut self, label: &str) -> Result<PromptOutcome<String>, CommandError>;
    fn password(&mut self, label: &str) -> Result<PromptOutcome<String>, CommandError>;
}

/// Prompts on the controlling terminal. Without a terminal every prompt
/// fails as a missing value instead of blocking.
pub struct TerminalPrompter {
    interactive: bool,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            interactive: io::stdin().is_terminal(),
        }
    }

    fn ensure_interactive(&self, label: &str) -> Result<(), CommandError> {
        if self.interactive {
            Ok(())
        } else {
            Err(CommandError::Validation(format!(
                "{label} is required (pass it as a flag when stdin is not a terminal)"
            )))
        }
    }
}

impl Prompter for TerminalPrompter {
    fn text(&mut self, label: &str) -> Result<PromptOutcome<String>, CommandError> {
        self.ensure_interactive(label)?;
        let answer = Input::<String>::new().with_prompt(label).interact_text();
        outcome(answer)
    }

    fn password(&mut self, label: &str) -> Result<PromptOutcome<String>, CommandError> {
        self.ensure_interactive(label)?;
        let answer = Password::new().with_prompt(label).interact();
        outcome(answer)
    }
}

fn outcome(answer: dialoguer::Result<String>) -> Result<PromptOutcome<String>, CommandError> {
    match answer {
        Ok(value) => Ok(PromptOutcome::Answered(value)),
        Err(dialoguer::Error::IO(err))
            if matches!(
                err.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::UnexpectedEof
            ) =>
        {
            Ok(PromptOutcome::Cancelled)
        }
        Err(err) => Err(CommandError::Prompt(err.to_string())),
    }
}

/// Uses the flag value when one was given, otherwise asks.
pub fn flag_or_prompt<P: Prompter + ?Sized>(
    prompter: &mut P,
    flag: Option<String>,
    label: &str,
    secret: bool,
) -> Result<String, CommandError> {
    if let Some(value) = flag.filter(|v| !v.trim().is_empty()) {
        return Ok(value);
    }

    let answer = if secret {
        prompter.password(label)?
    } else {
        prompter.text(label)?
    };

    match answer {
        PromptOutcome::Answered(value) if !value.trim().is_empty() => Ok(value),
        PromptOutcome::Answered(_) => Err(CommandError::missing(label)),
        PromptOutcome::Cancelled => Err(CommandError::Cancelled),
    }
}
