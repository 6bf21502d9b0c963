//! Interactive prompts and confirmations.
//!
//! The session never talks to the terminal directly; it goes through a
//! [`Prompter`]. [`DialoguerPrompter`] is the terminal implementation and
//! [`ScriptedPrompter`] answers from a queue for tests and unattended use.
//!
//! A terminal read cannot be woken by the signal watcher, so a SIGTERM
//! that lands while a dialoguer prompt is waiting only takes effect once
//! the prompt returns. [`DialoguerPrompter`] checks the interrupt flag
//! before showing a prompt and again after it, discarding the answer.

use std::collections::VecDeque;
use std::io;

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use thiserror::Error;

use crate::util::signal;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt interrupted")]
    Interrupted,

    #[error("no answer available for prompt: {0}")]
    NoAnswer(String),

    #[error("prompt failed: {0}")]
    Io(#[source] io::Error),
}

impl From<dialoguer::Error> for PromptError {
    fn from(err: dialoguer::Error) -> Self {
        match err {
            dialoguer::Error::IO(e) if e.kind() == io::ErrorKind::Interrupted => {
                PromptError::Interrupted
            }
            dialoguer::Error::IO(e) => PromptError::Io(e),
        }
    }
}

/// Answer to the merge review menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeReview {
    Commit,
    ShowDiff,
    Cancel,
}

impl MergeReview {
    const CHOICES: [(&'static str, MergeReview); 3] = [
        ("Commit the merge", MergeReview::Commit),
        ("Show diff", MergeReview::ShowDiff),
        ("Cancel", MergeReview::Cancel),
    ];
}

/// Source of user decisions.
pub trait Prompter {
    /// Yes/no question.
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, PromptError>;

    /// Free text; empty answers are rejected by the implementation.
    fn input(&mut self, message: &str) -> Result<String, PromptError>;

    /// What to do with a merge that is ready to be committed.
    fn review_merge(&mut self, message: &str) -> Result<MergeReview, PromptError>;
}

/// Terminal prompts via dialoguer.
pub struct DialoguerPrompter {
    theme: ColorfulTheme,
}

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for DialoguerPrompter {
    fn default() -> Self {
        Self::new()
    }
}

fn check_interrupt() -> Result<(), PromptError> {
    if signal::interrupted() {
        return Err(PromptError::Interrupted);
    }
    Ok(())
}

impl Prompter for DialoguerPrompter {
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, PromptError> {
        check_interrupt()?;
        let answer = Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(default)
            .interact()?;
        check_interrupt()?;
        Ok(answer)
    }

    fn input(&mut self, message: &str) -> Result<String, PromptError> {
        check_interrupt()?;
        let text: String = Input::with_theme(&self.theme)
            .with_prompt(message)
            .validate_with(|s: &String| {
                if s.trim().is_empty() {
                    Err("message must not be empty")
                } else {
                    Ok(())
                }
            })
            .interact_text()?;
        check_interrupt()?;
        Ok(text.trim().to_string())
    }

    fn review_merge(&mut self, message: &str) -> Result<MergeReview, PromptError> {
        check_interrupt()?;
        let labels: Vec<&str> = MergeReview::CHOICES.iter().map(|(l, _)| *l).collect();
        let selection = Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(&labels)
            .default(0)
            .interact()?;
        check_interrupt()?;
        Ok(MergeReview::CHOICES
            .get(selection)
            .map(|(_, choice)| *choice)
            .unwrap_or(MergeReview::Cancel))
    }
}

/// A queued answer for [`ScriptedPrompter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Confirm(bool),
    Input(String),
    Review(MergeReview),
}

/// Answers prompts from a fixed queue, in order.
///
/// A prompt whose next queued answer has a different kind, or an empty
/// queue, yields [`PromptError::NoAnswer`].
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Prompts shown so far.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    fn next(&mut self, message: &str) -> Option<Answer> {
        self.asked.push(message.to_string());
        self.answers.pop_front()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, message: &str, _default: bool) -> Result<bool, PromptError> {
        match self.next(message) {
            Some(Answer::Confirm(yes)) => Ok(yes),
            _ => Err(PromptError::NoAnswer(message.to_string())),
        }
    }

    fn input(&mut self, message: &str) -> Result<String, PromptError> {
        match self.next(message) {
            Some(Answer::Input(text)) => Ok(text),
            _ => Err(PromptError::NoAnswer(message.to_string())),
        }
    }

    fn review_merge(&mut self, message: &str) -> Result<MergeReview, PromptError> {
        match self.next(message) {
            Some(Answer::Review(choice)) => Ok(choice),
            _ => Err(PromptError::NoAnswer(message.to_string())),
        }
    }
}
