//! Commit validation.
//!
//! Rules run in a fixed order and the first failure wins:
//!
//! 1. the item must have an author login,
//! 2. the message must not exceed the configured length,
//! 3. the message must start with a letter and contain only word
//!    characters, spaces and a small set of punctuation.
//!
//! A failed check means "skip this record", not an operational error.

use regex::Regex;
use thiserror::Error;

use crate::github::CommitItem;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("validate CommitItem: no author")]
    NoAuthor,
    #[error("validate CommitItem: commit message too long")]
    MessageTooLong,
    #[error("validate CommitItem: commit message has formatting issues")]
    MessageFormatInvalid,
}

// ASCII only: word characters are `[A-Za-z0-9_]`.
const MESSAGE_PATTERN: &str = r##"^[A-Za-z][A-Za-z0-9_ '!"#$%&*+,./:;=?@^|~-]*$"##;

pub struct CommitValidator {
    max_message_length: usize,
    pattern: Regex,
}

impl CommitValidator {
    pub fn new(max_message_length: usize) -> Result<Self, regex::Error> {
        Ok(Self {
            max_message_length,
            pattern: Regex::new(MESSAGE_PATTERN)?,
        })
    }

    pub fn max_message_length(&self) -> usize {
        self.max_message_length
    }

    pub fn validate(&self, item: &CommitItem) -> Result<(), ValidationError> {
        if item.author.login.is_empty() {
            return Err(ValidationError::NoAuthor);
        }
        self.validate_message(&item.commit.message)
    }

    pub fn validate_message(&self, message: &str) -> Result<(), ValidationError> {
        if message.chars().count() > self.max_message_length {
            return Err(ValidationError::MessageTooLong);
        }
        if !self.pattern.is_match(message) {
            return Err(ValidationError::MessageFormatInvalid);
        }
        Ok(())
    }
}
