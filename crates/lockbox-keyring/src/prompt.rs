//! Interactive prompt seam

use std::collections::VecDeque;

use crate::error::{KeyringError, Result};

/// Operator interaction used during key selection
pub trait Prompt {
    /// Read a free-text search term; an empty answer means "all keys"
    fn search_term(&mut self, message: &str) -> Result<String>;

    /// Present `items` numbered from 1 and return the zero-based index of
    /// the chosen one. Implementations must only return indices within
    /// `items`, re-asking on out-of-range input.
    fn choose(&mut self, message: &str, items: &[String]) -> Result<usize>;
}

/// A prompt that replays pre-recorded answers
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    terms: VecDeque<String>,
    choices: VecDeque<usize>,
    /// Item lists presented through [`Prompt::choose`], in order
    pub presented: Vec<Vec<String>>,
    /// Number of search terms requested
    pub searches: usize,
}

impl ScriptedPrompt {
    /// A prompt with no answers; any interaction fails
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a search term answer
    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.terms.push_back(term.into());
        self
    }

    /// Queue a numbered choice, 1-based as typed by an operator
    pub fn with_choice(mut self, number: usize) -> Self {
        self.choices.push_back(number);
        self
    }

    /// Whether the prompt was ever asked to choose
    pub fn was_asked(&self) -> bool {
        !self.presented.is_empty()
    }
}

impl Prompt for ScriptedPrompt {
    fn search_term(&mut self, _message: &str) -> Result<String> {
        self.searches += 1;
        self.terms
            .pop_front()
            .ok_or_else(|| KeyringError::Prompt("no scripted search term".to_string()))
    }

    fn choose(&mut self, _message: &str, items: &[String]) -> Result<usize> {
        self.presented.push(items.to_vec());
        let number = self
            .choices
            .pop_front()
            .ok_or_else(|| KeyringError::Prompt("no scripted choice".to_string()))?;
        // passed through unchecked so callers' bounds checks can be exercised
        Ok(number.wrapping_sub(1))
    }
}
