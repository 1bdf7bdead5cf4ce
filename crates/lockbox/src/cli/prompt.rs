//! Terminal prompt backed by dialoguer

use console::{style, Term};
use dialoguer::Input;

use lockbox_keyring::{KeyringError, Prompt};

/// Asks the operator on the terminal
pub struct TerminalPrompt {
    term: Term,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

// Ctrl-C raises SIGINT from inside console's key reader, so an interrupt
// never comes back as an error here
fn prompt_error(err: dialoguer::Error) -> KeyringError {
    KeyringError::Prompt(err.to_string())
}

impl Prompt for TerminalPrompt {
    fn search_term(&mut self, message: &str) -> lockbox_keyring::Result<String> {
        Input::<String>::new()
            .with_prompt(message)
            .allow_empty(true)
            .interact_text_on(&self.term)
            .map_err(prompt_error)
    }

    fn choose(&mut self, message: &str, items: &[String]) -> lockbox_keyring::Result<usize> {
        let max = items.len();
        self.term.write_line("")?;
        for (number, item) in items.iter().enumerate().map(|(i, item)| (i + 1, item)) {
            self.term
                .write_line(&format!("{}. {}", style(number).cyan(), item))?;
        }
        self.term.write_line("")?;

        let number = Input::<usize>::new()
            .with_prompt(message)
            .validate_with(|n: &usize| {
                if (1..=max).contains(n) {
                    Ok(())
                } else {
                    Err(format!("Enter a number between 1 and {max}"))
                }
            })
            .interact_text_on(&self.term)
            .map_err(prompt_error)?;

        Ok(number - 1)
    }
}
