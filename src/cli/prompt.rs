//! Yes/no confirmation before applying updates

use std::io::{self, BufRead, IsTerminal, Write};

use dialoguer::{theme::ColorfulTheme, Confirm};

/// Asks the user a yes/no question
pub trait Prompt {
    fn confirm(&mut self, question: &str) -> io::Result<bool>;
}

/// Reads the answer as a line of text
///
/// Only `y` or `Y` confirms; anything else, including end of input, declines.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompt for LinePrompt<R, W> {
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        write!(self.output, "{} [y/N] ", question)?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }
}

/// Interactive prompt on a terminal, line-based when stdin is piped
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        if io::stdin().is_terminal() {
            return Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(question)
                .default(false)
                .interact()
                .map_err(io::Error::other);
        }
        LinePrompt::new(io::stdin().lock(), io::stderr()).confirm(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(input: &str) -> (bool, String) {
        let mut output = Vec::new();
        let answer = LinePrompt::new(input.as_bytes(), &mut output)
            .confirm("Apply changes?")
            .unwrap();
        (answer, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_yes_answers() {
        assert!(ask("y\n").0);
        assert!(ask("Y\n").0);
        assert!(ask("  y  \n").0);
    }

    #[test]
    fn test_everything_else_declines() {
        for input in ["n\n", "yes\n", "\n", ""] {
            assert!(!ask(input).0, "{input:?}");
        }
    }

    #[test]
    fn test_question_is_written() {
        assert_eq!(ask("n\n").1, "Apply changes? [y/N] ");
    }
}
