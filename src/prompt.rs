// ABOUTME: Operator interaction for the existing-schema decision
// ABOUTME: Prompt trait plus a line-based implementation over stdin or in-memory buffers

use crate::reporter::Terminal;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Input closed before a choice was entered")]
    InputClosed,
    #[error("Terminal IO error")]
    Io(#[from] io::Error),
}

/// How to treat a schema that already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Drop the schema and create it again
    Recreate,
    /// Keep the schema and run the script against it
    Reuse,
    /// Stop without changing anything
    Exit,
}

impl Disposition {
    /// Menu entries, in the order their numbers are accepted
    pub const MENU: [&'static str; 3] = [
        "Drop and recreate the database (ALL DATA WILL BE LOST)",
        "Use the existing database (tables will be created if they don't exist)",
        "Exit",
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recreate => "recreate",
            Self::Reuse => "reuse",
            Self::Exit => "exit",
        }
    }

    /// Map a menu answer (`1`, `2` or `3`) to a disposition
    pub fn from_answer(answer: &str) -> Option<Self> {
        match answer.trim() {
            "1" => Some(Self::Recreate),
            "2" => Some(Self::Reuse),
            "3" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Asks the operator to pick from a numbered list
pub trait Prompt {
    /// Show the question and options, and return the raw answer line
    fn prompt_choice(&mut self, question: &str, options: &[&str]) -> Result<String, PromptError>;

    /// Release the underlying input. Safe to call more than once.
    fn close(&mut self);
}

/// Reads answers line by line from `R`, writing the menu to `W`
pub struct LinePrompt<R, W> {
    input: Option<R>,
    output: W,
}

impl LinePrompt<io::StdinLock<'static>, Box<dyn Write>> {
    /// Read answers from stdin, writing the menu to the given stream
    pub fn stdin(terminal: Terminal) -> Self {
        let (output, _) = terminal.writer();
        Self::new(io::stdin().lock(), output)
    }
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: Some(input),
            output,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.input.is_none()
    }

    /// Everything written so far (the rendered menus)
    pub fn output(&self) -> &W {
        &self.output
    }
}

impl<R: BufRead, W: Write> Prompt for LinePrompt<R, W> {
    fn prompt_choice(&mut self, question: &str, options: &[&str]) -> Result<String, PromptError> {
        let input = self.input.as_mut().ok_or(PromptError::InputClosed)?;

        writeln!(self.output)?;
        writeln!(self.output, "{}", question)?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "  {}. {}", i + 1, option)?;
        }
        write!(self.output, "Enter your choice (1-{}): ", options.len())?;
        self.output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(PromptError::InputClosed);
        }
        Ok(line.trim().to_string())
    }

    fn close(&mut self) {
        if self.input.take().is_some() {
            log::debug!("Prompt input released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_from_answer() {
        assert_eq!(Disposition::from_answer("1"), Some(Disposition::Recreate));
        assert_eq!(Disposition::from_answer(" 2\n"), Some(Disposition::Reuse));
        assert_eq!(Disposition::from_answer("3"), Some(Disposition::Exit));
        assert_eq!(Disposition::from_answer("4"), None);
        assert_eq!(Disposition::from_answer(""), None);
        assert_eq!(Disposition::from_answer("yes"), None);
    }

    #[test]
    fn test_line_prompt_renders_menu_and_reads_answer() {
        let mut prompt = LinePrompt::new(Cursor::new("2\n"), Vec::new());
        let answer = prompt
            .prompt_choice("Database 'shop' already exists.", &Disposition::MENU)
            .unwrap();
        assert_eq!(answer, "2");

        let rendered = String::from_utf8(prompt.output().clone()).unwrap();
        assert!(rendered.contains("Database 'shop' already exists."));
        assert!(rendered.contains("  1. Drop and recreate"));
        assert!(rendered.contains("  3. Exit"));
        assert!(rendered.contains("Enter your choice (1-3): "));
    }

    #[test]
    fn test_line_prompt_eof_is_closed_input() {
        let mut prompt = LinePrompt::new(Cursor::new(""), Vec::new());
        let err = prompt.prompt_choice("?", &["a"]).unwrap_err();
        assert!(matches!(err, PromptError::InputClosed));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut prompt = LinePrompt::new(Cursor::new("1\n"), Vec::new());
        prompt.close();
        prompt.close();
        assert!(prompt.is_closed());
        assert!(matches!(
            prompt.prompt_choice("?", &["a"]),
            Err(PromptError::InputClosed)
        ));
    }
}
