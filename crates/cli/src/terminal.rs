use std::io::{self, BufRead, Write};

use anyhow::Result;
use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
};

const SPLASH: &str = r#"
  _____                     _
 |_   _|_ _ _ __   ___  ___| |_ _ __ _   _
   | |/ _` | '_ \ / _ \/ __| __| '__| | | |
   | | (_| | |_) |  __/\__ \ |_| |  | |_| |
   |_|\__,_| .__/ \___||___/\__|_|   \__, |
           |_|                       |___/
"#;

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const HEADER: Color = Color::Magenta;
    const PROMPT: Color = Color::Green;
    const OPTION: Color = Color::Cyan;
    const SUCCESS: Color = Color::DarkGreen;
    const WARNING: Color = Color::Yellow;
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
}

/// Menu and message I/O for the interactive front end.
///
/// Generic over its streams so menu flows can be driven from tests.
pub struct Terminal<I = io::StdinLock<'static>, O = io::Stdout> {
    input: I,
    output: O,
}

impl Terminal {
    pub fn new() -> Self {
        Self::with_io(io::stdin().lock(), io::stdout())
    }
}

impl<I: BufRead, O: Write> Terminal<I, O> {
    pub fn with_io(input: I, output: O) -> Self {
        Self { input, output }
    }

    #[cfg(test)]
    pub fn into_output(self) -> O {
        self.output
    }

    pub fn print_splash(&mut self) -> Result<()> {
        queue!(
            self.output,
            SetForegroundColor(Colors::HEADER),
            Print(SPLASH),
            ResetColor,
        )?;
        self.output.flush()?;
        Ok(())
    }

    /// Print a numbered menu. Options are numbered from 1.
    pub fn print_menu(&mut self, title: &str, options: &[&str]) -> Result<()> {
        queue!(
            self.output,
            Print("\n"),
            SetForegroundColor(Colors::HEADER),
            Print(format!("{title}\n")),
            ResetColor,
        )?;
        for (i, option) in options.iter().enumerate() {
            queue!(
                self.output,
                SetForegroundColor(Colors::OPTION),
                Print(format!("{}. ", i + 1)),
                ResetColor,
                Print(format!("{option}\n")),
            )?;
        }
        self.output.flush()?;
        Ok(())
    }

    /// Read one trimmed line. `None` at end of input.
    pub fn prompt(&mut self, prompt: &str) -> Result<Option<String>> {
        queue!(
            self.output,
            SetForegroundColor(Colors::PROMPT),
            Print(prompt),
            ResetColor,
        )?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Prompt until the answer is one of `valid`. `None` at end of input.
    pub fn prompt_choice(&mut self, prompt: &str, valid: &[&str]) -> Result<Option<String>> {
        loop {
            match self.prompt(prompt)? {
                None => return Ok(None),
                Some(answer) if valid.contains(&answer.as_str()) => return Ok(Some(answer)),
                Some(_) => self.print_warning("Invalid selection. Please try again.")?,
            }
        }
    }

    pub fn print_info(&mut self, msg: &str) -> Result<()> {
        self.print_colored(Colors::DIM, msg)
    }

    pub fn print_success(&mut self, msg: &str) -> Result<()> {
        self.print_colored(Colors::SUCCESS, msg)
    }

    pub fn print_warning(&mut self, msg: &str) -> Result<()> {
        self.print_colored(Colors::WARNING, msg)
    }

    pub fn print_error(&mut self, msg: &str) -> Result<()> {
        self.print_colored(Colors::ERROR, &format!("Error: {msg}"))
    }

    /// Uncolored text, used for the manual.
    pub fn print_plain(&mut self, text: &str) -> Result<()> {
        queue!(self.output, Print(text))?;
        self.output.flush()?;
        Ok(())
    }

    fn print_colored(&mut self, color: Color, msg: &str) -> Result<()> {
        queue!(
            self.output,
            SetForegroundColor(color),
            Print(format!("{msg}\n")),
            ResetColor,
        )?;
        self.output.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn terminal(input: &str) -> Terminal<Cursor<Vec<u8>>, Vec<u8>> {
        Terminal::with_io(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn prompt_choice_reprompts_until_valid() {
        let mut term = terminal("9\n\n  2 \n");
        let choice = term.prompt_choice("Select: ", &["1", "2"]).unwrap();
        assert_eq!(choice.as_deref(), Some("2"));
        let out = String::from_utf8(term.into_output()).unwrap();
        assert_eq!(out.matches("Invalid selection").count(), 2);
    }

    #[test]
    fn prompt_returns_none_at_eof() {
        let mut term = terminal("");
        assert!(term.prompt("> ").unwrap().is_none());
        assert!(term.prompt_choice("> ", &["1"]).unwrap().is_none());
    }

    #[test]
    fn menu_is_numbered() {
        let mut term = terminal("");
        term.print_menu("Pick", &["Alpha", "Beta"]).unwrap();
        let out = String::from_utf8(term.into_output()).unwrap();
        assert!(out.contains("1. "));
        assert!(out.contains("Alpha"));
        assert!(out.contains("2. "));
    }
}
