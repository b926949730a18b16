//! Interactive prompts for values not supplied as flags.

use anyhow::Result;
use rustyline::DefaultEditor;

pub struct Prompter {
    rl: DefaultEditor,
}

impl Prompter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            rl: DefaultEditor::new()?,
        })
    }

    /// Read one trimmed line.
    pub fn line(&mut self, prompt: &str) -> Result<String> {
        let line = self.rl.readline(prompt)?;
        Ok(line.trim().to_string())
    }

    /// Read a non-empty trimmed line, reprompting on empty input.
    pub fn required(&mut self, prompt: &str) -> Result<String> {
        loop {
            let line = self.line(prompt)?;
            if !line.is_empty() {
                return Ok(line);
            }
            println!("  a value is required");
        }
    }

    /// Yes/no question; only an explicit `y`/`yes` counts as yes.
    pub fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let answer = self.line(prompt)?.to_ascii_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}
