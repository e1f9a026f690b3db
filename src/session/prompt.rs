extern crate rustyline;

use super::{history, Options, Reader};
use rustyline::{error::ReadlineError, Editor};
use std::path::PathBuf;

const MORE_PROMPT: &str = "... ";

/// Reads lines interactively through rustyline.
pub struct PromptReader {
    editor: Editor<()>,
    prompt: String,
    history: Option<PathBuf>,
}

impl Reader for PromptReader {
    fn init(&mut self, options: &Options) -> anyhow::Result<()> {
        self.prompt = options.prompt.clone();
        self.history = options.history.clone();
        match &self.history {
            Some(path) => history::attach(&mut self.editor, path),
            None => Ok(()),
        }
    }

    fn next_line(&mut self) -> anyhow::Result<Option<String>> {
        match self.editor.readline(&self.prompt) {
            Ok(s) => Ok(Some(s)),
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn more_line(&mut self) -> anyhow::Result<Option<String>> {
        match self.editor.readline(MORE_PROMPT) {
            Ok(s) => Ok(Some(s)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn add_history(&mut self, entry: &str) {
        self.editor.add_history_entry(entry);
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        match &self.history {
            Some(path) => history::save(&mut self.editor, path),
            None => Ok(()),
        }
    }
}

impl PromptReader {
    pub fn new() -> Self {
        Self {
            editor: Editor::new(),
            prompt: Options::default().prompt,
            history: None,
        }
    }
}

impl Default for PromptReader {
    fn default() -> Self {
        Self::new()
    }
}
