//! Hands the history file to the line editor. Nothing here reads or writes
//! the file itself.

use anyhow::Context;
use rustyline::{error::ReadlineError, Editor};
use std::io;
use std::path::Path;
use tracing::debug;

/// Loads earlier entries into `editor`. A missing file is not an error.
pub fn attach(editor: &mut Editor<()>, path: &Path) -> anyhow::Result<()> {
    match editor.load_history(path) {
        Ok(()) => Ok(()),
        Err(ReadlineError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no history yet");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load history from {}.", path.display())),
    }
}

pub fn save(editor: &mut Editor<()>, path: &Path) -> anyhow::Result<()> {
    editor
        .save_history(path)
        .with_context(|| format!("Failed to save history to {}.", path.display()))
}
