use super::Reader;
use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// Reads lines from any buffered source, without prompting.
pub struct IOReader<R>(Lines<R>);

impl<R: BufRead> Reader for IOReader<R> {
    fn next_line(&mut self) -> anyhow::Result<Option<String>> {
        match self.0.next() {
            Some(line) => Ok(Some(line?)),
            None => Ok(None),
        }
    }
}

impl<R: BufRead> IOReader<R> {
    pub fn new(reader: R) -> Self {
        Self(reader.lines())
    }
}

impl IOReader<BufReader<File>> {
    pub fn new_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open {}.", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn lines_then_end() {
        let mut reader = IOReader::new(Cursor::new("one\ntwo\n"));
        assert_eq!(reader.next_line().unwrap(), Some(String::from("one")));
        assert_eq!(reader.more_line().unwrap(), Some(String::from("two")));
        assert_eq!(reader.next_line().unwrap(), None);
    }

    #[test]
    fn from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1 + 1").unwrap();
        let mut reader = IOReader::new_file(file.path()).unwrap();
        assert_eq!(reader.next_line().unwrap(), Some(String::from("1 + 1")));
        assert!(IOReader::new_file("/nonexistent/script").is_err());
    }
}
