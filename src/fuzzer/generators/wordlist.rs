//! Wordlist file generator

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;

use super::{Generator, GeneratorKind, ListGenerator};
use crate::error::GeneratorError;

const NAME: &str = "Wordlist";

/// Yields one value per line of a wordlist file
///
/// Empty lines and lines starting with `#` are skipped. The file is read
/// once, at configuration time.
#[derive(Debug, Clone, Default)]
pub struct WordlistGenerator {
    words: ListGenerator,
}

impl WordlistGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn load(path: &Path) -> Result<Vec<String>, GeneratorError> {
        let unreadable = |e: std::io::Error| GeneratorError::Unreadable {
            generator: NAME,
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        let reader = BufReader::new(File::open(path).map_err(unreadable)?);
        let mut words = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(unreadable)?;
            if !line.is_empty() && !line.starts_with('#') {
                words.push(line);
            }
        }
        Ok(words)
    }
}

impl Generator for WordlistGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Wordlist
    }

    fn configure(&mut self, options: &Value) -> Result<(), GeneratorError> {
        let path = options.as_str().ok_or(GeneratorError::WrongType {
            generator: NAME,
            field: "config",
        })?;

        let words = Self::load(Path::new(path))?;
        if words.is_empty() {
            return Err(GeneratorError::Empty { generator: NAME });
        }

        self.words = ListGenerator::from_values(words);
        Ok(())
    }

    fn next_value(&mut self) -> Option<String> {
        self.words.next_value()
    }

    fn reset(&mut self) {
        self.words.reset();
    }

    fn sequence_len(&self) -> usize {
        self.words.sequence_len()
    }
}
