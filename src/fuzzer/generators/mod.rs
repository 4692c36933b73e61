//! Value generators
//!
//! A generator produces a finite, deterministic and replayable sequence of
//! string values for one fuzzing dimension.

mod increment;
mod list;
mod value;
mod wordlist;

pub use increment::IncrementGenerator;
pub use list::ListGenerator;
pub use value::ValueGenerator;
pub use wordlist::WordlistGenerator;

use serde_json::Value;

use crate::error::GeneratorError;

/// Common interface for value generators
pub trait Generator: Send + std::fmt::Debug {
    /// Registered type name
    fn kind(&self) -> GeneratorKind;

    /// Validate and store options. The accepted state becomes the one
    /// `reset` returns to.
    fn configure(&mut self, options: &Value) -> Result<(), GeneratorError>;

    /// Next value, or `None` once the sequence is exhausted.
    ///
    /// Calling again after exhaustion keeps returning `None` until `reset`.
    fn next_value(&mut self) -> Option<String>;

    /// Rewind to the first value of the configured sequence
    fn reset(&mut self);

    /// Number of values in the full configured sequence
    fn sequence_len(&self) -> usize;
}

/// Generator types that can be named in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    Increment,
    Value,
    List,
    Wordlist,
}

impl GeneratorKind {
    pub fn all() -> &'static [GeneratorKind] {
        &[
            GeneratorKind::Increment,
            GeneratorKind::Value,
            GeneratorKind::List,
            GeneratorKind::Wordlist,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            GeneratorKind::Increment => "increment",
            GeneratorKind::Value => "value",
            GeneratorKind::List => "list",
            GeneratorKind::Wordlist => "wordlist",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GeneratorKind::Increment => "Integers from start to stop by step",
            GeneratorKind::Value => "A single constant value",
            GeneratorKind::List => "Each string of an inline list",
            GeneratorKind::Wordlist => "Each line of a wordlist file",
        }
    }

    /// Look up a generator type by its configured name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        Self::all().iter().copied().find(|k| k.name() == name)
    }

    /// Create an unconfigured generator of this type
    pub fn create(&self) -> Box<dyn Generator> {
        match self {
            GeneratorKind::Increment => Box::new(IncrementGenerator::new()),
            GeneratorKind::Value => Box::new(ValueGenerator::new()),
            GeneratorKind::List => Box::new(ListGenerator::new()),
            GeneratorKind::Wordlist => Box::new(WordlistGenerator::new()),
        }
    }
}

impl std::fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
pub(crate) fn drain(generator: &mut dyn Generator) -> Vec<String> {
    std::iter::from_fn(|| generator.next_value()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_lookup_is_case_insensitive() {
        assert_eq!(GeneratorKind::from_name("Increment"), Some(GeneratorKind::Increment));
        assert_eq!(GeneratorKind::from_name("VALUE"), Some(GeneratorKind::Value));
        assert_eq!(GeneratorKind::from_name("wordlist"), Some(GeneratorKind::Wordlist));
        assert_eq!(GeneratorKind::from_name("random"), None);
    }

    #[test]
    fn test_every_kind_creates_matching_generator() {
        for kind in GeneratorKind::all() {
            assert_eq!(kind.create().kind(), *kind);
        }
    }
}
