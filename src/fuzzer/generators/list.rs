//! Inline list generator

use serde_json::Value;

use super::{Generator, GeneratorKind};
use crate::error::GeneratorError;

const NAME: &str = "List";

/// Yields each configured string once, in order
#[derive(Debug, Clone, Default)]
pub struct ListGenerator {
    values: Vec<String>,
    index: usize,
}

impl ListGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configured generator directly from values
    pub fn from_values(values: Vec<String>) -> Self {
        Self { values, index: 0 }
    }
}

impl Generator for ListGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::List
    }

    fn configure(&mut self, options: &Value) -> Result<(), GeneratorError> {
        let items = options.as_array().ok_or(GeneratorError::WrongType {
            generator: NAME,
            field: "config",
        })?;

        let values = items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or(GeneratorError::WrongType {
                    generator: NAME,
                    field: "config[]",
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if values.is_empty() {
            return Err(GeneratorError::Empty { generator: NAME });
        }

        self.values = values;
        self.index = 0;
        Ok(())
    }

    fn next_value(&mut self) -> Option<String> {
        let value = self.values.get(self.index)?.clone();
        self.index += 1;
        Some(value)
    }

    fn reset(&mut self) {
        self.index = 0;
    }

    fn sequence_len(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzer::generators::drain;
    use serde_json::json;

    #[test]
    fn test_configure_rejects_non_strings() {
        let mut generator = ListGenerator::new();
        assert!(generator.configure(&json!("a")).is_err());
        assert!(generator.configure(&json!(["a", 1])).is_err());
        assert_eq!(
            generator.configure(&json!([])),
            Err(GeneratorError::Empty { generator: NAME })
        );
    }

    #[test]
    fn test_values_in_order_and_replay() {
        let mut generator = ListGenerator::new();
        generator.configure(&json!(["admin", "' OR 1=1--", ""])).unwrap();

        assert_eq!(drain(&mut generator), vec!["admin", "' OR 1=1--", ""]);
        assert_eq!(generator.next_value(), None);

        generator.reset();
        assert_eq!(generator.next_value(), Some("admin".to_string()));
        assert_eq!(generator.sequence_len(), 3);
    }
}
