//! Constant value generator

use serde_json::Value;

use super::{Generator, GeneratorKind};
use crate::error::GeneratorError;

/// Yields its configured value exactly once
#[derive(Debug, Clone)]
pub struct ValueGenerator {
    value: String,
    finished: bool,
    configured: bool,
}

impl ValueGenerator {
    pub fn new() -> Self {
        Self {
            value: String::new(),
            // Nothing to hand out until configured
            finished: true,
            configured: false,
        }
    }
}

impl Default for ValueGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for ValueGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Value
    }

    fn configure(&mut self, options: &Value) -> Result<(), GeneratorError> {
        let value = options.as_str().ok_or(GeneratorError::WrongType {
            generator: "Value",
            field: "config",
        })?;
        self.value = value.to_string();
        self.finished = false;
        self.configured = true;
        Ok(())
    }

    fn next_value(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }
        self.finished = true;
        Some(self.value.clone())
    }

    fn reset(&mut self) {
        self.finished = !self.configured;
    }

    fn sequence_len(&self) -> usize {
        usize::from(self.configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzer::generators::drain;
    use serde_json::json;

    #[test]
    fn test_configure() {
        let mut generator = ValueGenerator::new();
        assert!(generator.configure(&json!(1)).is_err());
        assert!(generator.configure(&json!({"value": "x"})).is_err());
        assert!(generator.configure(&json!("valid")).is_ok());
    }

    #[test]
    fn test_single_value_then_exhausted() {
        let mut generator = ValueGenerator::new();
        generator.configure(&json!("x")).unwrap();

        assert_eq!(generator.next_value(), Some("x".to_string()));
        assert_eq!(generator.next_value(), None);
        assert_eq!(generator.next_value(), None);
    }

    #[test]
    fn test_reset() {
        let mut generator = ValueGenerator::new();
        generator.configure(&json!("valid")).unwrap();
        assert_eq!(drain(&mut generator), vec!["valid"]);

        generator.reset();
        assert_eq!(drain(&mut generator), vec!["valid"]);
    }

    #[test]
    fn test_empty_string_is_a_value() {
        let mut generator = ValueGenerator::new();
        generator.configure(&json!("")).unwrap();
        assert_eq!(generator.next_value(), Some(String::new()));
    }

    #[test]
    fn test_unconfigured_is_empty() {
        let mut generator = ValueGenerator::default();
        assert_eq!(generator.sequence_len(), 0);
        assert_eq!(generator.next_value(), None);

        generator.reset();
        assert_eq!(generator.next_value(), None);

        generator.configure(&json!("x")).unwrap();
        assert_eq!(generator.sequence_len(), 1);
    }
}
