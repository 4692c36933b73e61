//! Arithmetic sequence generator

use serde_json::{Map, Value};

use super::{Generator, GeneratorKind};
use crate::error::GeneratorError;

const NAME: &str = "Increment";

/// Integers from `start` to `stop` (inclusive when reachable) by `step`
#[derive(Debug, Clone, Default)]
pub struct IncrementGenerator {
    start: i64,
    stop: i64,
    step: i64,
    /// Next value to hand out, `None` once exhausted
    cursor: Option<i64>,
    configured: bool,
}

impl IncrementGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn past_stop(&self, n: i64) -> bool {
        if self.step > 0 {
            n > self.stop
        } else {
            n < self.stop
        }
    }
}

fn integer(options: &Map<String, Value>, field: &'static str) -> Result<i64, GeneratorError> {
    let wrong_type = GeneratorError::WrongType {
        generator: NAME,
        field,
    };
    match options.get(field) {
        // Fractional numbers are truncated toward zero
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or(wrong_type),
        _ => Err(wrong_type),
    }
}

impl Generator for IncrementGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Increment
    }

    fn configure(&mut self, options: &Value) -> Result<(), GeneratorError> {
        let options = options.as_object().ok_or(GeneratorError::WrongType {
            generator: NAME,
            field: "config",
        })?;

        let start = integer(options, "start")?;
        let stop = integer(options, "stop")?;
        if start == stop {
            return Err(GeneratorError::StartEqualsStop { generator: NAME });
        }

        let step = integer(options, "step")?;
        if step == 0 {
            return Err(GeneratorError::ZeroStep { generator: NAME });
        }
        if (stop > start) != (step > 0) {
            return Err(GeneratorError::StepAwayFromStop {
                generator: NAME,
                start,
                stop,
                step,
            });
        }

        self.start = start;
        self.stop = stop;
        self.step = step;
        self.configured = true;
        self.reset();

        Ok(())
    }

    fn next_value(&mut self) -> Option<String> {
        let current = self.cursor?;
        self.cursor = current
            .checked_add(self.step)
            .filter(|n| !self.past_stop(*n));
        Some(current.to_string())
    }

    fn reset(&mut self) {
        self.cursor = self.configured.then_some(self.start);
    }

    fn sequence_len(&self) -> usize {
        if !self.configured {
            return 0;
        }
        let span = (self.stop as i128 - self.start as i128) / self.step as i128;
        usize::try_from(span + 1).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzer::generators::drain;
    use serde_json::json;

    fn configured(options: Value) -> IncrementGenerator {
        let mut generator = IncrementGenerator::new();
        generator.configure(&options).unwrap();
        generator
    }

    #[test]
    fn test_configure_valid() {
        let mut generator = IncrementGenerator::new();
        assert!(generator
            .configure(&json!({"start": 0, "stop": 10, "step": 1}))
            .is_ok());
    }

    #[test]
    fn test_configure_rejects_wrong_types() {
        let mut generator = IncrementGenerator::new();
        for options in [
            json!({"start": "0", "stop": 10, "step": 1}),
            json!({"start": 0, "stop": "10", "step": 1}),
            json!({"start": 0, "stop": 10, "step": "1"}),
            json!({"start": 0, "stop": 10}),
            json!("0..10"),
        ] {
            assert!(
                matches!(generator.configure(&options), Err(GeneratorError::WrongType { .. })),
                "expected type error for {}",
                options
            );
        }
    }

    #[test]
    fn test_configure_rejects_same_start_and_stop() {
        let mut generator = IncrementGenerator::new();
        assert_eq!(
            generator.configure(&json!({"start": 0, "stop": 0, "step": 1})),
            Err(GeneratorError::StartEqualsStop { generator: NAME })
        );
    }

    #[test]
    fn test_configure_rejects_zero_step() {
        let mut generator = IncrementGenerator::new();
        assert_eq!(
            generator.configure(&json!({"start": 0, "stop": 10, "step": 0})),
            Err(GeneratorError::ZeroStep { generator: NAME })
        );
    }

    #[test]
    fn test_configure_rejects_step_away_from_stop() {
        let mut generator = IncrementGenerator::new();
        assert!(matches!(
            generator.configure(&json!({"start": 0, "stop": 10, "step": -1})),
            Err(GeneratorError::StepAwayFromStop { .. })
        ));
    }

    #[test]
    fn test_next_includes_stop() {
        let mut generator = configured(json!({"start": 0, "stop": 10, "step": 1}));
        let expected: Vec<String> = (0..=10).map(|n| n.to_string()).collect();
        assert_eq!(drain(&mut generator), expected);
    }

    #[test]
    fn test_reset_replays_sequence() {
        let mut generator = configured(json!({"start": 0, "stop": 10, "step": 2}));
        let expected = vec!["0", "2", "4", "6", "8", "10"];

        assert_eq!(drain(&mut generator), expected);
        generator.reset();
        assert_eq!(drain(&mut generator), expected);
    }

    #[test]
    fn test_exhaustion_is_idempotent() {
        let mut generator = configured(json!({"start": 1, "stop": 2, "step": 1}));
        assert_eq!(drain(&mut generator), vec!["1", "2"]);
        for _ in 0..5 {
            assert_eq!(generator.next_value(), None);
        }
    }

    #[test]
    fn test_uneven_step_stops_before_passing_stop() {
        let mut generator = configured(json!({"start": 0, "stop": 10, "step": 3}));
        assert_eq!(drain(&mut generator), vec!["0", "3", "6", "9"]);
        assert_eq!(generator.sequence_len(), 4);
    }

    #[test]
    fn test_descending_sequence() {
        let mut generator = configured(json!({"start": 10, "stop": 0, "step": -5}));
        assert_eq!(drain(&mut generator), vec!["10", "5", "0"]);
    }

    #[test]
    fn test_fractional_options_are_truncated() {
        let mut generator = configured(json!({"start": 1.9, "stop": 3.2, "step": 1.0}));
        assert_eq!(drain(&mut generator), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_overflow_ends_sequence() {
        let mut generator = configured(json!({"start": i64::MAX - 1, "stop": i64::MAX, "step": 2}));
        assert_eq!(drain(&mut generator), vec![(i64::MAX - 1).to_string()]);
    }

    #[test]
    fn test_sequence_len_matches_output() {
        let mut generator = configured(json!({"start": -4, "stop": 17, "step": 4}));
        let len = generator.sequence_len();
        assert_eq!(drain(&mut generator).len(), len);
    }

    #[test]
    fn test_unconfigured_is_exhausted() {
        let mut generator = IncrementGenerator::new();
        assert_eq!(generator.next_value(), None);
        assert_eq!(generator.sequence_len(), 0);
    }
}
