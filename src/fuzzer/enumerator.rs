//! Parameter enumeration
//!
//! Turns the registry's generators into the ordered stream of requests for
//! one run. The first request is the baseline: every parameter at the first
//! value of its first generator. After that each binding, in registration
//! order, gets a sweep turn: its parameter walks through the rest of the
//! generator's values, one request per value, while every other parameter
//! keeps its current value. When the generator runs dry it is reset, the
//! parameter goes back to that generator's first value, and the next binding
//! takes over.
//!
//! Request volume is linear in the total number of generated values; the
//! cross product of parameter values is never enumerated.

use super::{ParameterSet, Registry};
use crate::error::FuzzError;
use crate::http::{FuzzRequest, RequestTemplate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Baseline,
    /// Sweeping the binding at this position
    Sweep(usize),
    Done,
}

/// Iterator over the requests of one fuzzing run
#[derive(Debug)]
pub struct Enumerator {
    registry: Registry,
    template: RequestTemplate,
    params: ParameterSet,
    phase: Phase,
    next_seq: u64,
}

impl Enumerator {
    pub fn new(registry: Registry, template: RequestTemplate) -> Self {
        Self {
            registry,
            template,
            params: ParameterSet::new(),
            phase: Phase::Baseline,
            next_seq: 0,
        }
    }

    /// Total requests a full run emits
    pub fn planned_requests(&self) -> usize {
        self.registry.planned_requests()
    }

    /// Current parameter values
    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Take each parameter's first value. Only the first of several adjacent
    /// bindings for one parameter contributes; the others wait for their sweep.
    fn seed_baseline(&mut self) {
        let bindings = self.registry.bindings_mut();
        for pos in 0..bindings.len() {
            if pos > 0 && bindings[pos].same_parameter(&bindings[pos - 1]) {
                continue;
            }
            let binding = &mut bindings[pos];
            let value = binding.generator.next_value().unwrap_or_default();
            self.params.set(binding.category, &binding.name, value);
        }
    }

    fn emit(&mut self) -> Result<FuzzRequest, FuzzError> {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.template.build(&self.params, seq).map_err(|e| {
            self.phase = Phase::Done;
            e
        })
    }
}

impl Iterator for Enumerator {
    type Item = Result<FuzzRequest, FuzzError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.phase {
                Phase::Done => return None,
                Phase::Baseline => {
                    self.seed_baseline();
                    self.phase = Phase::Sweep(0);
                    return Some(self.emit());
                }
                Phase::Sweep(pos) => {
                    let Some(binding) = self.registry.bindings_mut().get_mut(pos) else {
                        self.phase = Phase::Done;
                        return None;
                    };

                    match binding.generator.next_value() {
                        Some(value) => {
                            self.params.set(binding.category, &binding.name, value);
                            return Some(self.emit());
                        }
                        None => {
                            binding.generator.reset();
                            let value = binding.generator.next_value().unwrap_or_default();
                            self.params.set(binding.category, &binding.name, value);
                            self.phase = Phase::Sweep(pos + 1);
                        }
                    }
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.phase {
            // A build failure can end the run early, so only the upper bound is exact
            Phase::Baseline => (0, Some(self.planned_requests())),
            Phase::Sweep(_) => (0, None),
            Phase::Done => (0, Some(0)),
        }
    }
}
