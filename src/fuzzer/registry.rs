//! Parameter binding registry
//!
//! Associates each configured generator with the request parameter it drives.
//! Bindings are kept in one ordered list: category (path, url, header,
//! cookie), then parameter name, then the order the generator slots were
//! listed for that name. Bindings for the same parameter are therefore always
//! adjacent, which the enumerator relies on when it picks baseline values.

use serde::{Deserialize, Serialize};

use super::generators::{Generator, GeneratorKind};
use crate::app::Config;
use crate::error::FuzzError;

/// Where a parameter lives in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamCategory {
    Path,
    Url,
    Header,
    Cookie,
}

impl ParamCategory {
    pub fn all() -> &'static [ParamCategory] {
        &[
            ParamCategory::Path,
            ParamCategory::Url,
            ParamCategory::Header,
            ParamCategory::Cookie,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ParamCategory::Path => "path",
            ParamCategory::Url => "url",
            ParamCategory::Header => "header",
            ParamCategory::Cookie => "cookie",
        }
    }
}

impl std::fmt::Display for ParamCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One generator bound to one request parameter
#[derive(Debug)]
pub struct Binding {
    pub category: ParamCategory,
    pub name: String,
    pub generator: Box<dyn Generator>,
}

impl Binding {
    /// Whether both bindings drive the same request parameter
    pub fn same_parameter(&self, other: &Binding) -> bool {
        self.category == other.category && self.name == other.name
    }
}

/// Ordered list of parameter bindings
#[derive(Debug, Default)]
pub struct Registry {
    bindings: Vec<Binding>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from validated configuration.
    ///
    /// Any failure aborts the whole run before a request is sent.
    pub fn from_config(config: &Config) -> Result<Self, FuzzError> {
        let mut registry = Self::new();

        for (category, params) in config.parameter_lists() {
            for (name, slots) in params {
                for (slot, entry) in slots.iter().enumerate() {
                    if entry.is_empty() {
                        tracing::warn!(%category, %name, slot, "Skipping empty generator slot");
                        continue;
                    }
                    if entry.len() != 1 {
                        return Err(FuzzError::InvalidGeneratorArity {
                            category,
                            name: name.clone(),
                            slot,
                            count: entry.len(),
                        });
                    }

                    for (kind_name, options) in entry {
                        let kind = GeneratorKind::from_name(kind_name).ok_or_else(|| {
                            FuzzError::UnknownGeneratorType {
                                category,
                                name: name.clone(),
                                kind: kind_name.clone(),
                            }
                        })?;

                        let mut generator = kind.create();
                        generator
                            .configure(options)
                            .map_err(|source| FuzzError::InvalidConfiguration {
                                category,
                                name: name.clone(),
                                source,
                            })?;

                        registry.bind(category, name, generator);
                    }
                }
            }
        }

        if registry.is_empty() {
            return Err(FuzzError::NoGeneratorsConfigured);
        }

        tracing::debug!(bindings = registry.len(), "Parameter bindings registered");
        Ok(registry)
    }

    /// Append a binding.
    ///
    /// Callers adding bindings by hand must keep bindings for the same
    /// parameter adjacent.
    pub fn bind(&mut self, category: ParamCategory, name: &str, generator: Box<dyn Generator>) {
        debug_assert!(
            self.bindings
                .iter()
                .rposition(|b| b.category == category && b.name == name)
                .map_or(true, |pos| pos + 1 == self.bindings.len()),
            "bindings for {} parameter '{}' must be adjacent",
            category,
            name
        );

        self.bindings.push(Binding {
            category,
            name: name.to_string(),
            generator,
        });
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub(crate) fn bindings_mut(&mut self) -> &mut [Binding] {
        &mut self.bindings
    }

    /// Total requests a full run emits: the baseline, then every value each
    /// binding has left after contributing to it.
    pub fn planned_requests(&self) -> usize {
        let mut total = 1usize;
        let mut previous: Option<&Binding> = None;
        for binding in &self.bindings {
            let len = binding.generator.sequence_len();
            let first_for_parameter = previous.map_or(true, |p| !p.same_parameter(binding));
            total = total.saturating_add(if first_for_parameter {
                len.saturating_sub(1)
            } else {
                len
            });
            previous = Some(binding);
        }
        total
    }
}
