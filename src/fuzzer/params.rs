//! Current value of every fuzzed parameter

use std::collections::BTreeMap;

use super::ParamCategory;

/// Current value for each distinct `(category, name)` parameter.
///
/// One instance is owned and mutated by the enumerator; request descriptors
/// are built from snapshots of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    path: BTreeMap<String, String>,
    url: BTreeMap<String, String>,
    header: BTreeMap<String, String>,
    cookie: BTreeMap<String, String>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn category(&self, category: ParamCategory) -> &BTreeMap<String, String> {
        match category {
            ParamCategory::Path => &self.path,
            ParamCategory::Url => &self.url,
            ParamCategory::Header => &self.header,
            ParamCategory::Cookie => &self.cookie,
        }
    }

    fn category_mut(&mut self, category: ParamCategory) -> &mut BTreeMap<String, String> {
        match category {
            ParamCategory::Path => &mut self.path,
            ParamCategory::Url => &mut self.url,
            ParamCategory::Header => &mut self.header,
            ParamCategory::Cookie => &mut self.cookie,
        }
    }

    /// Set (or overwrite) a parameter's value
    pub fn set(&mut self, category: ParamCategory, name: &str, value: String) {
        self.category_mut(category).insert(name.to_string(), value);
    }

    pub fn get(&self, category: ParamCategory, name: &str) -> Option<&str> {
        self.category(category).get(name).map(String::as_str)
    }

    /// Parameters of one category, ordered by name
    pub fn iter(&self, category: ParamCategory) -> impl Iterator<Item = (&str, &str)> {
        self.category(category)
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of distinct parameters across all categories
    pub fn len(&self) -> usize {
        ParamCategory::all()
            .iter()
            .map(|c| self.category(*c).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
