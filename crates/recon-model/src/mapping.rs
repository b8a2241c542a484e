#![deny(unsafe_code)]

use std::collections::BTreeMap;

use crate::options::DuplicatePolicy;

pub const DEFAULT_VALUE_SEPARATOR: &str = ",";

/// Auxiliary mapping from an identifier to one or more associated values.
///
/// Single-valued entries (a disease label) are lists of length one; one-to-many
/// entries (several sequencing runs for one sample) keep every value and are
/// joined with the separator when rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    name: String,
    separator: String,
    entries: BTreeMap<String, Vec<String>>,
}

impl Mapping {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            separator: DEFAULT_VALUE_SEPARATOR.to_string(),
            entries: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Inserts `values` under `key`, resolving a repeated key with `policy`.
    ///
    /// Returns `true` when the stored entry changed.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        values: Vec<String>,
        policy: DuplicatePolicy,
    ) -> bool {
        let key = key.into();
        let Some(existing) = self.entries.get_mut(&key) else {
            self.entries.insert(key, values);
            return true;
        };
        match policy {
            DuplicatePolicy::LastWins => {
                *existing = values;
                true
            }
            DuplicatePolicy::FirstWins => false,
            DuplicatePolicy::LongestWins => {
                if values.len() > existing.len() {
                    *existing = values;
                    true
                } else {
                    false
                }
            }
            DuplicatePolicy::Append => {
                let changed = !values.is_empty();
                existing.extend(values);
                changed
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// The mapped value for `key`, list values joined by the separator.
    pub fn render(&self, key: &str) -> Option<String> {
        self.get(key).map(|values| values.join(&self.separator))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Mapping
where
    K: Into<String>,
    V: Into<String>,
{
    /// Collects single-valued entries into an unnamed mapping; later keys win.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Mapping::new("inline");
        for (key, value) in iter {
            mapping.insert(key, vec![value.into()], DuplicatePolicy::LastWins);
        }
        mapping
    }
}
