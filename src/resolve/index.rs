//! Precomputed group membership for a section's fields.
//!
//! Group specs are matched against every key once, when the section is
//! loaded. Editor surfaces then look groups up by name instead of
//! re-scanning prefixes on every render.

use rustc_hash::FxHashMap;

use super::FieldGroupSpec;
use crate::content::FieldMap;

#[derive(Debug, Default)]
pub struct FieldIndex {
    /// Field keys in section order.
    keys: Vec<String>,
    /// Group name → positions into `keys`.
    groups: FxHashMap<String, Vec<usize>>,
}

impl FieldIndex {
    pub fn build<'a>(
        fields: &FieldMap,
        specs: impl IntoIterator<Item = (&'a str, &'a FieldGroupSpec)>,
    ) -> Self {
        let keys: Vec<String> = fields.keys().cloned().collect();
        let groups = specs
            .into_iter()
            .map(|(name, spec)| {
                let members = keys
                    .iter()
                    .enumerate()
                    .filter(|(_, key)| spec.matches(key))
                    .map(|(i, _)| i)
                    .collect();
                (name.to_string(), members)
            })
            .collect();
        Self { keys, groups }
    }

    /// Keys of a group, in section order. Empty for unknown groups.
    pub fn group(&self, name: &str) -> impl Iterator<Item = &str> {
        self.groups
            .get(name)
            .into_iter()
            .flatten()
            .map(|&i| self.keys[i].as_str())
    }

    /// Names of groups with at least one member, sorted.
    pub fn group_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self
            .groups
            .iter()
            .filter(|(_, members)| !members.is_empty())
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Keys not claimed by any group.
    pub fn ungrouped(&self) -> impl Iterator<Item = &str> {
        self.keys
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.groups.values().any(|members| members.contains(i)))
            .map(|(_, key)| key.as_str())
    }
}
