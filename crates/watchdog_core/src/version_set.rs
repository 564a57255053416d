use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A set of version names that remembers insertion order.
///
/// Comparisons are by membership only. Iteration yields names in the order
/// they were first inserted, which is the order written to a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct VersionSet {
    names: Vec<String>,
}

impl VersionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name` unless already present. Returns whether it was added.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|existing| existing == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Names in `self` that are not in `other`, sorted.
    pub fn difference(&self, other: &VersionSet) -> VersionSet {
        let known: HashSet<&str> = other.iter().collect();
        let mut fresh: Vec<&str> = self.iter().filter(|name| !known.contains(name)).collect();
        fresh.sort_unstable();
        fresh.into_iter().collect()
    }

    /// Names sorted lexicographically, for display.
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.iter().collect();
        names.sort_unstable();
        names
    }

    /// Lexicographically greatest name.
    pub fn latest(&self) -> Option<&str> {
        self.iter().max()
    }
}

impl PartialEq for VersionSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|name| other.contains(name))
    }
}

impl Eq for VersionSet {}

impl From<Vec<String>> for VersionSet {
    fn from(names: Vec<String>) -> Self {
        names.into_iter().collect()
    }
}

impl From<VersionSet> for Vec<String> {
    fn from(set: VersionSet) -> Self {
        set.names
    }
}

impl<S: Into<String>> FromIterator<S> for VersionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = VersionSet::new();
        let mut seen = HashSet::new();
        for name in iter {
            let name = name.into();
            if seen.insert(name.clone()) {
                set.names.push(name);
            }
        }
        set
    }
}

impl<'a> IntoIterator for &'a VersionSet {
    type Item = &'a str;
    type IntoIter = std::iter::Map<std::slice::Iter<'a, String>, fn(&'a String) -> &'a str>;

    fn into_iter(self) -> Self::IntoIter {
        self.names
            .iter()
            .map(String::as_str as fn(&'a String) -> &'a str)
    }
}
