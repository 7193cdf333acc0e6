/*!
 * Context Sets
 * Multi-valued key/value bags scoping grants and queries
 */

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

type Backing = BTreeMap<String, BTreeSet<String>>;

/// Trim and lowercase; blank input yields None
fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

fn satisfied(required: &Backing, actual: &Backing) -> bool {
    required.iter().all(|(key, values)| match actual.get(key) {
        Some(present) => values.is_subset(present),
        None => false,
    })
}

/// Builder used while assembling a query or a new grant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutableContextSet {
    map: Backing,
}

impl MutableContextSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key/value pair. Blank keys or values are ignored
    pub fn add(&mut self, key: &str, value: &str) -> &mut Self {
        if let (Some(key), Some(value)) = (normalize(key), normalize(value)) {
            self.map.entry(key).or_default().insert(value);
        }
        self
    }

    /// Builder-style add
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.add(key, value);
        self
    }

    pub fn add_all(&mut self, other: &ImmutableContextSet) -> &mut Self {
        for (key, values) in other.map.iter() {
            self.map
                .entry(key.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
        self
    }

    pub fn remove(&mut self, key: &str, value: &str) -> bool {
        let (Some(key), Some(value)) = (normalize(key), normalize(value)) else {
            return false;
        };
        let Some(values) = self.map.get_mut(&key) else {
            return false;
        };
        let removed = values.remove(&value);
        if values.is_empty() {
            self.map.remove(&key);
        }
        removed
    }

    pub fn remove_all(&mut self, key: &str) -> bool {
        normalize(key)
            .map(|key| self.map.remove(&key).is_some())
            .unwrap_or(false)
    }

    pub fn contains(&self, key: &str, value: &str) -> bool {
        match (normalize(key), normalize(value)) {
            (Some(key), Some(value)) => self
                .map
                .get(&key)
                .map(|values| values.contains(&value))
                .unwrap_or(false),
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Number of key/value pairs
    pub fn len(&self) -> usize {
        self.map.values().map(BTreeSet::len).sum()
    }

    /// Freeze into a value usable as a memoization key
    pub fn make_immutable(&self) -> ImmutableContextSet {
        ImmutableContextSet {
            map: Arc::new(self.map.clone()),
        }
    }

    /// Freeze without copying
    pub fn into_immutable(self) -> ImmutableContextSet {
        ImmutableContextSet {
            map: Arc::new(self.map),
        }
    }
}

/// Frozen context set
///
/// Equality and hashing are structural, so two sets built in any insertion
/// order compare equal. Clones share the backing map.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Backing", into = "Backing")]
pub struct ImmutableContextSet {
    map: Arc<Backing>,
}

impl ImmutableContextSet {
    /// The global context: no constraints
    pub fn empty() -> Self {
        Self {
            map: Arc::new(Backing::new()),
        }
    }

    /// Single-pair convenience constructor
    pub fn singleton(key: &str, value: &str) -> Self {
        MutableContextSet::new().with(key, value).into_immutable()
    }

    /// Build from pairs
    pub fn of<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut set = MutableContextSet::new();
        for (key, value) in pairs {
            set.add(key, value);
        }
        set.into_immutable()
    }

    /// True iff every pair in `self` is present in `query`
    ///
    /// `self` is the grant's constraint, `query` is the situation being
    /// checked. The empty set is satisfied by every query.
    pub fn is_satisfied_by(&self, query: &ImmutableContextSet) -> bool {
        Arc::ptr_eq(&self.map, &query.map) || satisfied(&self.map, &query.map)
    }

    pub fn contains(&self, key: &str, value: &str) -> bool {
        match (normalize(key), normalize(value)) {
            (Some(key), Some(value)) => self
                .map
                .get(&key)
                .map(|values| values.contains(&value))
                .unwrap_or(false),
            _ => false,
        }
    }

    pub fn values(&self, key: &str) -> Vec<&str> {
        normalize(key)
            .and_then(|key| self.map.get(&key))
            .map(|values| values.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Sorted key/value pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().flat_map(|(key, values)| {
            values
                .iter()
                .map(move |value| (key.as_str(), value.as_str()))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.values().map(BTreeSet::len).sum()
    }

    /// Copy into a builder
    pub fn mutable_copy(&self) -> MutableContextSet {
        MutableContextSet {
            map: (*self.map).clone(),
        }
    }
}

impl Default for ImmutableContextSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Backing> for ImmutableContextSet {
    fn from(raw: Backing) -> Self {
        let mut set = MutableContextSet::new();
        for (key, values) in raw.iter() {
            for value in values {
                set.add(key, value);
            }
        }
        set.into_immutable()
    }
}

impl From<ImmutableContextSet> for Backing {
    fn from(set: ImmutableContextSet) -> Self {
        Arc::try_unwrap(set.map).unwrap_or_else(|shared| (*shared).clone())
    }
}

impl From<MutableContextSet> for ImmutableContextSet {
    fn from(set: MutableContextSet) -> Self {
        set.into_immutable()
    }
}

impl fmt::Display for ImmutableContextSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(global)");
        }
        let mut first = true;
        for (key, value) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", key, value)?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for ImmutableContextSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImmutableContextSet({})", self)
    }
}
