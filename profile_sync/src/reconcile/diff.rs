//! Diff type and computation.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

/// What needs to change to make the stored relation equal the wanted one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDiff<K: Ord, V> {
    /// Rows that are new or whose non-key columns changed.
    pub upsert: BTreeMap<K, V>,
    /// Keys present in the store but no longer wanted.
    pub delete: BTreeSet<K>,
}

impl<K: Ord, V> Default for RelationDiff<K, V> {
    fn default() -> Self {
        Self {
            upsert: BTreeMap::new(),
            delete: BTreeSet::new(),
        }
    }
}

impl<K: Ord, V> RelationDiff<K, V> {
    /// True if there is nothing to upsert or delete.
    pub fn is_noop(&self) -> bool {
        self.upsert.is_empty() && self.delete.is_empty()
    }

    /// Number of statements the diff will issue.
    pub fn len(&self) -> usize {
        self.upsert.len() + self.delete.len()
    }

    /// Same as [`Self::is_noop`].
    pub fn is_empty(&self) -> bool {
        self.is_noop()
    }
}

impl<K: Ord + fmt::Display, V> fmt::Display for RelationDiff<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // helper: section header with underline
        let mut wrote_any = false;
        let mut section = |title: &str,
                           body: &mut dyn FnMut(&mut fmt::Formatter<'_>) -> fmt::Result|
         -> fmt::Result {
            if wrote_any {
                writeln!(f)?;
            }
            writeln!(f, "{title}")?;
            writeln!(f, "{}", "-".repeat(title.len()))?;
            body(f)?;
            wrote_any = true;
            Ok(())
        };

        if !self.upsert.is_empty() {
            section("Upsert", &mut |f| {
                for key in self.upsert.keys() {
                    writeln!(f, "+ {key}")?;
                }
                Ok(())
            })?;
        }
        if !self.delete.is_empty() {
            section("Delete", &mut |f| {
                for key in &self.delete {
                    writeln!(f, "- {key}")?;
                }
                Ok(())
            })?;
        }

        if !wrote_any {
            write!(f, "No changes")
        } else {
            Ok(())
        }
    }
}

/// Diff `current` against `wanted`.
///
/// Unchanged rows are left out, so applying the diff touches only what moved.
pub fn make_diff<K, V>(current: &BTreeMap<K, V>, wanted: &BTreeMap<K, V>) -> RelationDiff<K, V>
where
    K: Ord + Clone,
    V: PartialEq + Clone,
{
    let upsert = wanted
        .iter()
        .filter(|(k, v)| current.get(*k) != Some(*v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let delete = current
        .keys()
        .filter(|k| !wanted.contains_key(*k))
        .cloned()
        .collect();
    RelationDiff { upsert, delete }
}
