//! Insertion-ordered id set shared by the draft and the decision form.

use serde::{Serialize, Serializer};

/// A list of unique ids. Inserting an id that is already present is a no-op,
/// so merging the same evidence twice never duplicates it. Iteration follows
/// first-insertion order, which keeps rendered lists stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdSet(Vec<String>);

impl IdSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns `true` if the id was not already present.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.0.push(id);
        true
    }

    /// Set union. Returns how many ids were new.
    pub fn union<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = 0;
        for id in ids {
            if self.insert(id) {
                added += 1;
            }
        }
        added
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != id);
        self.0.len() != before
    }

    /// Add the id if absent, remove it if present. Returns whether it is now a member.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.remove(id) {
            false
        } else {
            self.0.push(id.to_string());
            true
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|existing| existing == id)
    }

    /// Membership equality, ignoring order.
    pub fn same_members(&self, other: &IdSet) -> bool {
        self.len() == other.len() && self.iter().all(|id| other.contains(id))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

impl<S: Into<String>> FromIterator<S> for IdSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = IdSet::new();
        set.union(iter);
        set
    }
}

impl Serialize for IdSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_insert_is_ignored() {
        let mut ids = IdSet::new();
        assert!(ids.insert("c1"));
        assert!(!ids.insert("c1"));
        assert_eq!(ids.as_slice(), ["c1"]);
    }

    #[test]
    fn union_keeps_first_insertion_order() {
        let mut ids: IdSet = ["s2", "s1"].into_iter().collect();
        let added = ids.union(["s1", "s3", "s3"]);
        assert_eq!(added, 1);
        assert_eq!(ids.as_slice(), ["s2", "s1", "s3"]);
    }

    #[test]
    fn toggle_flips_membership() {
        let mut ids = IdSet::new();
        assert!(ids.toggle("s1"));
        assert!(!ids.toggle("s1"));
        assert!(ids.is_empty());
    }

    #[test]
    fn same_members_ignores_order() {
        let a: IdSet = ["a", "b"].into_iter().collect();
        let b: IdSet = ["b", "a"].into_iter().collect();
        assert!(a.same_members(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn serializes_as_plain_list() {
        let ids: IdSet = ["c1", "c2"].into_iter().collect();
        assert_eq!(serde_json::to_string(&ids).unwrap(), r#"["c1","c2"]"#);
    }
}
