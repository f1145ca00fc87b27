//! Keyed cache of collection queries.
//!
//! Reads are keyed by `(collection, scope)`. Mutations invalidate the keys
//! they can affect, and only after the backend confirmed them.

use std::collections::HashMap;

use insightflow_common::{Decision, InsightRun, Project, Source, Task, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Projects,
    Sources,
    InsightRuns,
    /// A single insight run, scoped by run id.
    Run,
    /// Themes of one run, scoped by run id.
    Themes,
    Decisions,
    Tasks,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Projects => "projects",
            Collection::Sources => "sources",
            Collection::InsightRuns => "insight-runs",
            Collection::Run => "runs",
            Collection::Themes => "themes",
            Collection::Decisions => "decisions",
            Collection::Tasks => "tasks",
        }
    }
}

/// Second half of a cache key: everything, or one project/run id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    All,
    Id(String),
}

impl Scope {
    pub fn project(project_id: Option<&str>) -> Self {
        match project_id {
            Some(id) => Scope::Id(id.to_string()),
            None => Scope::All,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Scope::All => None,
            Scope::Id(id) => Some(id),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::All => f.write_str("all"),
            Scope::Id(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub collection: Collection,
    pub scope: Scope,
}

impl QueryKey {
    pub fn new(collection: Collection, scope: Scope) -> Self {
        Self { collection, scope }
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.collection.as_str(), self.scope)
    }
}

#[derive(Debug, Clone)]
pub enum CachedData {
    Projects(Vec<Project>),
    Sources(Vec<Source>),
    InsightRuns(Vec<InsightRun>),
    Run(InsightRun),
    Themes(Vec<Theme>),
    Decisions(Vec<Decision>),
    Tasks(Vec<Task>),
}

/// Maps a cached value type to its collection and enum variant.
pub trait CacheEntry: Sized {
    const COLLECTION: Collection;

    fn wrap(self) -> CachedData;
    fn peek(data: &CachedData) -> Option<&Self>;
}

macro_rules! cache_entry {
    ($ty:ty, $variant:ident) => {
        impl CacheEntry for $ty {
            const COLLECTION: Collection = Collection::$variant;

            fn wrap(self) -> CachedData {
                CachedData::$variant(self)
            }

            fn peek(data: &CachedData) -> Option<&Self> {
                match data {
                    CachedData::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

cache_entry!(Vec<Project>, Projects);
cache_entry!(Vec<Source>, Sources);
cache_entry!(Vec<InsightRun>, InsightRuns);
cache_entry!(InsightRun, Run);
cache_entry!(Vec<Theme>, Themes);
cache_entry!(Vec<Decision>, Decisions);
cache_entry!(Vec<Task>, Tasks);

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CachedData>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: CacheEntry>(&self, scope: &Scope) -> Option<&T> {
        let key = QueryKey::new(T::COLLECTION, scope.clone());
        let hit = self.entries.get(&key).and_then(T::peek);
        tracing::debug!(key = %key, hit = hit.is_some(), "Cache lookup");
        hit
    }

    pub fn put<T: CacheEntry>(&mut self, scope: Scope, value: T) {
        self.entries
            .insert(QueryKey::new(T::COLLECTION, scope), value.wrap());
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop one entry. Returns whether anything was cached under the key.
    pub fn invalidate(&mut self, key: &QueryKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        tracing::debug!(key = %key, removed, "Cache invalidated");
        removed
    }

    /// Invalidate a project-scoped collection: the project's own entry and
    /// the unscoped `all` entry, which also lists that project's rows.
    pub fn invalidate_scoped(&mut self, collection: Collection, scope: &Scope) {
        self.invalidate(&QueryKey::new(collection, scope.clone()));
        if *scope != Scope::All {
            self.invalidate(&QueryKey::new(collection, Scope::All));
        }
    }

    /// Invalidate every scope of a collection.
    pub fn invalidate_collection(&mut self, collection: Collection) {
        self.entries.retain(|key, _| key.collection != collection);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_get_only_matches_its_collection() {
        let mut cache = QueryCache::new();
        cache.put(Scope::All, Vec::<Task>::new());

        assert!(cache.get::<Vec<Task>>(&Scope::All).is_some());
        assert!(cache.get::<Vec<Decision>>(&Scope::All).is_none());
        assert!(cache.get::<Vec<Task>>(&Scope::Id("p1".into())).is_none());
    }

    #[test]
    fn scoped_invalidation_drops_project_and_all_entries() {
        let mut cache = QueryCache::new();
        cache.put(Scope::All, Vec::<Task>::new());
        cache.put(Scope::Id("p1".into()), Vec::<Task>::new());
        cache.put(Scope::Id("p2".into()), Vec::<Task>::new());
        cache.put(Scope::Id("p1".into()), Vec::<Decision>::new());

        cache.invalidate_scoped(Collection::Tasks, &Scope::Id("p1".into()));

        assert!(cache.get::<Vec<Task>>(&Scope::All).is_none());
        assert!(cache.get::<Vec<Task>>(&Scope::Id("p1".into())).is_none());
        assert!(cache.get::<Vec<Task>>(&Scope::Id("p2".into())).is_some());
        assert!(cache.get::<Vec<Decision>>(&Scope::Id("p1".into())).is_some());
    }

    #[test]
    fn invalidate_collection_clears_every_scope() {
        let mut cache = QueryCache::new();
        cache.put(Scope::Id("p1".into()), Vec::<Source>::new());
        cache.put(Scope::Id("p2".into()), Vec::<Source>::new());
        cache.put(Scope::All, Vec::<Project>::new());

        cache.invalidate_collection(Collection::Sources);

        assert_eq!(cache.len(), 1);
        assert!(cache.get::<Vec<Project>>(&Scope::All).is_some());
    }

    #[test]
    fn invalidate_reports_whether_entry_existed() {
        let mut cache = QueryCache::new();
        let key = QueryKey::new(Collection::Projects, Scope::All);
        assert!(!cache.invalidate(&key));
        cache.put(Scope::All, Vec::<Project>::new());
        assert!(cache.contains(&key));
        assert!(cache.invalidate(&key));
    }

    #[test]
    fn keys_render_like_query_tuples() {
        let key = QueryKey::new(Collection::Tasks, Scope::project(None));
        assert_eq!(key.to_string(), "[tasks, all]");
    }
}
