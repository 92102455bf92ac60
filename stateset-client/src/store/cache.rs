use std::collections::{BTreeMap, HashMap};

use crate::query::{Filter, QueryKind, QueryRequest, QueryResponse};

/// Identifies one cached response within a query kind.
///
/// Both maps are ordered, so two requests with the same params and filter share an entry no matter
/// in which order the filter was assembled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey {
    pub params: BTreeMap<String, String>,
    pub filter: Filter,
}

impl RequestKey {
    pub fn new(request: &QueryRequest, filter: &Filter) -> Self {
        Self {
            params: request.params(),
            filter: filter.clone(),
        }
    }
}

/// Storage for query responses, keyed by query kind and request.
pub trait CacheStore: Send + Sync {
    fn insert(&mut self, kind: QueryKind, key: RequestKey, value: QueryResponse);
    fn get(&self, kind: QueryKind, key: &RequestKey) -> Option<&QueryResponse>;
    fn clear(&mut self);
}

#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: HashMap<QueryKind, HashMap<RequestKey, QueryResponse>>,
}

impl InMemoryCache {
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(HashMap::is_empty)
    }
}

impl CacheStore for InMemoryCache {
    fn insert(&mut self, kind: QueryKind, key: RequestKey, value: QueryResponse) {
        self.entries.entry(kind).or_default().insert(key, value);
    }

    fn get(&self, kind: QueryKind, key: &RequestKey) -> Option<&QueryResponse> {
        self.entries.get(&kind)?.get(key)
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}
