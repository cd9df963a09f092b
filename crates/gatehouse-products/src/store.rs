//! Key-value storage.
//!
//! Items are JSON objects addressed by a composite [`Key`]: a partition key
//! `pk` and a sort key `sk`, both stored as string attributes on the item.
//! A secondary index swaps the two so every item of one type can be listed
//! by querying on `sk`.

use std::sync::Arc;

use dashmap::DashMap;
use gatehouse_middleware::BoxFuture;
use serde_json::{Map, Value};
use thiserror::Error;

/// Partition key attribute.
pub const PARTITION_KEY: &str = "pk";

/// Sort key attribute.
pub const SORT_KEY: &str = "sk";

/// Name of the inverted secondary index.
pub const GSI1: &str = "GSI1";

/// A stored item.
pub type Item = Map<String, Value>;

/// A shared store handle.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Storage failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The item lacks a key attribute, or it is not a string.
    #[error("item is missing string attribute '{0}'")]
    MissingKey(&'static str),

    /// No index with this name.
    #[error("unknown index '{0}'")]
    UnknownIndex(String),

    /// The condition does not name the index's partition attribute.
    #[error("index '{index}' is keyed on '{expected}', not '{got}'")]
    InvalidCondition {
        /// Index queried.
        index: String,
        /// Partition attribute of the index.
        expected: &'static str,
        /// Attribute named in the query.
        got: String,
    },
}

/// Composite primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    /// Partition key.
    pub pk: String,
    /// Sort key.
    pub sk: String,
}

impl Key {
    /// Creates a key.
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }

    /// Reads the key attributes of `item`.
    pub fn of(item: &Item) -> StoreResult<Self> {
        Ok(Self::new(
            string_attr(item, PARTITION_KEY)?,
            string_attr(item, SORT_KEY)?,
        ))
    }
}

fn string_attr<'a>(item: &'a Item, name: &'static str) -> StoreResult<&'a str> {
    item.get(name)
        .and_then(Value::as_str)
        .ok_or(StoreError::MissingKey(name))
}

/// Asynchronous key-value storage.
///
/// Implementations own retry policy; callers never retry.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Inserts or replaces the item under its key.
    fn put(&self, item: Item) -> BoxFuture<'_, StoreResult<()>>;

    /// Replaces the item under its key only if one is already stored.
    ///
    /// Returns `false`, storing nothing, when the key is absent. The check
    /// and the write are one atomic step, so a concurrent delete is never
    /// undone.
    fn replace(&self, item: Item) -> BoxFuture<'_, StoreResult<bool>>;

    /// Fetches the item stored under `key`.
    fn get<'a>(&'a self, key: &'a Key) -> BoxFuture<'a, StoreResult<Option<Item>>>;

    /// Returns every item whose `condition_key` attribute equals
    /// `condition_value` in the named index, ordered by the index sort key.
    fn query_by_index<'a>(
        &'a self,
        index: &'a str,
        condition_key: &'a str,
        condition_value: &'a str,
    ) -> BoxFuture<'a, StoreResult<Vec<Item>>>;

    /// Removes the item under `key`, returning it if it existed.
    fn delete<'a>(&'a self, key: &'a Key) -> BoxFuture<'a, StoreResult<Option<Item>>>;
}

/// An in-process store backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: DashMap<Key, Item>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store behind a shared handle.
    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn put(&self, item: Item) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let key = Key::of(&item)?;
            self.items.insert(key, item);
            Ok(())
        })
    }

    fn replace(&self, item: Item) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let key = Key::of(&item)?;
            match self.items.get_mut(&key) {
                Some(mut existing) => {
                    *existing = item;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn get<'a>(&'a self, key: &'a Key) -> BoxFuture<'a, StoreResult<Option<Item>>> {
        Box::pin(async move { Ok(self.items.get(key).map(|entry| entry.value().clone())) })
    }

    fn query_by_index<'a>(
        &'a self,
        index: &'a str,
        condition_key: &'a str,
        condition_value: &'a str,
    ) -> BoxFuture<'a, StoreResult<Vec<Item>>> {
        Box::pin(async move {
            if index != GSI1 {
                return Err(StoreError::UnknownIndex(index.to_string()));
            }
            if condition_key != SORT_KEY {
                return Err(StoreError::InvalidCondition {
                    index: index.to_string(),
                    expected: SORT_KEY,
                    got: condition_key.to_string(),
                });
            }

            let mut matches: Vec<(Key, Item)> = self
                .items
                .iter()
                .filter(|entry| entry.key().sk == condition_value)
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect();
            matches.sort_by(|(a, _), (b, _)| a.pk.cmp(&b.pk));

            Ok(matches.into_iter().map(|(_, item)| item).collect())
        })
    }

    fn delete<'a>(&'a self, key: &'a Key) -> BoxFuture<'a, StoreResult<Option<Item>>> {
        Box::pin(async move { Ok(self.items.remove(key).map(|(_, item)| item)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(pk: &str, sk: &str, name: &str) -> Item {
        match json!({ "pk": pk, "sk": sk, "name": name }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();
        store.put(item("PRODUCT#1", "PRODUCT", "Desk")).await.unwrap();

        let key = Key::new("PRODUCT#1", "PRODUCT");
        let fetched = store.get(&key).await.unwrap().unwrap();
        assert_eq!(fetched["name"], "Desk");

        let removed = store.delete(&key).await.unwrap();
        assert!(removed.is_some());
        assert!(store.get(&key).await.unwrap().is_none());
        assert!(store.delete(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces() {
        let store = MemoryStore::new();
        store.put(item("PRODUCT#1", "PRODUCT", "Desk")).await.unwrap();
        store.put(item("PRODUCT#1", "PRODUCT", "Chair")).await.unwrap();

        assert_eq!(store.len(), 1);
        let fetched = store.get(&Key::new("PRODUCT#1", "PRODUCT")).await.unwrap();
        assert_eq!(fetched.unwrap()["name"], "Chair");
    }

    #[tokio::test]
    async fn test_replace_only_existing() {
        let store = MemoryStore::new();
        let key = Key::new("PRODUCT#1", "PRODUCT");

        assert!(!store.replace(item("PRODUCT#1", "PRODUCT", "Desk")).await.unwrap());
        assert!(store.get(&key).await.unwrap().is_none());

        store.put(item("PRODUCT#1", "PRODUCT", "Desk")).await.unwrap();
        assert!(store.replace(item("PRODUCT#1", "PRODUCT", "Chair")).await.unwrap());
        assert_eq!(store.get(&key).await.unwrap().unwrap()["name"], "Chair");

        store.delete(&key).await.unwrap();
        assert!(!store.replace(item("PRODUCT#1", "PRODUCT", "Lamp")).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_put_requires_keys() {
        let store = MemoryStore::new();
        let mut missing = item("PRODUCT#1", "PRODUCT", "Desk");
        missing.remove("sk");

        let err = store.put(missing).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingKey("sk")));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_query_by_index_orders_by_partition() {
        let store = MemoryStore::new();
        store.put(item("PRODUCT#b", "PRODUCT", "B")).await.unwrap();
        store.put(item("PRODUCT#a", "PRODUCT", "A")).await.unwrap();
        store.put(item("ORDER#1", "ORDER", "O")).await.unwrap();

        let products = store.query_by_index(GSI1, "sk", "PRODUCT").await.unwrap();
        let names: Vec<&str> = products.iter().filter_map(|i| i["name"].as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_query_rejects_bad_index_or_condition() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.query_by_index("GSI9", "sk", "PRODUCT").await,
            Err(StoreError::UnknownIndex(_))
        ));
        assert!(matches!(
            store.query_by_index(GSI1, "pk", "PRODUCT").await,
            Err(StoreError::InvalidCondition { .. })
        ));
    }
}
