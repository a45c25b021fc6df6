use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::{DocumentStore, Filter, Sort, StoreError, Write, revision_of};

type Collections = HashMap<String, BTreeMap<Uuid, JsonValue>>;

/// In-process store with the same write semantics as the Postgres one.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every later write touching `collection` fails (and aborts its batch).
    pub fn fail_writes_to(&self, collection: &str) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(collection.to_string());
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    fn check_injected<'a>(
        &self,
        collections: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), StoreError> {
        let failing = self.failing.lock().unwrap_or_else(|e| e.into_inner());
        for collection in collections {
            if failing.contains(collection) {
                return Err(StoreError::Aborted(format!("injected failure on {collection}")));
            }
        }
        Ok(())
    }
}

fn apply(data: &mut Collections, write: Write) -> Result<(), StoreError> {
    match write {
        Write::Insert { collection, id, body } => insert_doc(data, collection, id, body),
        Write::Replace {
            collection,
            id,
            body,
            expected_revision,
        } => replace_doc(data, collection, id, body, expected_revision),
        Write::Delete { collection, id } => {
            let removed = data.get_mut(collection).and_then(|d| d.remove(&id));
            match removed {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound {
                    collection: collection.to_string(),
                    id,
                }),
            }
        }
    }
}

fn insert_doc(
    data: &mut Collections,
    collection: &str,
    id: Uuid,
    body: JsonValue,
) -> Result<(), StoreError> {
    let docs = data.entry(collection.to_string()).or_default();
    if docs.contains_key(&id) {
        return Err(StoreError::Duplicate {
            collection: collection.to_string(),
            id,
        });
    }
    docs.insert(id, body);
    Ok(())
}

fn replace_doc(
    data: &mut Collections,
    collection: &str,
    id: Uuid,
    body: JsonValue,
    expected_revision: Option<i64>,
) -> Result<(), StoreError> {
    let Some(current) = data.get_mut(collection).and_then(|d| d.get_mut(&id)) else {
        return Err(StoreError::NotFound {
            collection: collection.to_string(),
            id,
        });
    };
    if let Some(expected) = expected_revision {
        if revision_of(current) != Some(expected) {
            return Err(StoreError::StaleRevision {
                collection: collection.to_string(),
                id,
            });
        }
    }
    *current = body;
    Ok(())
}

fn compare_field(a: &JsonValue, b: &JsonValue, field: &str) -> Ordering {
    match (a.get(field), b.get(field)) {
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<JsonValue>, StoreError> {
        let data = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        Ok(data.get(collection).and_then(|d| d.get(&id)).cloned())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<Sort>,
    ) -> Result<Vec<JsonValue>, StoreError> {
        let data = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<JsonValue> = data
            .get(collection)
            .map(|docs| docs.values().filter(|b| filter.matches(b)).cloned().collect())
            .unwrap_or_default();

        if let Some(sort) = sort {
            out.sort_by(|a, b| {
                let ord = compare_field(a, b, sort.field);
                if sort.descending { ord.reverse() } else { ord }
            });
        }
        Ok(out)
    }

    async fn insert(&self, collection: &str, id: Uuid, body: JsonValue) -> Result<(), StoreError> {
        self.check_injected([collection])?;
        let mut data = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        insert_doc(&mut data, collection, id, body)
    }

    async fn replace(&self, collection: &str, id: Uuid, body: JsonValue) -> Result<(), StoreError> {
        self.check_injected([collection])?;
        let mut data = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        replace_doc(&mut data, collection, id, body, None)
    }

    async fn transact(&self, writes: Vec<Write>) -> Result<(), StoreError> {
        self.check_injected(writes.iter().map(|w| match w {
            Write::Insert { collection, .. }
            | Write::Replace { collection, .. }
            | Write::Delete { collection, .. } => *collection,
        }))?;

        let mut data = self.collections.lock().unwrap_or_else(|e| e.into_inner());
        // stage on a copy so a failing write leaves nothing behind
        let mut staged = data.clone();
        for write in writes {
            apply(&mut staged, write)?;
        }
        *data = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_duplicate_and_replace_missing() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.insert("things", id, json!({"n": 1})).await.unwrap();
        assert!(matches!(
            store.insert("things", id, json!({"n": 2})).await,
            Err(StoreError::Duplicate { .. })
        ));
        assert!(matches!(
            store.replace("things", Uuid::new_v4(), json!({})).await,
            Err(StoreError::NotFound { .. })
        ));
        assert_eq!(store.find_by_id("things", id).await.unwrap(), Some(json!({"n": 1})));
    }

    #[tokio::test]
    async fn test_transact_is_all_or_nothing() {
        let store = MemoryStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.insert("things", a, json!({"revision": 1})).await.unwrap();

        // second write has a stale revision, so the first must not land either
        let err = store
            .transact(vec![
                Write::Insert { collection: "things", id: b, body: json!({}) },
                Write::Replace {
                    collection: "things",
                    id: a,
                    body: json!({"revision": 3}),
                    expected_revision: Some(2),
                },
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::StaleRevision { .. }));
        assert_eq!(store.count("things"), 1);

        store
            .transact(vec![
                Write::Insert { collection: "things", id: b, body: json!({}) },
                Write::Replace {
                    collection: "things",
                    id: a,
                    body: json!({"revision": 2}),
                    expected_revision: Some(1),
                },
            ])
            .await
            .unwrap();
        assert_eq!(store.count("things"), 2);
    }

    #[tokio::test]
    async fn test_injected_failure_aborts_batch() {
        let store = MemoryStore::new();
        store.fail_writes_to("broken");
        let err = store
            .transact(vec![
                Write::Insert { collection: "things", id: Uuid::new_v4(), body: json!({}) },
                Write::Delete { collection: "broken", id: Uuid::new_v4() },
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Aborted(_)));
        assert_eq!(store.count("things"), 0);
    }

    #[tokio::test]
    async fn test_find_filters_and_sorts() {
        let store = MemoryStore::new();
        for (n, kind) in [(3, "a"), (1, "a"), (2, "b")] {
            store
                .insert("things", Uuid::new_v4(), json!({"n": n, "kind": kind}))
                .await
                .unwrap();
        }
        let rows = store
            .find("things", &Filter::new().eq("kind", json!("a")), Some(Sort::asc("n")))
            .await
            .unwrap();
        let ns: Vec<i64> = rows.iter().map(|r| r["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![1, 3]);

        let rows = store
            .find("things", &Filter::new(), Some(Sort::desc("n")))
            .await
            .unwrap();
        assert_eq!(rows[0]["n"], json!(3));
    }
}
