//! Document persistence.
//!
//! The booking core only talks to storage through [`DocumentStore`]: look up
//! by id, filtered listing with an optional sort, insert, replace and an
//! all-or-nothing batch of writes. Documents are JSON bodies grouped into
//! collections and keyed by UUID.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;
use uuid::Uuid;

pub use postgres::PgDocumentStore;

/// Name of the numeric field compared by conditional replaces.
pub const REVISION_FIELD: &str = "revision";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: Uuid },

    #[error("{collection}/{id} already exists")]
    Duplicate { collection: String, id: Uuid },

    #[error("{collection}/{id} was modified concurrently")]
    StaleRevision { collection: String, id: Uuid },

    #[error("document (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("transaction aborted: {0}")]
    Aborted(String),
}

/// A typed document stored in one collection.
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(&'static str, JsonValue),
    In(&'static str, Vec<JsonValue>),
}

impl Condition {
    pub fn matches(&self, body: &JsonValue) -> bool {
        match self {
            Condition::Eq(field, want) => body.get(field) == Some(want),
            Condition::In(field, options) => body
                .get(field)
                .is_some_and(|have| options.iter().any(|o| o == have)),
        }
    }
}

/// Conjunction of top-level field conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &'static str, value: JsonValue) -> Self {
        self.conditions.push(Condition::Eq(field, value));
        self
    }

    pub fn one_of(mut self, field: &'static str, values: Vec<JsonValue>) -> Self {
        self.conditions.push(Condition::In(field, values));
        self
    }

    pub fn matches(&self, body: &JsonValue) -> bool {
        self.conditions.iter().all(|c| c.matches(body))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: &'static str,
    pub descending: bool,
}

impl Sort {
    pub fn asc(field: &'static str) -> Self {
        Self { field, descending: false }
    }

    pub fn desc(field: &'static str) -> Self {
        Self { field, descending: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Insert {
        collection: &'static str,
        id: Uuid,
        body: JsonValue,
    },
    Replace {
        collection: &'static str,
        id: Uuid,
        body: JsonValue,
        /// When set, the write only applies if the stored `revision` equals it.
        expected_revision: Option<i64>,
    },
    Delete {
        collection: &'static str,
        id: Uuid,
    },
}

impl Write {
    pub fn insert<T: Document>(doc: &T) -> Result<Self, StoreError> {
        Ok(Write::Insert {
            collection: T::COLLECTION,
            id: doc.id(),
            body: serde_json::to_value(doc)?,
        })
    }

    pub fn replace<T: Document>(doc: &T) -> Result<Self, StoreError> {
        Ok(Write::Replace {
            collection: T::COLLECTION,
            id: doc.id(),
            body: serde_json::to_value(doc)?,
            expected_revision: None,
        })
    }

    pub fn replace_if_revision<T: Document>(doc: &T, expected: i64) -> Result<Self, StoreError> {
        Ok(Write::Replace {
            collection: T::COLLECTION,
            id: doc.id(),
            body: serde_json::to_value(doc)?,
            expected_revision: Some(expected),
        })
    }

    pub fn delete<T: Document>(id: Uuid) -> Self {
        Write::Delete {
            collection: T::COLLECTION,
            id,
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<JsonValue>, StoreError>;

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<Sort>,
    ) -> Result<Vec<JsonValue>, StoreError>;

    async fn insert(&self, collection: &str, id: Uuid, body: JsonValue) -> Result<(), StoreError>;

    async fn replace(&self, collection: &str, id: Uuid, body: JsonValue) -> Result<(), StoreError>;

    /// Applies every write or none of them.
    async fn transact(&self, writes: Vec<Write>) -> Result<(), StoreError>;
}

/* -------------------------
   Typed helpers
--------------------------*/

pub async fn load<T: Document>(store: &dyn DocumentStore, id: Uuid) -> Result<Option<T>, StoreError> {
    match store.find_by_id(T::COLLECTION, id).await? {
        Some(body) => Ok(Some(serde_json::from_value(body)?)),
        None => Ok(None),
    }
}

pub async fn find<T: Document>(
    store: &dyn DocumentStore,
    filter: &Filter,
    sort: Option<Sort>,
) -> Result<Vec<T>, StoreError> {
    store
        .find(T::COLLECTION, filter, sort)
        .await?
        .into_iter()
        .map(|body| serde_json::from_value(body).map_err(StoreError::from))
        .collect()
}

pub async fn insert<T: Document>(store: &dyn DocumentStore, doc: &T) -> Result<(), StoreError> {
    store
        .insert(T::COLLECTION, doc.id(), serde_json::to_value(doc)?)
        .await
}

pub async fn replace<T: Document>(store: &dyn DocumentStore, doc: &T) -> Result<(), StoreError> {
    store
        .replace(T::COLLECTION, doc.id(), serde_json::to_value(doc)?)
        .await
}

pub(crate) fn revision_of(body: &JsonValue) -> Option<i64> {
    body.get(REVISION_FIELD).and_then(JsonValue::as_i64)
}
