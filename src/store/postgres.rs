// src/store/postgres.rs

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, types::Json};
use uuid::Uuid;

use super::{Condition, DocumentStore, Filter, Sort, StoreError, Write};

/// Documents live in a single `documents(collection, id, body jsonb)` table.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<JsonValue>, StoreError> {
        let body: Option<Json<JsonValue>> = sqlx::query_scalar(
            r#"
            SELECT body
            FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(body.map(|b| b.0))
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<Sort>,
    ) -> Result<Vec<JsonValue>, StoreError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT body FROM documents WHERE collection = ");
        qb.push_bind(collection.to_string());

        for cond in &filter.conditions {
            match cond {
                Condition::Eq(field, value) => {
                    qb.push(" AND body -> ");
                    qb.push_bind(*field);
                    qb.push(" = ");
                    qb.push_bind(Json(value.clone()));
                }
                Condition::In(field, values) => {
                    // jsonb arrays contain a scalar when one element equals it
                    qb.push(" AND ");
                    qb.push_bind(Json(JsonValue::Array(values.clone())));
                    qb.push(" @> (body -> ");
                    qb.push_bind(*field);
                    qb.push(")");
                }
            }
        }

        if let Some(sort) = sort {
            qb.push(" ORDER BY body ->> ");
            qb.push_bind(sort.field);
            qb.push(if sort.descending { " DESC" } else { " ASC" });
            qb.push(", id ASC");
        }

        let rows = qb
            .build_query_scalar::<Json<JsonValue>>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|b| b.0).collect())
    }

    async fn insert(&self, collection: &str, id: Uuid, body: JsonValue) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        insert_row(&mut *conn, collection, id, body).await
    }

    async fn replace(&self, collection: &str, id: Uuid, body: JsonValue) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        replace_row(&mut *conn, collection, id, body, None).await
    }

    async fn transact(&self, writes: Vec<Write>) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for write in writes {
            // an early return drops `tx`, which rolls everything back
            match write {
                Write::Insert { collection, id, body } => {
                    insert_row(&mut *tx, collection, id, body).await?
                }
                Write::Replace {
                    collection,
                    id,
                    body,
                    expected_revision,
                } => replace_row(&mut *tx, collection, id, body, expected_revision).await?,
                Write::Delete { collection, id } => delete_row(&mut *tx, collection, id).await?,
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn insert_row(
    conn: &mut PgConnection,
    collection: &str,
    id: Uuid,
    body: JsonValue,
) -> Result<(), StoreError> {
    let done = sqlx::query(
        r#"
        INSERT INTO documents (collection, id, body)
        VALUES ($1, $2, $3)
        ON CONFLICT (collection, id) DO NOTHING
        "#,
    )
    .bind(collection)
    .bind(id)
    .bind(Json(body))
    .execute(&mut *conn)
    .await?;

    if done.rows_affected() == 0 {
        return Err(StoreError::Duplicate {
            collection: collection.to_string(),
            id,
        });
    }
    Ok(())
}

async fn replace_row(
    conn: &mut PgConnection,
    collection: &str,
    id: Uuid,
    body: JsonValue,
    expected_revision: Option<i64>,
) -> Result<(), StoreError> {
    let done = sqlx::query(
        r#"
        UPDATE documents
        SET body = $3,
            updated_at = now()
        WHERE collection = $1
          AND id = $2
          AND ($4::bigint IS NULL OR (body ->> 'revision')::bigint = $4)
        "#,
    )
    .bind(collection)
    .bind(id)
    .bind(Json(body))
    .bind(expected_revision)
    .execute(&mut *conn)
    .await?;

    if done.rows_affected() > 0 {
        return Ok(());
    }

    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (SELECT 1 FROM documents WHERE collection = $1 AND id = $2)
        "#,
    )
    .bind(collection)
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;

    let collection = collection.to_string();
    if exists {
        Err(StoreError::StaleRevision { collection, id })
    } else {
        Err(StoreError::NotFound { collection, id })
    }
}

async fn delete_row(conn: &mut PgConnection, collection: &str, id: Uuid) -> Result<(), StoreError> {
    let done = sqlx::query(
        r#"
        DELETE FROM documents
        WHERE collection = $1 AND id = $2
        "#,
    )
    .bind(collection)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if done.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            collection: collection.to_string(),
            id,
        });
    }
    Ok(())
}
