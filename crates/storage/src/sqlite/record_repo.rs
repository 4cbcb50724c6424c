use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::{Row, SqliteConnection};
use stride_core::model::UserId;
use tracing::debug;

use crate::document::UserDocument;
use crate::repository::{RecordStore, RecordSubscription, StorageError};

use super::SqliteRepository;

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

async fn fetch_body(
    db: &mut SqliteConnection,
    user_id: &UserId,
) -> Result<Option<UserDocument>, StorageError> {
    let row = sqlx::query("SELECT body FROM user_records WHERE user_id = ?1")
        .bind(user_id.as_str())
        .fetch_optional(&mut *db)
        .await
        .map_err(conn)?;

    let Some(row) = row else {
        return Ok(None);
    };
    let body: String = row
        .try_get("body")
        .map_err(|err| StorageError::Serialization(err.to_string()))?;
    UserDocument::from_json(&body).map(Some)
}

async fn store_body(
    db: &mut SqliteConnection,
    user_id: &UserId,
    document: &UserDocument,
) -> Result<(), StorageError> {
    sqlx::query(
        r"
        INSERT INTO user_records (user_id, body, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(user_id) DO UPDATE SET
            body = excluded.body,
            updated_at = excluded.updated_at
        ",
    )
    .bind(user_id.as_str())
    .bind(document.to_json()?)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *db)
    .await
    .map_err(conn)?;
    Ok(())
}

#[async_trait]
impl RecordStore for SqliteRepository {
    async fn get_record(&self, user_id: &UserId) -> Result<Option<UserDocument>, StorageError> {
        let mut db = self.pool.acquire().await.map_err(conn)?;
        fetch_body(&mut db, user_id).await
    }

    async fn put_record(
        &self,
        user_id: &UserId,
        document: &UserDocument,
    ) -> Result<(), StorageError> {
        let _gate = self.notify_gate.lock().await;
        let mut db = self.pool.acquire().await.map_err(conn)?;
        store_body(&mut db, user_id, document).await?;
        self.watchers.publish(user_id, document)?;
        debug!(user = %user_id, steps = document.step_count, "record overwritten");
        Ok(())
    }

    async fn merge_fields(
        &self,
        user_id: &UserId,
        fields: Map<String, Value>,
    ) -> Result<UserDocument, StorageError> {
        let _gate = self.notify_gate.lock().await;
        let mut tx = self.pool.begin().await.map_err(conn)?;
        let merged = fetch_body(&mut tx, user_id)
            .await?
            .unwrap_or_default()
            .merged(fields)?;
        store_body(&mut tx, user_id, &merged).await?;
        tx.commit().await.map_err(conn)?;

        self.watchers.publish(user_id, &merged)?;
        debug!(user = %user_id, "record fields merged");
        Ok(merged)
    }

    async fn subscribe(&self, user_id: &UserId) -> Result<RecordSubscription, StorageError> {
        let _gate = self.notify_gate.lock().await;
        let current = self.get_record(user_id).await?;
        self.watchers.subscribe(user_id, current)
    }
}
