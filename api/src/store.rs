use crate::error::StoreError;
use crate::identity::resolve_message_id;
use crate::timestamp::parse_captured_at;
use chrono::{DateTime, Utc};
use mailtrack_types::{CaptureRequest, EmailRecord};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

const SELECT_EMAIL: &str = r#"
    SELECT id, message_id, subject, sender, timestamp, body, url, captured_at, annotations
    FROM emails
    WHERE id = ?
"#;

const LIST_EMAILS: &str = r#"
    SELECT id, message_id, subject, sender, timestamp, body, url, captured_at, annotations
    FROM emails
    ORDER BY captured_at DESC, id DESC
"#;

const INSERT_EMAIL: &str = r#"
    INSERT INTO emails (message_id, subject, sender, timestamp, body, url, captured_at, annotations)
    VALUES (?, ?, ?, ?, ?, ?, ?, '')
    RETURNING id, message_id, subject, sender, timestamp, body, url, captured_at, annotations
"#;

#[derive(Debug, sqlx::FromRow)]
struct EmailRow {
    id: i64,
    message_id: String,
    subject: String,
    sender: String,
    timestamp: String,
    body: String,
    url: String,
    captured_at: DateTime<Utc>,
    annotations: String,
}

impl From<EmailRow> for EmailRecord {
    fn from(row: EmailRow) -> Self {
        Self {
            id: row.id,
            message_id: row.message_id,
            subject: row.subject,
            sender: row.sender,
            timestamp: row.timestamp,
            body: row.body,
            url: row.url,
            captured_at: row.captured_at,
            annotations: row.annotations,
        }
    }
}

/// Owns the persisted set of captured emails.
///
/// Every mutating operation runs in its own transaction; returning early with
/// an error drops the transaction, which rolls it back.
#[derive(Clone)]
pub struct EmailStore {
    db: SqlitePool,
}

impl EmailStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.db).await
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    pub async fn capture(&self, request: &CaptureRequest) -> Result<EmailRecord, StoreError> {
        let message_id = resolve_message_id(request);
        tracing::debug!(%message_id, "Resolved capture identity");

        let captured_at = parse_captured_at(&request.captured_at).ok_or_else(|| {
            StoreError::Validation(format!(
                "Invalid captured_at timestamp: {:?}",
                request.captured_at
            ))
        })?;

        // The insert is the transaction's first statement so SQLite takes the
        // write lock up front; the unique index on message_id rejects duplicates.
        let mut tx = self.db.begin().await?;

        let row: EmailRow = sqlx::query_as(INSERT_EMAIL)
            .bind(&message_id)
            .bind(&request.subject)
            .bind(&request.sender)
            .bind(&request.timestamp)
            .bind(&request.body)
            .bind(&request.url)
            .bind(captured_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    tracing::warn!(%message_id, "Email already captured");
                    StoreError::Duplicate(message_id.clone())
                }
                other => StoreError::Internal(other),
            })?;

        tx.commit().await?;

        tracing::info!(id = row.id, message_id = %row.message_id, "Email captured");
        Ok(row.into())
    }

    pub async fn list(&self) -> Result<Vec<EmailRecord>, StoreError> {
        let rows: Vec<EmailRow> = sqlx::query_as(LIST_EMAILS).fetch_all(&self.db).await?;
        Ok(rows.into_iter().map(EmailRecord::from).collect())
    }

    pub async fn get(&self, id: i64) -> Result<EmailRecord, StoreError> {
        let row: Option<EmailRow> = sqlx::query_as(SELECT_EMAIL)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        row.map(EmailRecord::from).ok_or(StoreError::NotFound(id))
    }

    pub async fn update_annotations(&self, id: i64, annotations: &str) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query("UPDATE emails SET annotations = ? WHERE id = ?")
            .bind(annotations)
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(StoreError::NotFound(id));
        }

        tx.commit().await?;
        tracing::info!(id, "Annotations updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;

        let deleted = sqlx::query("DELETE FROM emails WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(StoreError::NotFound(id));
        }

        tx.commit().await?;
        tracing::info!(id, "Email deleted");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) async fn memory_store() -> EmailStore {
    // Each in-memory connection is its own database, so keep exactly one.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = EmailStore::new(pool);
    store.migrate().await.unwrap();
    store
}
