use crate::{
    dialect::{CurrentDialect, CurrentRow, Db, Dialect},
    schema::{ContentRecord, ContentType, NewContent},
};
use chrono::{DateTime, SecondsFormat, Utc};
pub use sqlx::Pool;
use sqlx::{FromRow, Row, pool::PoolOptions};
use thiserror::Error;
use uuid::Uuid;

pub async fn run_migration(pool: &Pool<Db>) -> Result<(), sqlx::Error> {
    for stmt in CurrentDialect::migration() {
        sqlx::query(stmt).execute(pool).await?;
    }

    Ok(())
}

/// Formats a timestamp the way it is stored: fixed-width RFC 3339 in UTC, so
/// that comparing the stored text orders rows chronologically.
fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_error<E>(column: &str, source: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

impl FromRow<'_, CurrentRow> for ContentRecord {
    fn from_row(row: &CurrentRow) -> Result<Self, sqlx::Error> {
        let content_type: String = row.try_get("type")?;
        let content_type = content_type
            .parse::<ContentType>()
            .map_err(|e| decode_error("type", e))?;
        let generated_content: String = row.try_get("generated_content")?;
        let generated_content = serde_json::from_str(&generated_content)
            .map_err(|e| decode_error("generated_content", e))?;
        let created_at: String = row.try_get("created_at")?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| decode_error("created_at", e))?
            .with_timezone(&Utc);

        Ok(ContentRecord {
            id: row.try_get("id")?,
            content_type,
            image_url: row.try_get("image_url")?,
            image_base64: row.try_get("image_base64")?,
            prompt: row.try_get("prompt")?,
            mood: row.try_get("mood")?,
            length: row.try_get("length")?,
            generated_content,
            created_at,
        })
    }
}

/// A relational store for content records.
///
/// This struct wraps an SQLx connection pool and maps [`ContentRecord`]s to rows
/// of the `content` table. The implementation is SQL dialect agnostic and
/// delegates syntax to `Dialect`.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Db>,
}

impl Database {
    pub async fn with_migration(pool: Pool<Db>) -> Result<Self, DatabaseError> {
        run_migration(&pool)
            .await
            .map_err(|e| DatabaseError::MigrationFailed { source: e })?;

        Ok(Self { pool })
    }

    /// Connects to `url` and migrates the schema.
    ///
    /// A SQLite file that does not exist yet is created first. In-memory SQLite
    /// databases are held on a single connection that is never reaped, since
    /// every new connection would see its own empty database.
    pub async fn connect(url: &str) -> Result<Self, DatabaseError> {
        let in_memory = url.contains(":memory:");

        #[cfg(feature = "sqlite")]
        if !in_memory {
            use sqlx::migrate::MigrateDatabase;

            let exists = Db::database_exists(url)
                .await
                .map_err(|e| DatabaseError::ConnectFailed { source: e })?;
            if !exists {
                tracing::info!("creating sqlite database");
                Db::create_database(url)
                    .await
                    .map_err(|e| DatabaseError::ConnectFailed { source: e })?;
            }
        }

        let options = if in_memory {
            PoolOptions::<Db>::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            PoolOptions::<Db>::new()
        };
        let pool = options
            .connect(url)
            .await
            .map_err(|e| DatabaseError::ConnectFailed { source: e })?;

        Self::with_migration(pool).await
    }

    async fn retry<F, Fut, T>(&self, mut op: F) -> Result<T, DatabaseError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, DatabaseError>>,
    {
        let max_retries = 3;
        for attempt in 0..max_retries {
            let result = op().await;
            match result {
                Ok(v) => return Ok(v),
                Err(ref e) if e.is_retryable() && attempt + 1 < max_retries => {
                    tracing::warn!(attempt, error = %e, "retrying database operation");
                    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        unreachable!("Retry loop should return before exceeding max_retries")
    }

    /// Inserts a new content row, assigning it a UUID and the current time.
    pub async fn create_content(&self, content: NewContent) -> Result<ContentRecord, DatabaseError> {
        let record = content.into_record(Uuid::new_v4().to_string(), Utc::now());
        let stmt = CurrentDialect::insert_content_statement();
        let generated = record.generated_content.to_string();
        let created_at = format_timestamp(&record.created_at);

        self.retry(|| async {
            sqlx::query(&stmt)
                .bind(&record.id)
                .bind(record.content_type.as_str())
                .bind(record.image_url.as_deref())
                .bind(record.image_base64.as_deref())
                .bind(record.prompt.as_deref())
                .bind(record.mood.as_deref())
                .bind(record.length.as_deref())
                .bind(&generated)
                .bind(&created_at)
                .execute(&self.pool)
                .await
                .map_err(|e| DatabaseError::QueryFailed {
                    operation: DbOperation::InsertContent {
                        id: record.id.clone(),
                    },
                    sql: stmt.to_string(),
                    source: e,
                })
        })
        .await?;

        Ok(record)
    }

    pub async fn get_content(&self, id: &str) -> Result<Option<ContentRecord>, DatabaseError> {
        let stmt = CurrentDialect::query_content_statement();

        self.retry(|| async {
            sqlx::query_as::<_, ContentRecord>(&stmt)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DatabaseError::QueryFailed {
                    operation: DbOperation::QueryContent { id: id.to_string() },
                    sql: stmt.to_string(),
                    source: e,
                })
        })
        .await
    }

    /// Returns every record of the given type, newest first.
    pub async fn get_content_by_type(
        &self,
        content_type: ContentType,
    ) -> Result<Vec<ContentRecord>, DatabaseError> {
        let stmt = CurrentDialect::query_content_by_type_statement();

        self.retry(|| async {
            sqlx::query_as::<_, ContentRecord>(&stmt)
                .bind(content_type.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| DatabaseError::QueryFailed {
                    operation: DbOperation::QueryContentByType { content_type },
                    sql: stmt.to_string(),
                    source: e,
                })
        })
        .await
    }

    /// Deletes a record. Returns whether a row was actually removed.
    pub async fn delete_content(&self, id: &str) -> Result<bool, DatabaseError> {
        let stmt = CurrentDialect::delete_content_statement();

        let result = self
            .retry(|| async {
                sqlx::query(&stmt)
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| DatabaseError::QueryFailed {
                        operation: DbOperation::DeleteContent { id: id.to_string() },
                        sql: stmt.to_string(),
                        source: e,
                    })
            })
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Represents errors that can occur during database operations.
///
/// Each variant includes contextual information to assist with debugging and error handling.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A general SQL query failure, with the operation and SQL that failed.
    #[error("Query failed during {operation:?}: sql={sql}")]
    QueryFailed {
        operation: DbOperation,
        sql: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to connect to database")]
    ConnectFailed {
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to migrate database schema")]
    MigrationFailed {
        #[source]
        source: sqlx::Error,
    },
}

/// Enum representing the kind of database operation being performed,
/// used for attaching context to [`DatabaseError::QueryFailed`].
#[derive(Debug)]
pub enum DbOperation {
    /// INSERT INTO content
    InsertContent { id: String },
    /// SELECT ... FROM content WHERE id = ...
    QueryContent { id: String },
    /// SELECT ... FROM content WHERE type = ...
    QueryContentByType { content_type: ContentType },
    /// DELETE FROM content WHERE id = ...
    DeleteContent { id: String },
}

impl DatabaseError {
    fn is_retryable(&self) -> bool {
        let is_retryable_kind = |e: &sqlx::Error| {
            matches!(e, sqlx::Error::Io(_))
                || matches!(e, sqlx::Error::Protocol(_))
                || matches!(e, sqlx::Error::PoolTimedOut)
        };

        match self {
            DatabaseError::QueryFailed { source, .. } => is_retryable_kind(source),
            DatabaseError::ConnectFailed { .. } | DatabaseError::MigrationFailed { .. } => false,
        }
    }
}
