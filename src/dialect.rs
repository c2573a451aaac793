//! # SQL Dialect Module
//!
//! This module defines the `Dialect` trait, which abstracts over the differences in
//! SQL syntax across the supported database systems. The trait carries default
//! statement builders written against the placeholder returned by
//! [`Dialect::placeholder`], so a backend usually only overrides placeholders and
//! its migration DDL.
//!
//! The dialect in use is chosen at compile time by feature flags: `sqlite`
//! (the default) selects [`sqlite::SqliteDialect`], `postgres` alone selects
//! [`postgres::PostgresDialect`].

#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

/// The current SQL dialect used at compile time, determined by feature flags.
#[cfg(feature = "sqlite")]
pub type CurrentDialect = sqlite::SqliteDialect;

#[cfg(feature = "sqlite")]
pub type Db = sqlx::Sqlite;

#[cfg(feature = "sqlite")]
pub type CurrentRow = sqlx::sqlite::SqliteRow;

#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
pub type CurrentDialect = postgres::PostgresDialect;

#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
pub type Db = sqlx::Postgres;

#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
pub type CurrentRow = sqlx::postgres::PgRow;

/// Columns selected whenever a full content row is read.
const CONTENT_COLUMNS: &str =
    "id, type, image_url, image_base64, prompt, mood, length, generated_content, created_at";

/// A trait for SQL dialects to support database-specific query generation.
///
/// The goal is to abstract away differences in placeholder syntax and schema
/// setup so that [`Database`](crate::database::Database) stays dialect-agnostic.
pub trait Dialect {
    /// Returns the SQL placeholder syntax for the given parameter index.
    ///
    /// - SQLite: `?`
    /// - PostgreSQL: `$1`, `$2`, ...
    ///
    /// # Parameters
    /// - `idx`: The 1-based parameter index (used in dialects that number placeholders).
    fn placeholder(idx: usize) -> String;

    /// Returns the DDL statements that create the schema.
    ///
    /// Every statement must be safe to run against an already migrated database.
    fn migration() -> Vec<&'static str>;

    /// Returns the SQL statement inserting one content row.
    ///
    /// Binds, in order: id, type, image_url, image_base64, prompt, mood, length,
    /// generated_content, created_at.
    fn insert_content_statement() -> String {
        format!(
            r#"INSERT INTO content
            (id, type, image_url, image_base64, prompt, mood, length, generated_content, created_at)
            VALUES ({}, {}, {}, {}, {}, {}, {}, {}, {})"#,
            Self::placeholder(1),
            Self::placeholder(2),
            Self::placeholder(3),
            Self::placeholder(4),
            Self::placeholder(5),
            Self::placeholder(6),
            Self::placeholder(7),
            Self::placeholder(8),
            Self::placeholder(9)
        )
    }

    /// Returns the SQL statement selecting one content row by id.
    fn query_content_statement() -> String {
        format!(
            "SELECT {} FROM content WHERE id = {}",
            CONTENT_COLUMNS,
            Self::placeholder(1)
        )
    }

    /// Returns the SQL statement selecting every row of a type, newest first.
    fn query_content_by_type_statement() -> String {
        format!(
            "SELECT {} FROM content WHERE type = {} ORDER BY created_at DESC",
            CONTENT_COLUMNS,
            Self::placeholder(1)
        )
    }

    /// Returns the SQL statement deleting one content row by id.
    fn delete_content_statement() -> String {
        format!("DELETE FROM content WHERE id = {}", Self::placeholder(1))
    }
}
