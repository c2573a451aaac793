use super::Dialect;

/// Postgres dialect implementation of the `Dialect` trait.
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn placeholder(idx: usize) -> String {
        format!("${idx}")
    }

    fn migration() -> Vec<&'static str> {
        vec![
            r#"CREATE TABLE IF NOT EXISTS content (
                id VARCHAR PRIMARY KEY,
                type TEXT NOT NULL,
                image_url TEXT,
                image_base64 TEXT,
                prompt TEXT,
                mood TEXT,
                length TEXT,
                generated_content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )"#,
            r#"CREATE INDEX IF NOT EXISTS content_type_created_at
                ON content (type, created_at)"#,
        ]
    }
}
