use chrono::{DateTime, Utc};
use futures::StreamExt;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::FromRow;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::concurrency::stream::StopOnErrorStream;
use crate::error::{ErrorKind, RelayError, RelayResult};
use crate::models::Record;
use crate::relay_error;
use crate::source::{RowSource, RowStream};

/// Reads the SQL of a task from `path`.
///
/// The query receives the checkpoint as its only parameter, `$1`.
pub fn load_query(path: impl AsRef<Path>) -> RelayResult<String> {
    let path = path.as_ref();
    let query = std::fs::read_to_string(path).map_err(|err| {
        relay_error!(
            ErrorKind::QueryLoadFailed,
            "Failed to open query file",
            format!("{}: {err}", path.display())
        )
    })?;

    if query.trim().is_empty() {
        return Err(relay_error!(
            ErrorKind::QueryLoadFailed,
            "Query file is empty",
            path.display()
        ));
    }

    Ok(query)
}

/// [`RowSource`] running a parameterized query against a shared Postgres pool.
#[derive(Debug)]
pub struct PgRowSource<R> {
    pool: PgPool,
    query: Arc<str>,
    _record: PhantomData<fn() -> R>,
}

impl<R> PgRowSource<R> {
    pub fn new(pool: PgPool, query: impl Into<Arc<str>>) -> Self {
        Self {
            pool,
            query: query.into(),
            _record: PhantomData,
        }
    }

    /// Builds a source from a query file, failing if the file cannot be read.
    pub fn from_file(pool: PgPool, path: impl AsRef<Path>) -> RelayResult<Self> {
        let query = load_query(path)?;
        Ok(Self::new(pool, query))
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

impl<R> Clone for PgRowSource<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            query: self.query.clone(),
            _record: PhantomData,
        }
    }
}

impl<R> RowSource for PgRowSource<R>
where
    R: Record + for<'r> FromRow<'r, PgRow>,
{
    type Record = R;

    fn stream(&self, since: DateTime<Utc>) -> RowStream<'_, R> {
        debug!(%since, "opening row stream");

        let rows = sqlx::query_as::<_, R>(&self.query)
            .bind(since)
            .fetch(&self.pool)
            .map(|row| row.map_err(RelayError::from));

        StopOnErrorStream::wrap(rows).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_query_file_is_a_load_error() {
        let err = load_query("does/not/exist.sql").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::QueryLoadFailed);
        assert!(err.detail().unwrap().contains("does/not/exist.sql"));
    }

    #[test]
    fn query_file_is_read_verbatim() {
        let path = std::env::temp_dir().join(format!("relay-query-{}.sql", uuid::Uuid::new_v4()));
        std::fs::write(&path, "select * from users where updated_at > $1").unwrap();

        let query = load_query(&path).unwrap();
        assert_eq!(query, "select * from users where updated_at > $1");

        std::fs::remove_file(path).unwrap();
    }
}
