use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use deadpool_sqlite::{Config, Hook, HookError, InteractError, Pool, PoolError, Runtime};
use rusqlite::{Connection, OptionalExtension, Row};
use sea_query::{SelectStatement, SqliteQueryBuilder};
use sea_query_rusqlite::RusqliteBinder;
use thiserror::Error;
use tracing::{instrument, trace};

use super::configure_new_connection;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to get a database connection: {0}")]
    Pool(#[from] PoolError),
    #[error("Database interaction failed: {0}")]
    Interact(String),
    #[error("Failed to build database pool: {0}")]
    Build(String),
    #[error("{0}")]
    Schema(String),
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Failed to build query: {0}")]
    Query(#[from] sea_query::error::Error),
    #[error("Migration failed: {0}")]
    Migration(#[from] rusqlite_migration::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl From<InteractError> for StorageError {
    fn from(err: InteractError) -> Self {
        Self::Interact(err.to_string())
    }
}

/// Async access to the database. Each call checks a connection out of the
/// pool and runs the statement on deadpool's blocking thread.
#[derive(Debug, Clone)]
pub struct Storage {
    pool: Pool,
}

impl Storage {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Creates a pool whose connections all get the standard pragmas and
    /// tracing callbacks. Doesn't touch the schema, see `run_migrations`
    pub fn open(connection_string: &str) -> Result<Self, StorageError> {
        let pool = Config::new(connection_string)
            .builder(Runtime::Tokio1)
            .map_err(|e| StorageError::Build(e.to_string()))?
            .post_create(Hook::async_fn(|object, _| {
                Box::pin(async move {
                    object
                        .interact(|conn| configure_new_connection(conn))
                        .await
                        .map_err(|e| HookError::Message(e.to_string().into()))?
                        .map_err(HookError::Backend)?;
                    Ok::<_, HookError>(())
                })
            }))
            .build()
            .map_err(|e| StorageError::Build(e.to_string()))?;

        Ok(Self::new(pool))
    }

    /// Stops handing out connections and drops the idle ones
    pub fn close(&self) {
        self.pool.close();
    }

    async fn interact<F, R>(&self, f: F) -> Result<R, StorageError>
    where
        F: FnOnce(&mut Connection) -> Result<R, rusqlite::Error> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self.pool.get().await?;
        Ok(conn.interact(f).await??)
    }

    /// First matching row, `None` when nothing matches
    #[instrument(skip_all)]
    pub async fn get_one<T, F>(&self, query: &SelectStatement, map: F) -> Result<Option<T>, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Row<'_>) -> Result<T, rusqlite::Error> + Send + 'static,
    {
        let (sql, values) = query.build_rusqlite(SqliteQueryBuilder);
        trace!(sql);
        self.interact(move |conn| {
            let mut stmt = conn.prepare_cached(&sql)?;
            stmt.query_row(&*values.as_params(), map).optional()
        })
        .await
    }

    #[instrument(skip_all)]
    pub async fn get_all<T, F>(&self, query: &SelectStatement, map: F) -> Result<Vec<T>, StorageError>
    where
        T: Send + 'static,
        F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error> + Send + 'static,
    {
        let (sql, values) = query.build_rusqlite(SqliteQueryBuilder);
        trace!(sql);
        self.interact(move |conn| {
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt
                .query_map(&*values.as_params(), map)?
                .collect::<Result<_, _>>()?;
            Ok(rows)
        })
        .await
    }

    /// Executes an insert/update and returns the rowid of the last inserted row
    #[instrument(skip_all)]
    pub async fn run<S: RusqliteBinder>(&self, statement: &S) -> Result<i64, StorageError> {
        let (sql, values) = statement.build_rusqlite(SqliteQueryBuilder);
        trace!(sql);
        self.interact(move |conn| {
            conn.prepare_cached(&sql)?.execute(&*values.as_params())?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Storage
where
    S: Send + Sync,
    Storage: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Storage::from_ref(state))
    }
}
