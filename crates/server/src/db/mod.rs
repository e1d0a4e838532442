use std::{
    ffi::c_int,
    fs::{create_dir_all, remove_file},
    path::Path,
    sync::Once,
    time::{Duration, Instant},
};

use include_dir::{include_dir, Dir};
use rusqlite::{Connection, OpenFlags, TransactionBehavior};
use rusqlite_migration::{Migrations, SchemaVersion};
use tracing::{debug, error, info, instrument, span, trace, warn, Level};

mod storage;
pub use storage::*;

static MIGRATIONS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/migrations");

fn sqlite_connection_profiling_callback(query: &str, duration: Duration) {
    trace!(target: "sqlite_profiling", ?duration, query);
}

fn sqlite_connection_trace_callback(query: &str) {
    trace!(target: "sqlite_tracing", query);
}

fn sqlite_log_callback(sqlite_code: c_int, msg: &str) {
    use rusqlite::ffi;
    let err_code = ffi::Error::new(sqlite_code);

    // See https://www.sqlite.org/rescode.html for description of result codes.
    match sqlite_code & 0xff {
        ffi::SQLITE_NOTICE => info!(target: "sqlite", msg, %err_code, "SQLITE NOTICE"),
        ffi::SQLITE_WARNING => warn!(target: "sqlite", msg, %err_code, "SQLITE WARNING"),
        _ => error!(target: "sqlite", msg, %err_code, "SQLITE ERROR"),
    };
}

/// Routes sqlite's own log into tracing. Must run before the first connection
/// is opened in the process
pub fn configure_sqlite_logging() -> Result<(), StorageError> {
    static CONFIG_LOG: Once = Once::new();
    let mut config_result = Ok(());
    CONFIG_LOG.call_once(|| unsafe {
        config_result = rusqlite::trace::config_log(Some(sqlite_log_callback));
    });
    Ok(config_result?)
}

pub fn get_migrations() -> Result<Migrations<'static>, StorageError> {
    Ok(Migrations::from_directory(&MIGRATIONS_DIR)?)
}

#[instrument(skip(conn))]
pub fn configure_new_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    run_pragmas(conn)?;

    if cfg!(debug_assertions) {
        conn.trace(Some(sqlite_connection_trace_callback));
    } else {
        conn.profile(Some(sqlite_connection_profiling_callback));
    }

    Ok(())
}

#[instrument(skip(conn))]
pub fn run_pragmas(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

fn is_plain_path(connection_string: &str) -> bool {
    !connection_string.starts_with("file:") && !connection_string.starts_with(":memory:")
}

fn open_database(connection_string: &str) -> Result<Connection, StorageError> {
    if is_plain_path(connection_string) {
        if let Some(parent) = Path::new(connection_string)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            create_dir_all(parent)?;
        }
    }

    let open_flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX
        | OpenFlags::SQLITE_OPEN_CREATE;

    let mut conn = Connection::open_with_flags(connection_string, open_flags)?;
    configure_new_connection(&mut conn)?;
    Ok(conn)
}

fn schema_version(migrations: &Migrations, conn: &Connection) -> Result<usize, StorageError> {
    match migrations.current_version(conn)? {
        SchemaVersion::Inside(n) => Ok(n.into()),
        SchemaVersion::Outside(n) => Err(StorageError::Schema(format!(
            "Schema version {n} is outside of known schema migrations. Manual intervention required"
        ))),
        SchemaVersion::NoneSet => Ok(0),
    }
}

/// Brings the schema up to date, creating the database if needed. A fresh
/// database gets the tables and the default user. Returns the number of
/// migrations that were applied
#[instrument]
pub fn run_migrations(connection_string: &str) -> Result<usize, StorageError> {
    let mut conn = open_database(connection_string)?;

    debug!("Checking DB is writable");
    conn.transaction_with_behavior(TransactionBehavior::Exclusive)?;

    let migrations = get_migrations()?;
    let ran = {
        let _span = span!(Level::INFO, "Running migrations").entered();

        let initial_version = schema_version(&migrations, &conn)?;
        if initial_version == 0 {
            info!("New database, creating tables and default user");
        } else {
            info!("Database ready to go!");
        }

        migrations.to_latest(&mut conn)?;

        schema_version(&migrations, &conn)? - initial_version
    };

    close_database(conn)?;

    Ok(ran)
}

/// Runs an optimize on the database. Should be run periodically to keep the
/// database running optimally. It should be very fast if run regularly
#[instrument(skip(conn))]
pub fn optimize_database(conn: &Connection) -> Result<Duration, StorageError> {
    let start = Instant::now();
    conn.pragma_update(None, "analysis_limit", "400")?;
    conn.pragma_update(None, "optimize", "")?;

    Ok(start.elapsed())
}

#[instrument(skip(conn))]
pub fn close_database(conn: Connection) -> Result<(), StorageError> {
    let d1 = optimize_database(&conn)?;
    let d2 = vacuum_database(&conn)?;

    info!(
        "Optimize db took: {:.3}, vacuum took: {:.3}, total: {:.3}",
        d1.as_secs_f32(),
        d2.as_secs_f32(),
        (d1 + d2).as_secs_f32()
    );
    if let Err((_conn, e)) = conn.close() {
        return Err(e.into());
    }

    Ok(())
}

// Vacuums the database to free up space and improve fragmentation
#[instrument(skip(conn))]
pub fn vacuum_database(conn: &Connection) -> Result<Duration, StorageError> {
    let start = Instant::now();
    conn.execute("VACUUM", ())?;
    Ok(start.elapsed())
}

/// Closes the pool then tidies the database file on a fresh connection
#[instrument(skip(storage))]
pub fn close_storage(storage: Storage, connection_string: &str) -> Result<(), StorageError> {
    storage.close();
    drop(storage);

    close_database(open_database(connection_string)?)
}

/// Removes the database file along with its WAL and shared memory files
#[instrument]
pub fn delete_database(connection_string: &str) -> Result<(), StorageError> {
    if !is_plain_path(connection_string) {
        warn!("Not deleting {connection_string}, only plain paths are supported");
        return Ok(());
    }

    for suffix in ["", "-wal", "-shm"] {
        let path = format!("{connection_string}{suffix}");
        if Path::new(&path).exists() {
            info!("Deleting {path}");
            remove_file(&path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use exemplar::Model;
    use rusqlite::Connection;
    use shared::model::{User, DEFAULT_USERNAME};

    use super::*;

    fn users(path: &str) -> Vec<User> {
        let conn = Connection::open(path).unwrap();
        let mut stmt = conn.prepare("SELECT id, username FROM Users").unwrap();
        let users = stmt
            .query_map([], User::from_row)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        users
    }

    #[test]
    fn test_first_run_creates_schema_and_default_user() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/.data/tables.db");
        let path = path.to_str().unwrap();

        let ran = run_migrations(path).unwrap();

        assert_eq!(ran, MIGRATIONS_DIR.dirs().count());
        assert_eq!(
            users(path),
            vec![User {
                id: 1,
                username: DEFAULT_USERNAME.to_string()
            }]
        );
    }

    #[test]
    fn test_second_run_skips_schema_creation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.db");
        let path = path.to_str().unwrap();

        run_migrations(path).unwrap();
        let ran = run_migrations(path).unwrap();

        assert_eq!(ran, 0);
        assert_eq!(users(path).len(), 1);
    }

    #[test]
    fn test_delete_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.db");
        let path = path.to_str().unwrap();

        run_migrations(path).unwrap();
        assert!(Path::new(path).exists());

        delete_database(path).unwrap();
        assert!(!Path::new(path).exists());

        // Recreated from scratch
        assert_eq!(run_migrations(path).unwrap(), MIGRATIONS_DIR.dirs().count());
    }

    #[test]
    fn test_unknown_schema_version_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.db");
        let path = path.to_str().unwrap();

        run_migrations(path).unwrap();
        // A newer build has migrated this database past anything known here
        Connection::open(path)
            .unwrap()
            .pragma_update(None, "user_version", 99)
            .unwrap();

        let err = run_migrations(path).unwrap_err();
        assert!(matches!(err, StorageError::Schema(_)), "{err:?}");
    }
}
