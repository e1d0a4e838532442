pub mod cli;
pub mod db;
pub mod ops;
pub mod routes;
pub mod validation;

mod errors;
pub use errors::*;

mod state;
pub use state::*;

#[cfg(test)]
pub(crate) mod test_utils {
    use tempfile::TempDir;

    use crate::db::{run_migrations, Storage};

    /// Fresh, migrated database in a scratch directory. Keep the `TempDir`
    /// alive for as long as the storage is used
    pub fn test_storage() -> (TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.db");
        let path = path.to_str().unwrap();

        run_migrations(path).unwrap();
        let storage = Storage::open(path).unwrap();

        (dir, storage)
    }
}
