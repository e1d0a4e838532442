//! Domain operations. Each composes one or more storage calls to serve a
//! single request. Existence checks and the inserts that depend on them run
//! as separate statements, so a concurrent request can slip in between.

use shared::model::User;
use tracing::instrument;

use crate::db::{Storage, StorageError};

mod user;
pub use user::*;

mod exercise;
pub use exercise::*;

/// Whether a user with this id is stored
#[instrument(skip(storage))]
pub async fn check_id_exists(storage: &Storage, id: i64) -> Result<bool, StorageError> {
    let row = storage
        .get_one(&User::select_by_id(id), |row| row.get::<_, i64>(0))
        .await?;
    Ok(row.is_some())
}

#[cfg(test)]
mod test {
    use shared::model::NewUser;

    use super::*;
    use crate::test_utils::test_storage;

    #[tokio::test]
    async fn test_check_id_exists() {
        let (_dir, storage) = test_storage();

        // Default user
        assert!(check_id_exists(&storage, 1).await.unwrap());
        assert!(!check_id_exists(&storage, 2).await.unwrap());
        assert!(!check_id_exists(&storage, 0).await.unwrap());
    }

    #[tokio::test]
    async fn test_ops_run_on_spawned_tasks() {
        let (_dir, storage) = test_storage();

        // Handlers are spawned by the server, so every op future must be Send
        let id = tokio::spawn({
            let storage = storage.clone();
            async move { create_user_if_absent(&storage, NewUser::new("alice")).await }
        })
        .await
        .unwrap()
        .unwrap();

        let exists = tokio::spawn(async move { check_id_exists(&storage, id).await })
            .await
            .unwrap()
            .unwrap();
        assert!(exists);
    }
}
