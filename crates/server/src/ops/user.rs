use shared::{
    api::response_errors::RegisterError,
    model::{NewUser, User},
};
use tracing::{info, instrument};

use crate::{db::Storage, ServerError};

/// Registers `new_user` unless the username is already in use. Returns the new
/// user's id
#[instrument(skip(storage))]
pub async fn create_user_if_absent(
    storage: &Storage,
    new_user: NewUser,
) -> Result<i64, ServerError<RegisterError>> {
    let existing = storage
        .get_one(&User::select_by_username(&new_user.username), |row| row.get::<_, i64>(0))
        .await?;

    if existing.is_some() {
        Err(RegisterError::UsernameTaken)?;
    }

    let id = storage.run(&new_user.insert_statement()?).await?;
    info!(id, "Created user");

    Ok(id)
}
