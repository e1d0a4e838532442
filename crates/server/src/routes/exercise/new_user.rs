use axum::Json;
use shared::{
    api::{payloads::NewUserResponse, response_errors::RegisterError},
    model::NewUser,
};
use tracing::instrument;

use crate::{db::Storage, ops, validation::ValidatedForm, ServerError};

#[instrument(skip(storage))]
pub async fn new_user(
    storage: Storage,
    ValidatedForm(new_user): ValidatedForm<NewUser>,
) -> Result<Json<NewUserResponse>, ServerError<RegisterError>> {
    let id = ops::create_user_if_absent(&storage, new_user).await?;
    Ok(Json(NewUserResponse { id }))
}
