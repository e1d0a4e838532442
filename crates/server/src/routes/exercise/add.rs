use axum::Json;
use shared::{
    api::{payloads::NewExerciseResponse, response_errors::AddExerciseError},
    model::NewExercise,
};
use tracing::instrument;

use crate::{db::Storage, ops, validation::ValidatedForm, ServerError};

#[instrument(skip(storage))]
pub async fn add_exercise(
    storage: Storage,
    ValidatedForm(new_exercise): ValidatedForm<NewExercise>,
) -> Result<Json<NewExerciseResponse>, ServerError<AddExerciseError>> {
    let exercise_id = ops::add_exercise(&storage, new_exercise).await?;
    Ok(Json(NewExerciseResponse { exercise_id }))
}
