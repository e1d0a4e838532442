use axum::Json;
use shared::api::{
    payloads::{ExerciseLog, ExerciseLogQuery},
    response_errors::ExerciseLogError,
};
use tracing::instrument;

use crate::{db::Storage, ops, validation::ValidatedQuery, ServerError};

#[instrument(skip(storage))]
pub async fn exercise_log(
    storage: Storage,
    ValidatedQuery(query): ValidatedQuery<ExerciseLogQuery>,
) -> Result<Json<ExerciseLog>, ServerError<ExerciseLogError>> {
    Ok(Json(ops::list_exercises(&storage, &query).await?))
}
