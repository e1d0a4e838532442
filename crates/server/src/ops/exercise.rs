use exemplar::Model;
use shared::{
    api::{
        payloads::{ExerciseLog, ExerciseLogQuery},
        response_errors::{AddExerciseError, ExerciseLogError},
    },
    model::{Exercise, NewExercise},
};
use tracing::{info, instrument};

use super::check_id_exists;
use crate::{db::Storage, ServerError};

/// Stores an exercise against an existing user. Returns the new exercise's id
#[instrument(skip(storage))]
pub async fn add_exercise(
    storage: &Storage,
    new_exercise: NewExercise,
) -> Result<i64, ServerError<AddExerciseError>> {
    if !check_id_exists(storage, new_exercise.user_id).await? {
        info!("No user exists, there will be no entry");
        Err(AddExerciseError::UserIdDoesntExist)?;
    }

    let exercise_id = storage.run(&new_exercise.insert_statement()?).await?;
    info!(exercise_id, "Added exercise");

    Ok(exercise_id)
}

#[instrument(skip(storage))]
pub async fn list_exercises(
    storage: &Storage,
    query: &ExerciseLogQuery,
) -> Result<ExerciseLog, ServerError<ExerciseLogError>> {
    if !check_id_exists(storage, query.user_id).await? {
        Err(ExerciseLogError::UserIdDoesntExist)?;
    }

    let exercises = storage
        .get_all(&Exercise::select_log(query), Exercise::from_row)
        .await?;

    Ok(ExerciseLog {
        user_id: query.user_id.to_string(),
        exercises,
    })
}
