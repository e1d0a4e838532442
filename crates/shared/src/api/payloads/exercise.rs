use serde::{Deserialize, Serialize};

use crate::model::Exercise;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExerciseResponse {
    pub exercise_id: i64,
}

/// Filters for listing a user's exercises. Each present filter narrows the
/// result further
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLogQuery {
    pub user_id: i64,
    /// Inclusive lower bound on `date`
    pub from: Option<String>,
    /// Inclusive upper bound on `date`
    pub to: Option<String>,
    /// Upper bound on `duration`
    pub limit: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLog {
    /// Echoes the requested user id
    pub user_id: String,
    pub exercises: Vec<Exercise>,
}
