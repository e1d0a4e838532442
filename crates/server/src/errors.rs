use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::api::{
    error::{ErrorBody, Nothing, ValidationErrors},
    response_errors::{AddExerciseError, ExerciseLogError, RegisterError},
};
use tracing::{error, info};

use crate::db::StorageError;

/// Every way a request can fail. Malformed input is a 422, anything that
/// happens after validation is reported as a 200 with an `{"error": ..}` body
pub enum ServerError<T> {
    /// Input failed validation, storage was never touched
    Validation { errors: ValidationErrors },
    /// A business rule rejected the request
    Inner { inner: T },
    Storage { inner: StorageError },
}

impl<T> ServerError<T> {
    pub fn code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Inner { .. } | Self::Storage { .. } => StatusCode::OK,
        }
    }
}

impl<T: fmt::Display> fmt::Display for ServerError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { errors } => write!(f, "{errors}"),
            Self::Inner { inner } => write!(f, "{inner}"),
            Self::Storage { inner } => write!(f, "{inner}"),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ServerError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { errors } => write!(f, "ServerError::Validation {errors:?}"),
            Self::Inner { inner } => write!(f, "ServerError::Inner {inner:?}"),
            Self::Storage { inner } => write!(f, "ServerError::Storage {inner:?}"),
        }
    }
}

impl<T: fmt::Display> IntoResponse for ServerError<T> {
    fn into_response(self) -> Response {
        let code = self.code();
        match self {
            Self::Validation { errors } => {
                info!(%errors, "Rejected request");
                (code, Json(errors)).into_response()
            },
            Self::Inner { inner } => {
                info!(%inner, "Request refused");
                (code, Json(ErrorBody { error: inner.to_string() })).into_response()
            },
            Self::Storage { inner } => {
                error!(%inner, "Storage failure");
                (code, Json(ErrorBody { error: inner.to_string() })).into_response()
            },
        }
    }
}

impl<T> From<ValidationErrors> for ServerError<T> {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation { errors }
    }
}

impl<T> From<StorageError> for ServerError<T> {
    fn from(inner: StorageError) -> Self {
        Self::Storage { inner }
    }
}

impl<T> From<sea_query::error::Error> for ServerError<T> {
    fn from(err: sea_query::error::Error) -> Self {
        StorageError::from(err).into()
    }
}

macro_rules! domain_error {
    ($($name:ident),* $(,)?) => {
        $(
            impl From<$name> for ServerError<$name> {
                fn from(inner: $name) -> Self {
                    Self::Inner { inner }
                }
            }
        )*
    };
}

domain_error!(Nothing, RegisterError, AddExerciseError, ExerciseLogError);
