use std::collections::HashMap;

use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::FormRejection, FromRequest, FromRequestParts, Query, Request},
    http::{header::CONTENT_TYPE, request::Parts},
    response::{IntoResponse, Response},
    Form,
};
use serde_json::{Map, Value};
use shared::api::error::{Location, Nothing, ValidationErrors};

use crate::ServerError;

/// Raw request fields, before any validation. Values keep whatever JSON type
/// they arrived with, form and query values are always strings
#[derive(Debug, Clone)]
pub struct Fields {
    location: Location,
    values: Map<String, Value>,
}

impl Fields {
    pub fn new(location: Location, values: Map<String, Value>) -> Self {
        Self { location, values }
    }

    pub fn from_strings(location: Location, values: HashMap<String, String>) -> Self {
        Self::new(
            location,
            values
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect(),
        )
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// The field rendered as text. `None` when absent or null
    pub fn text(&self, name: &str) -> Option<String> {
        match self.values.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Builds a value out of unvalidated request fields, reporting every bad field
pub trait FromFields: Sized {
    fn from_fields(fields: &Fields) -> Result<Self, ValidationErrors>;
}

fn reject(errors: ValidationErrors) -> Response {
    ServerError::<Nothing>::from(errors).into_response()
}

fn validated<T: FromFields>(fields: Fields) -> Result<T, Response> {
    T::from_fields(&fields).map_err(reject)
}

/// Query string parameters that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: FromFields + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(values) = Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        validated(Fields::from_strings(Location::Query, values)).map(ValidatedQuery)
    }
}

/// Request body that passed validation. Accepts url encoded forms and JSON.
/// A body of any other type, or none at all, is read as having no fields
#[derive(Debug, Clone)]
pub struct ValidatedForm<T>(pub T);

const BODY_PARAM: &str = "body";
const JSON_OBJECT_MESSAGE: &str = "Body must be a JSON object";
const FORM_MESSAGE: &str = "Body must be a url encoded form";

#[derive(Debug, Clone, Copy, PartialEq)]
enum BodyKind {
    Json,
    Form,
    Other,
}

fn body_kind(req: &Request) -> BodyKind {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<mime::Mime>().ok());

    match content_type {
        Some(m) if m.essence_str() == mime::APPLICATION_JSON.essence_str() => BodyKind::Json,
        Some(m) if m.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() => {
            BodyKind::Form
        },
        _ => BodyKind::Other,
    }
}

fn body_error(value: Option<String>, msg: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    errors.push(Location::Body, BODY_PARAM, value, msg);
    errors
}

/// Reads a JSON body into fields. An empty body has no fields, anything but an
/// object is rejected
fn json_fields(bytes: &[u8]) -> Result<Fields, ValidationErrors> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Fields::new(Location::Body, Map::new()));
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(values)) => Ok(Fields::new(Location::Body, values)),
        Ok(other) => Err(body_error(Some(other.to_string()), JSON_OBJECT_MESSAGE)),
        Err(_) => Err(body_error(
            Some(String::from_utf8_lossy(bytes).into_owned()),
            JSON_OBJECT_MESSAGE,
        )),
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedForm<T>
where
    T: FromFields + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let fields = match body_kind(&req) {
            BodyKind::Json => {
                let bytes = Bytes::from_request(req, state)
                    .await
                    .map_err(IntoResponse::into_response)?;
                json_fields(&bytes).map_err(reject)?
            },
            BodyKind::Form => {
                let Form(values) = Form::<HashMap<String, String>>::from_request(req, state)
                    .await
                    .map_err(|e| match e {
                        FormRejection::FailedToDeserializeForm(_)
                        | FormRejection::FailedToDeserializeFormBody(_) => {
                            reject(body_error(None, FORM_MESSAGE))
                        },
                        other => other.into_response(),
                    })?;
                Fields::from_strings(Location::Body, values)
            },
            BodyKind::Other => Fields::new(Location::Body, Map::new()),
        };

        validated(fields).map(ValidatedForm)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_json_object_becomes_fields() {
        let fields = json_fields(br#"{"username": "alice", "userId": 2}"#).unwrap();

        assert_eq!(fields.text("username").as_deref(), Some("alice"));
        assert_eq!(fields.text("userId").as_deref(), Some("2"));
        assert_eq!(fields.location(), Location::Body);
    }

    #[test]
    fn test_empty_json_body_has_no_fields() {
        let fields = json_fields(b"  ").unwrap();

        assert_eq!(fields.text("username"), None);
    }

    #[test]
    fn test_json_that_is_not_an_object_is_rejected() {
        let bodies: [&[u8]; 4] = [b"[1]", b"\"4\"", b"{\"username\":", b"null"];
        for body in bodies {
            let errors = json_fields(body).unwrap_err();

            assert_eq!(errors.errors.len(), 1);
            assert_eq!(errors.errors[0].param, BODY_PARAM);
            assert_eq!(errors.errors[0].location, Location::Body);
            assert_eq!(errors.errors[0].msg, JSON_OBJECT_MESSAGE);
        }
    }
}
