use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder for routes that have no domain level failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Nothing {}

impl std::error::Error for Nothing {}

impl fmt::Display for Nothing {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Query,
    Body,
}

/// A single rejected input field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub location: Location,
    pub param: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub msg: String,
}

/// Body of a 422 response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn push<P, M>(&mut self, location: Location, param: P, value: Option<String>, msg: M)
    where
        P: Into<String>,
        M: Into<String>,
    {
        self.errors.push(FieldError {
            location,
            param: param.into(),
            value,
            msg: msg.into(),
        });
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .errors
            .iter()
            .map(|e| e.param.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "Invalid fields: {params}")
    }
}

/// Body returned when a request was understood but rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
