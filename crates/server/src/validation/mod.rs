//! Request input checks. Every failing field is reported, the request never
//! reaches storage unless all of them pass.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use shared::{
    api::{error::ValidationErrors, payloads::ExerciseLogQuery},
    model::{NewExercise, NewUser},
};

mod extract;
pub use extract::*;

pub const USERNAME_MAX_CHARS: usize = 120;

const USER_ID_MESSAGE: &str = "userId must be a number";
const DATE_MESSAGE: &str = r#"Dates must be formatted as "YYYY-MM-DD""#;
const LIMIT_MESSAGE: &str = "Duration must be a number > 0";
const USERNAME_REQUIRED_MESSAGE: &str = "Username is required";
const USERNAME_LENGTH_MESSAGE: &str = "Username too long, please write something < 120 characters";
const INVALID_VALUE_MESSAGE: &str = "Invalid value";
const DURATION_MESSAGE: &str = "Duration must be greater than 0!";
const DURATION_WHOLE_MESSAGE: &str = "Duration must be a whole number";

/// Parses the same shapes validator.js accepts as numeric: an optional sign
/// then digits with at most one decimal point. Exponents, `inf` and `NaN` are
/// rejected
pub fn parse_numeric(value: &str) -> Option<f64> {
    let unsigned = value
        .strip_prefix(|c: char| c == '+' || c == '-')
        .unwrap_or(value);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or(("", unsigned));
    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());

    if fraction.is_empty() || !digits(whole) || !digits(fraction) {
        return None;
    }

    value.parse().ok()
}

/// A numeric value with no fractional part. The digits are read as an integer
/// so large ids keep their exact value
pub fn parse_integer(value: &str) -> Option<i64> {
    parse_numeric(value)?;
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    if !fraction.chars().all(|c| c == '0') {
        return None;
    }

    match whole {
        "" | "+" | "-" => Some(0),
        whole => whole.parse().ok(),
    }
}

pub fn is_iso8601(value: &str) -> bool {
    (value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok())
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok()
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '/' => escaped.push_str("&#x2F;"),
            '\\' => escaped.push_str("&#x5C;"),
            '`' => escaped.push_str("&#96;"),
            c => escaped.push(c),
        }
    }
    escaped
}

struct Checker<'a> {
    fields: &'a Fields,
    errors: ValidationErrors,
}

impl<'a> Checker<'a> {
    fn new(fields: &'a Fields) -> Self {
        Self {
            fields,
            errors: ValidationErrors::default(),
        }
    }

    fn reject(&mut self, param: &str, value: Option<String>, msg: &str) {
        self.errors.push(self.fields.location(), param, value, msg);
    }

    /// Absent fields are rejected
    fn required<T>(&mut self, param: &str, msg: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
        let value = self.fields.text(param);
        let parsed = value.as_deref().and_then(parse);
        if parsed.is_none() {
            self.reject(param, value, msg);
        }
        parsed
    }

    /// Absent fields pass as `None`
    fn optional<T>(&mut self, param: &str, msg: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
        let value = self.fields.text(param)?;
        let parsed = parse(&value);
        if parsed.is_none() {
            self.reject(param, Some(value), msg);
        }
        parsed
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, ValidationErrors> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(self.errors),
        }
    }
}

impl FromFields for ExerciseLogQuery {
    fn from_fields(fields: &Fields) -> Result<Self, ValidationErrors> {
        let mut check = Checker::new(fields);

        let user_id = check.required("userId", USER_ID_MESSAGE, |v| {
            parse_integer(v).filter(|id| *id >= 1)
        });
        let from = check.optional("from", DATE_MESSAGE, |v| is_iso8601(v).then(|| v.to_string()));
        let to = check.optional("to", DATE_MESSAGE, |v| is_iso8601(v).then(|| v.to_string()));
        let limit = check.optional("limit", LIMIT_MESSAGE, |v| {
            parse_numeric(v).filter(|limit| *limit >= 1.0)
        });

        check.finish(user_id.map(|user_id| ExerciseLogQuery {
            user_id,
            from,
            to,
            limit,
        }))
    }
}

impl FromFields for NewUser {
    fn from_fields(fields: &Fields) -> Result<Self, ValidationErrors> {
        let mut check = Checker::new(fields);

        let username = check
            .required("username", USERNAME_REQUIRED_MESSAGE, |v| {
                (!v.trim().is_empty()).then(|| v.to_string())
            })
            .and_then(|username| {
                if username.chars().count() > USERNAME_MAX_CHARS {
                    check.reject("username", Some(username), USERNAME_LENGTH_MESSAGE);
                    None
                } else {
                    Some(username)
                }
            });

        check.finish(username.map(NewUser::new))
    }
}

impl FromFields for NewExercise {
    fn from_fields(fields: &Fields) -> Result<Self, ValidationErrors> {
        let mut check = Checker::new(fields);

        let user_id = check.required("userId", INVALID_VALUE_MESSAGE, parse_integer);
        let description = fields
            .text("description")
            .map(|v| escape_html(v.trim()))
            .unwrap_or_default();
        let duration = check
            .required("duration", DURATION_MESSAGE, |v| {
                parse_numeric(v).filter(|duration| *duration > 0.0)
            })
            .and_then(|duration| {
                if duration.fract() == 0.0 && duration < i64::MAX as f64 {
                    Some(duration as i64)
                } else {
                    check.reject("duration", fields.text("duration"), DURATION_WHOLE_MESSAGE);
                    None
                }
            });
        let date = check
            .optional("date", DATE_MESSAGE, |v| {
                let v = v.trim();
                (v.is_empty() || is_iso8601(v)).then(|| v.to_string())
            })
            .filter(|date| !date.is_empty());

        let exercise = match (user_id, duration) {
            (Some(user_id), Some(duration)) => Some(NewExercise {
                user_id,
                description,
                duration,
                date,
            }),
            _ => None,
        };
        check.finish(exercise)
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use shared::api::error::{FieldError, Location};

    use super::*;

    fn fields(location: Location, values: &[(&str, &str)]) -> Fields {
        Fields::from_strings(
            location,
            values
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        )
    }

    fn params(errors: &ValidationErrors) -> Vec<&str> {
        errors.errors.iter().map(|e| e.param.as_str()).collect()
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric("30"), Some(30.0));
        assert_eq!(parse_numeric("-5"), Some(-5.0));
        assert_eq!(parse_numeric("+2.5"), Some(2.5));
        assert_eq!(parse_numeric(".5"), Some(0.5));

        for bad in ["", ".", "5.", "1e3", "inf", "NaN", "abc", "1.2.3", " 1", "--1"] {
            assert_eq!(parse_numeric(bad), None, "{bad:?}");
        }
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("2"), Some(2));
        assert_eq!(parse_integer("2.0"), Some(2));
        assert_eq!(parse_integer("2.5"), None);
        assert_eq!(parse_integer("two"), None);
        assert_eq!(parse_integer("+4.00"), Some(4));
        assert_eq!(parse_integer("-3"), Some(-3));
    }

    #[test]
    fn test_parse_integer_keeps_large_ids_exact() {
        assert_eq!(parse_integer("9007199254740993"), Some(9_007_199_254_740_993));
        assert_eq!(parse_integer("9007199254740993.0"), Some(9_007_199_254_740_993));
        assert_eq!(parse_integer("9223372036854775807"), Some(i64::MAX));
        assert_eq!(parse_integer("9223372036854775808"), None);
    }

    #[test]
    fn test_is_iso8601() {
        assert!(is_iso8601("2024-01-01"));
        assert!(is_iso8601("2024-01-01T10:30:00"));
        assert!(is_iso8601("2024-01-01T10:30:00Z"));
        assert!(!is_iso8601("2024-1-1"));
        assert!(!is_iso8601("01/01/2024"));
        assert!(!is_iso8601("2024-13-01"));
        assert!(!is_iso8601(""));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#x27;Jerry&#x27;&lt;&#x2F;b&gt;"
        );
        assert_eq!(escape_html("plain run"), "plain run");
    }

    #[test]
    fn test_log_query_all_filters() {
        let query = ExerciseLogQuery::from_fields(&fields(
            Location::Query,
            &[("userId", "2"), ("from", "2024-01-01"), ("to", "2024-02-01"), ("limit", "45")],
        ))
        .unwrap();

        assert_eq!(
            query,
            ExerciseLogQuery {
                user_id: 2,
                from: Some("2024-01-01".into()),
                to: Some("2024-02-01".into()),
                limit: Some(45.0),
            }
        );
    }

    #[test]
    fn test_log_query_user_id_zero_is_rejected() {
        let errors =
            ExerciseLogQuery::from_fields(&fields(Location::Query, &[("userId", "0")])).unwrap_err();

        assert_eq!(
            errors.errors,
            vec![FieldError {
                location: Location::Query,
                param: "userId".into(),
                value: Some("0".into()),
                msg: USER_ID_MESSAGE.into(),
            }]
        );
    }

    #[test]
    fn test_log_query_reports_every_bad_field() {
        let errors = ExerciseLogQuery::from_fields(&fields(
            Location::Query,
            &[("from", "yesterday"), ("to", "2024-01-01"), ("limit", "0")],
        ))
        .unwrap_err();

        assert_eq!(params(&errors), vec!["userId", "from", "limit"]);
        // Missing fields have no value to echo
        assert_eq!(errors.errors[0].value, None);
    }

    #[test]
    fn test_new_user() {
        let user = NewUser::from_fields(&fields(Location::Body, &[("username", "alice")])).unwrap();
        assert_eq!(user, NewUser::new("alice"));
    }

    #[test]
    fn test_new_user_length_limit() {
        let max = "a".repeat(USERNAME_MAX_CHARS);
        assert!(NewUser::from_fields(&fields(Location::Body, &[("username", &max)])).is_ok());

        let too_long = "a".repeat(USERNAME_MAX_CHARS + 1);
        let errors =
            NewUser::from_fields(&fields(Location::Body, &[("username", &too_long)])).unwrap_err();
        assert_eq!(errors.errors[0].msg, USERNAME_LENGTH_MESSAGE);
        assert_eq!(errors.errors[0].location, Location::Body);
    }

    #[test]
    fn test_new_user_required() {
        for values in [vec![], vec![("username", "  ")]] {
            let errors = NewUser::from_fields(&fields(Location::Body, &values)).unwrap_err();
            assert_eq!(errors.errors[0].msg, USERNAME_REQUIRED_MESSAGE);
        }
    }

    #[test]
    fn test_new_exercise_sanitizes_description() {
        let exercise = NewExercise::from_fields(&fields(
            Location::Body,
            &[
                ("userId", "2"),
                ("description", "  <i>run</i>  "),
                ("duration", "30"),
                ("date", "2024-01-01"),
            ],
        ))
        .unwrap();

        assert_eq!(
            exercise,
            NewExercise {
                user_id: 2,
                description: "&lt;i&gt;run&lt;&#x2F;i&gt;".into(),
                duration: 30,
                date: Some("2024-01-01".into()),
            }
        );
    }

    #[test]
    fn test_new_exercise_defaults() {
        let exercise = NewExercise::from_fields(&fields(
            Location::Body,
            &[("userId", "1"), ("duration", "10"), ("date", "")],
        ))
        .unwrap();

        assert_eq!(exercise.description, "");
        assert_eq!(exercise.date, None);
    }

    #[test]
    fn test_new_exercise_negative_duration_is_rejected() {
        let errors = NewExercise::from_fields(&fields(
            Location::Body,
            &[("userId", "1"), ("duration", "-5")],
        ))
        .unwrap_err();

        assert_eq!(params(&errors), vec!["duration"]);
        assert_eq!(errors.errors[0].msg, DURATION_MESSAGE);
    }

    #[test]
    fn test_new_exercise_fractional_duration_is_rejected() {
        let errors = NewExercise::from_fields(&fields(
            Location::Body,
            &[("userId", "1"), ("duration", "2.5")],
        ))
        .unwrap_err();

        assert_eq!(errors.errors[0].msg, DURATION_WHOLE_MESSAGE);
    }

    #[test]
    fn test_new_exercise_bad_user_id_and_date() {
        let errors = NewExercise::from_fields(&fields(
            Location::Body,
            &[("userId", "abc"), ("duration", "5"), ("date", "soon")],
        ))
        .unwrap_err();

        assert_eq!(params(&errors), vec!["userId", "date"]);
        assert_eq!(errors.errors[0].msg, INVALID_VALUE_MESSAGE);
    }

    #[test]
    fn test_json_numbers_are_read_as_text() {
        let values = serde_json::json!({ "userId": 2, "duration": 30, "description": null });
        let fields = Fields::new(Location::Body, values.as_object().unwrap().clone());

        let exercise = NewExercise::from_fields(&fields).unwrap();
        assert_eq!(exercise.user_id, 2);
        assert_eq!(exercise.duration, 30);
        assert_eq!(exercise.description, "");
    }
}
