//! Validated JSON extractor - Combines deserialization with validation.

use std::collections::BTreeMap;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::{Validate, ValidationErrors};

use crate::errors::AppError;

/// Validated JSON extractor that automatically validates requests.
///
/// Malformed bodies and rule violations both become a 400 validation
/// failure. Rule violations also carry `errors: { field: [messages] }`.
///
/// ```rust,ignore
/// async fn create_user(ValidatedJson(payload): ValidatedJson<CreateUser>) {
///     // payload is already validated
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_error)?;

        value.validate().map_err(validation_error)?;

        Ok(ValidatedJson(value))
    }
}

/// Prefix axum puts in front of deserialization errors.
const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// Convert a JSON rejection into a validation failure.
///
/// A value of the wrong type for a named field is reported under that
/// field; anything else keeps the rejection text as its message.
fn rejection_error(rejection: JsonRejection) -> AppError {
    let text = rejection.body_text();

    if let JsonRejection::JsonDataError(_) = rejection {
        if let Some((field, message)) = field_type_error(&text) {
            let mut fields = BTreeMap::new();
            fields.insert(field, vec![message.clone()]);
            let errors = serde_json::to_value(&fields).unwrap_or(Value::Null);
            return AppError::validation_with(message, errors);
        }
    }

    AppError::validation(text)
}

/// Split `"<field>: invalid type: ..., expected a string at line 1 column 9"`
/// into the field and a `"<field> must be a string"` message.
fn field_type_error(text: &str) -> Option<(String, String)> {
    let detail = text.strip_prefix(DATA_ERROR_PREFIX)?;
    let (field, reason) = detail.split_once(": ")?;

    let is_path = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'));
    if !is_path {
        return None;
    }

    let reason = reason.split(" at line ").next().unwrap_or(reason);
    let message = match reason.split_once("expected ") {
        Some((_, expected)) => format!("{} must be {}", field, expected),
        None => format!("{} {}", field, reason),
    };

    Some((field.to_string(), message))
}

/// Convert validator output into a validation failure, fields in name order.
fn validation_error(errors: ValidationErrors) -> AppError {
    let fields: BTreeMap<String, Vec<String>> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect();

    let message = fields
        .values()
        .flatten()
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");

    let errors = serde_json::to_value(&fields).unwrap_or(Value::Null);
    AppError::validation_with(message, errors)
}
