use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::config::PROBLEM_TYPE_DEFAULT;
use crate::errors::Failure;

/// Problem details document returned for every failed request
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemResponse {
    #[serde(rename = "type")]
    #[schema(example = "about:blank")]
    pub problem_type: String,
    #[schema(example = "Not Found")]
    pub title: String,
    #[schema(example = 404)]
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Usuário com ID 550e8400-e29b-41d4-a716-446655440000 não encontrado")]
    pub detail: Option<String>,
    #[schema(example = "/users/550e8400-e29b-41d4-a716-446655440000")]
    pub instance: String,
    #[schema(example = "0b6f7a52-51b3-4f1e-9e1c-3f1b2d0c8a11")]
    pub correlation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub errors: Option<Value>,
}

impl ProblemResponse {
    pub fn new(failure: &Failure, instance: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self {
            problem_type: PROBLEM_TYPE_DEFAULT.to_string(),
            title: failure.title().to_string(),
            status: failure.status().as_u16(),
            detail: failure.detail().map(str::to_string),
            instance: instance.into(),
            correlation_id: correlation_id.into(),
            errors: failure.errors().cloned(),
        }
    }
}
