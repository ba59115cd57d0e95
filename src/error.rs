//! Error handler for accounts.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sqlx::{Error as SQLxError, postgres::PgDatabaseError};
use thiserror::Error;
use validator::ValidationErrors;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Message shown to clients on any 5xx response.
pub const MESSAGE_500: &str =
    "An error occurred. Please try again OR contact dev team.";

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Json(#[from] JsonRejection),

    #[error(transparent)]
    Query(#[from] QueryRejection),

    #[error("SQL request failed: {0}")]
    Sql(#[from] SQLxError),

    #[error("Customer already registered with given mobile number {mobile_number}")]
    CustomerAlreadyExists { mobile_number: String },

    #[error("{resource} not found with the given input data {field} : '{value}'")]
    ResourceNotFound {
        resource: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("data integrity violation, {details}")]
    IntegrityViolation { details: String },

    #[error("account number {account_number} is already taken")]
    AccountNumberTaken { account_number: i64 },

    #[error("internal server error, {details}")]
    Internal {
        details: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ServerError {
    /// HTTP status sent back for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Validation(_)
            | ServerError::Json(_)
            | ServerError::Query(_)
            | ServerError::CustomerAlreadyExists { .. } => {
                StatusCode::BAD_REQUEST
            },
            ServerError::Sql(_)
            | ServerError::ResourceNotFound { .. }
            | ServerError::IntegrityViolation { .. }
            | ServerError::AccountNumberTaken { .. }
            | ServerError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }
}

/// Structure for detailed error responses.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    title: String,
    status: u16,
    detail: String,
    errors: Option<Vec<FieldError>>,
    timestamp: chrono::DateTime<chrono::Utc>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `title` field.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    /// Add detailed error.
    pub fn details(mut self, description: &str) -> Self {
        self.detail = description.into();
        self
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = Some(parse_validation_errors(errors));
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(
        self,
    ) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            title: "Internal server error.".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            detail: MESSAGE_500.to_owned(),
            errors: None,
            timestamp: chrono::Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: String,
    message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| issue.code.to_string()),
            })
        })
        .collect()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let response = if status.is_server_error() {
            match &self {
                ServerError::IntegrityViolation { details } => {
                    tracing::error!(%details, "accounts data integrity violated");
                },
                ServerError::Internal { details, source } => {
                    tracing::error!(err = ?source, %details, "server returned 500 status");
                },
                ServerError::Sql(err) => {
                    let detail = err
                        .as_database_error()
                        .and_then(|e| e.try_downcast_ref::<PgDatabaseError>())
                        .and_then(|e| e.detail())
                        .unwrap_or_default();
                    tracing::error!(error = %err, %detail, "database request failed");
                },
                err => tracing::warn!(error = %err, "request failed"),
            }

            ResponseError::default()
        } else {
            let response = ResponseError::default()
                .title("There were validation errors with your request.")
                .details(&self.to_string())
                .status(status);

            match &self {
                ServerError::Validation(validation_errors) => {
                    response.errors(validation_errors)
                },
                ServerError::CustomerAlreadyExists { .. } => {
                    response.title("Customer already exists.")
                },
                _ => response,
            }
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "title": "Internal server error.",
                "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "detail": MESSAGE_500,
                "errors": null,
                "timestamp": null,
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServerError::CustomerAlreadyExists {
                mobile_number: "9876543210".into()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::ResourceNotFound {
                resource: "Customer",
                field: "mobileNumber",
                value: "9876543210".into(),
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServerError::IntegrityViolation {
                details: "missing account".into()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = ServerError::ResourceNotFound {
            resource: "Customer",
            field: "mobileNumber",
            value: "1234567890".into(),
        };
        assert_eq!(
            err.to_string(),
            "Customer not found with the given input data mobileNumber : '1234567890'"
        );
    }

    #[test]
    fn test_validation_errors_are_listed() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "mobile_number",
            ValidationError::new("pattern")
                .with_message("Invalid mobile number".into()),
        );

        let fields = parse_validation_errors(&errors);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "mobile_number");
        assert_eq!(fields[0].message, "Invalid mobile number");

        let response = ServerError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
