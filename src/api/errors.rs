use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::debug;

use super::dto::ErrorResponse;
use crate::home::{StoreError, ValidationError};

const VALID_FIELDS: &str =
    "'name', 'currentTemp', 'mode', 'coolSetPoint', 'heatSetPoint', or 'fan'";

/// Every way a request can fail. Rendered as `{code, message, description}`
/// with the matching status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid identifier provided")]
    InvalidIdentifier(String),

    #[error("Not Found")]
    NotFound(#[from] StoreError),

    #[error("Not Found")]
    NoThermostats,

    #[error("Not Found")]
    EmptyField(String),

    #[error("Invalid JSON body provided")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid Property")]
    InvalidProperty(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) | ApiError::NoThermostats | ApiError::EmptyField(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::InvalidIdentifier(_)
            | ApiError::InvalidJson(_)
            | ApiError::InvalidProperty(_)
            | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn description(&self) -> String {
        match self {
            ApiError::InvalidIdentifier(raw) => {
                format!("The identifier {raw:?} is not a valid thermostat id.")
            }
            ApiError::NotFound(e) => e.to_string(),
            ApiError::NoThermostats => "No thermostats were found.".to_owned(),
            ApiError::EmptyField(field) => {
                format!("No field '{field}' exists for requested thermostat.")
            }
            ApiError::InvalidJson(e) => e.to_string(),
            ApiError::InvalidProperty(_) => format!(
                "The property provided is not a valid property of a thermostat. \
                 Valid choices are: {VALID_FIELDS}."
            ),
            ApiError::Validation(e) => e.description(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        debug!(status = status.as_u16(), error = %self, "Request rejected");

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            message: self.to_string(),
            description: self.description(),
        });
        (status, body).into_response()
    }
}
