//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request was missing a field or a field had an invalid value.
    ///
    /// The string describes which field was invalid and why. It is shown to
    /// the client, so it must not contain internal details.
    #[error("{0}")]
    Validation(String),

    /// The request did not carry a valid auth token, or the token expired.
    #[error("the request is not authenticated")]
    Unauthorized,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource belongs to them.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Moving money into a goal would make the user's balance negative.
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Moving money out of a goal would make the goal's amount negative.
    #[error("cannot remove more money than is currently in the goal")]
    InvalidWithdrawal,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl Error {
    /// The status code and stable machine readable code sent to the client.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Error::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Error::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Error::InsufficientBalance => (StatusCode::CONFLICT, "INSUFFICIENT_BALANCE"),
            Error::InvalidWithdrawal => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_WITHDRAWAL"),
            Error::SqlError(_) | Error::DatabaseLockError | Error::InvalidTimezone(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR")
            }
        }
    }
}

const SERVER_ERROR_MESSAGE: &str =
    "An unexpected error occurred, check the server logs for more details.";

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status_code, code) = self.status_and_code();

        // Server side errors are not intended to be shown to the client.
        let message = match self {
            // Already logged when converted from the rusqlite error.
            Error::SqlError(_) => SERVER_ERROR_MESSAGE.to_owned(),
            Error::DatabaseLockError | Error::InvalidTimezone(_) => {
                tracing::error!("An unexpected error occurred: {}", self);
                SERVER_ERROR_MESSAGE.to_owned()
            }
            error => error.to_string(),
        };

        (status_code, Json(json!({ "error": message, "code": code }))).into_response()
    }
}
