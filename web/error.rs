use axum::{
    Json,
    extract::rejection::JsonRejection,
    extract::multipart::MultipartRejection,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::IntoResponse,
};
use postcraft::app::AppError;
use serde::Serialize;
use tracing::Level;

/// Failure envelope shared by every endpoint: `{"success": false, "message": ...}`.
#[derive(Debug)]
pub enum ApiError {
    /// An operation failed; `context` prefixes the message, e.g. `Failed to generate bio`.
    App {
        context: &'static str,
        error: AppError,
    },

    BadRequest(String),

    Status(StatusCode, String),
}

impl ApiError {
    /// Returns a mapper that wraps an [`AppError`] with a message prefix.
    pub fn context(context: &'static str) -> impl Fn(AppError) -> ApiError {
        move |error| ApiError::App { context, error }
    }

    /// Returns a mapper for malformed or invalid JSON bodies.
    pub fn json(context: &'static str) -> impl Fn(JsonRejection) -> ApiError {
        move |rejection| ApiError::BadRequest(format!("{context}: {}", rejection.body_text()))
    }

    pub fn multipart(context: &'static str) -> impl Fn(MultipartRejection) -> ApiError {
        move |rejection| ApiError::BadRequest(format!("{context}: {}", rejection.body_text()))
    }

    pub fn multipart_field(context: &'static str) -> impl Fn(MultipartError) -> ApiError {
        move |error| ApiError::Status(error.status(), format!("{context}: {}", error.body_text()))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::App { error, .. } => match error {
                AppError::NotFound { .. } => StatusCode::NOT_FOUND,
                AppError::Store(_) | AppError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AppError::Validation(_)
                | AppError::Ai(_)
                | AppError::Grid(_)
                | AppError::NotAnImage => StatusCode::BAD_REQUEST,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Status(status, _) => *status,
        }
    }

    /// Upstream AI failures answer 400 but still need to be visible at the default filter.
    fn level(&self) -> Level {
        if self.status().is_server_error() {
            Level::ERROR
        } else if matches!(
            self,
            ApiError::App {
                error: AppError::Ai(_),
                ..
            }
        ) {
            Level::WARN
        } else {
            Level::DEBUG
        }
    }

    fn into_message(self) -> String {
        match self {
            ApiError::App {
                error: AppError::NotFound { .. },
                ..
            } => "Content not found".to_string(),
            ApiError::App { context, error } => format!("{context}: {error}"),
            ApiError::BadRequest(message) | ApiError::Status(_, message) => message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            success: bool,
            message: String,
        }

        let status = self.status();
        let level = self.level();
        let message = self.into_message();

        if level == Level::ERROR {
            tracing::error!(%status, %message, "request failed");
        } else if level == Level::WARN {
            tracing::warn!(%status, %message, "request failed upstream");
        } else {
            tracing::debug!(%status, %message, "request rejected");
        }

        (
            status,
            Json(ErrorResponse {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postcraft::{ai::AiError, schema::ValidationError};

    #[test]
    fn test_status_and_level() {
        let ai = ApiError::context("Failed to generate bio")(AppError::Ai(AiError::MissingApiKey));
        assert_eq!(StatusCode::BAD_REQUEST, ai.status());
        assert_eq!(Level::WARN, ai.level());
        assert!(ai.into_message().starts_with("Failed to generate bio: "));

        let invalid = ApiError::context("Failed to generate bio")(AppError::Validation(
            ValidationError::Blank {
                field: "occupation",
            },
        ));
        assert_eq!(StatusCode::BAD_REQUEST, invalid.status());
        assert_eq!(Level::DEBUG, invalid.level());

        let missing = ApiError::context("Failed to delete content")(AppError::NotFound {
            id: "abc".to_string(),
        });
        assert_eq!(StatusCode::NOT_FOUND, missing.status());
        assert_eq!("Content not found", missing.into_message());

        let failed = ApiError::Status(StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string());
        assert_eq!(Level::ERROR, failed.level());
    }
}
