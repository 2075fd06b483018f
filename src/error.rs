use crate::response::{status_code, ApiError};
use actix_web::{http::header, http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(DatabaseError::from(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = ApiError {
            status_code: self.api_status_code(),
            message: self.public_message(),
            data: None,
        };

        let mut builder = HttpResponse::build(status);
        if let Some(challenge) = self.challenge() {
            builder.insert_header((header::WWW_AUTHENTICATE, challenge));
        }
        builder.json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthError(e) => match e {
                AuthError::InvalidToken | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::DatabaseError(DatabaseError::NotFound) => StatusCode::NOT_FOUND,
            AppError::DatabaseError(DatabaseError::Duplicate) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    /// Machine-readable status code carried in the response envelope.
    fn api_status_code(&self) -> &'static str {
        match self {
            AppError::AuthError(AuthError::InvalidCredentials) => {
                status_code::USER_OR_PASSWORD_INVALID
            }
            AppError::AuthError(AuthError::Signing(_)) => status_code::INTERNAL_SERVER_ERROR,
            AppError::AuthError(_) => status_code::UNAUTHORIZED,
            AppError::ValidationError(_) => status_code::VALIDATION_FAILED,
            AppError::DatabaseError(DatabaseError::NotFound) => status_code::NOT_FOUND,
            AppError::DatabaseError(DatabaseError::Duplicate) => status_code::DUPLICATE,
            _ => status_code::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to clients. Authentication failures collapse to
    /// a uniform message; the internal distinction stays in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::AuthError(e) => match e {
                AuthError::InvalidToken | AuthError::TokenExpired => "Invalid token".into(),
                AuthError::InvalidCredentials => "Invalid username or password".into(),
                AuthError::Signing(_) => "Internal server error".into(),
            },
            AppError::DatabaseError(DatabaseError::NotFound) => "Record not found".into(),
            AppError::DatabaseError(DatabaseError::Duplicate) => "Record already exists".into(),
            AppError::DatabaseError(_) | AppError::ConfigError(_) | AppError::InternalError(_) => {
                "Internal server error".into()
            }
            AppError::ValidationError(msg) => msg.clone(),
        }
    }

    /// `WWW-Authenticate` challenge written alongside 401 rejections.
    fn challenge(&self) -> Option<&'static str> {
        match self {
            AppError::AuthError(AuthError::InvalidToken)
            | AppError::AuthError(AuthError::TokenExpired) => Some("Bearer"),
            AppError::AuthError(AuthError::InvalidCredentials) => Some("Basic realm=\"bookshelf\""),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Signing key missing or unusable: {0}")]
    Signing(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid credentials")]
    InvalidCredentials,
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Record not found")]
    NotFound,

    #[error("Duplicate record")]
    Duplicate,

    #[error("No active transaction in scope")]
    NoActiveTransaction,
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound,
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                DatabaseError::Duplicate
            }
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                DatabaseError::ConnectionError(err.to_string())
            }
            _ => DatabaseError::QueryError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::InternalError(_)));

        let config_err = config::ConfigError::NotFound(String::from("key not found"));
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::ConfigError(_)));

        let db_err = sqlx::Error::RowNotFound;
        let app_err: AppError = db_err.into();
        assert!(matches!(
            app_err,
            AppError::DatabaseError(DatabaseError::NotFound)
        ));
    }

    #[test]
    fn test_error_status_codes() {
        let err = AppError::AuthError(AuthError::InvalidCredentials);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = AppError::AuthError(AuthError::TokenExpired);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err = AppError::AuthError(AuthError::Signing("no key".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = AppError::DatabaseError(DatabaseError::NoActiveTransaction);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = AppError::DatabaseError(DatabaseError::Duplicate);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err = AppError::ValidationError("invalid input".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_uniform_auth_message() {
        // Expired and malformed tokens must be indistinguishable externally.
        let expired = AppError::AuthError(AuthError::TokenExpired);
        let invalid = AppError::AuthError(AuthError::InvalidToken);
        assert_eq!(expired.public_message(), invalid.public_message());
        assert_eq!(expired.challenge(), Some("Bearer"));
        assert_eq!(invalid.challenge(), Some("Bearer"));
    }

    #[test]
    fn test_basic_challenge() {
        let err = AppError::AuthError(AuthError::InvalidCredentials);
        assert_eq!(err.challenge(), Some("Basic realm=\"bookshelf\""));
        assert_eq!(err.public_message(), "Invalid username or password");
    }
}
