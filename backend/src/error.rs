use std::fmt;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use zilk_shared::constants::{MISSING_DEVICE_ID_ERROR, NO_SPINS_LEFT_ERROR};
use zilk_shared::prize_wheel::WheelError;
use zilk_shared::spin_allowance::SpinError;

#[derive(Debug)]
pub enum AppError {
    Database(sqlx::Error),
    Redis(redis::RedisError),
    Wheel(WheelError),
    NotFound(&'static str),
    BadRequest(String),
    MissingDeviceId,
    NoSpinsRemaining { retry_after_secs: Option<i64> },
    Spin(SpinError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database(e) => write!(f, "Database error: {}", e),
            Self::Redis(e) => write!(f, "Redis error: {}", e),
            Self::Wheel(e) => write!(f, "Wheel error: {}", e),
            Self::NotFound(what) => write!(f, "{} not found", what),
            Self::BadRequest(msg) => f.write_str(msg),
            Self::MissingDeviceId => f.write_str(MISSING_DEVICE_ID_ERROR),
            Self::NoSpinsRemaining { .. } => f.write_str(NO_SPINS_LEFT_ERROR),
            Self::Spin(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database(e) => Some(e),
            Self::Redis(e) => Some(e),
            Self::Wheel(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        Self::Redis(err)
    }
}

impl From<SpinError> for AppError {
    fn from(err: SpinError) -> Self {
        match err {
            SpinError::NoSpinsRemaining { .. } => Self::NoSpinsRemaining { retry_after_secs: None },
            other => Self::Spin(other),
        }
    }
}

// Keep axum's own extractor failures on the JSON error contract
impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<WheelError> for AppError {
    fn from(err: WheelError) -> Self {
        Self::Wheel(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Database(_) | Self::Redis(_) | Self::Wheel(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::MissingDeviceId => StatusCode::BAD_REQUEST,
            Self::NoSpinsRemaining { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Spin(SpinError::PhoneAlreadyUsed | SpinError::BonusAlreadyClaimed) => StatusCode::CONFLICT,
            Self::Spin(SpinError::NoSpinsRemaining { .. }) => StatusCode::TOO_MANY_REQUESTS,
            Self::Spin(SpinError::InvalidPhoneNumber | SpinError::SpinStillAvailable) => StatusCode::BAD_REQUEST,
        };

        // Storage details stay in the logs
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("{}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();

        if let Self::NoSpinsRemaining { retry_after_secs: Some(secs) } = self {
            if let Ok(value) = HeaderValue::from_str(&secs.max(0).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}
