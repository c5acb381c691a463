use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::reject::{self, LengthRequired, MethodNotAllowed, PayloadTooLarge, UnsupportedMediaType};
use warp::{Rejection, Reply};

pub async fn recover_error(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if let Some(code) = err.find::<ApiErrorCode>() {
        (code.status(), code.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found".to_string())
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("Invalid body: {e}"))
    } else if err.find::<PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large".to_string())
    } else if err.find::<LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Content-Length required".to_string())
    } else if err.find::<UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected application/json".to_string(),
        )
    } else if err.find::<MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        warn!("unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Unhandled error: {:?}", err),
        )
    };

    let json = warp::reply::json(&ApiError { error: message });
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Debug, Clone, Error)]
pub enum ApiErrorCode {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiErrorCode::NotFound(_) => StatusCode::NOT_FOUND,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn classify<E: std::fmt::Display>(kind: ErrorKind, error: E) -> ApiErrorCode {
        match kind {
            // conflicts surface as 400 like validation failures
            ErrorKind::Validation | ErrorKind::Conflict => {
                ApiErrorCode::BadRequest(error.to_string())
            }
            ErrorKind::NotFound => ApiErrorCode::NotFound(error.to_string()),
            ErrorKind::Internal => ApiErrorCode::internal(error),
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<UserError> for ApiErrorCode {
    fn from(error: UserError) -> Self {
        ApiErrorCode::classify(error.kind(), error)
    }
}

impl From<RelationError> for ApiErrorCode {
    fn from(error: RelationError) -> Self {
        ApiErrorCode::classify(error.kind(), error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::UserId;

    #[test]
    fn relation_errors_map_to_statuses() {
        let cases = [
            (RelationError::MissingUserId, StatusCode::BAD_REQUEST),
            (RelationError::AlreadySent, StatusCode::BAD_REQUEST),
            (RelationError::NotFriends, StatusCode::BAD_REQUEST),
            (RelationError::UserNotFound(UserId(1)), StatusCode::NOT_FOUND),
            (
                RelationError::Store("down".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiErrorCode::from(error).status(), status);
        }
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let code = ApiErrorCode::from(UserError::Store("password=hunter2".into()));
        assert_eq!(code.to_string(), "Internal error");
    }
}
