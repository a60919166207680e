use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{error, warn};
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let code = if let Some(code) = err.find::<ApiErrorCode>() {
        code.clone()
    } else if err.find::<BodyDeserializeError>().is_some()
        || err.find::<reject::UnsupportedMediaType>().is_some()
        || err.find::<reject::PayloadTooLarge>().is_some()
        || err.find::<reject::LengthRequired>().is_some()
    {
        ApiErrorCode::InvalidRequest
    } else if err.is_not_found() {
        ApiErrorCode::NotFound
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiErrorCode::MethodNotAllowed
    } else {
        warn!("Unhandled rejection: {:?}", err);
        ApiErrorCode::InternalError
    };

    let json = warp::reply::json(&ApiResponse::<()>::err(code.clone(), code.to_string()));
    Ok(warp::reply::with_status(json, code.status()))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Request body is invalid")]
    InvalidRequest,
    #[error("User id is required and must be well formed")]
    InvalidIdentity,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Token has been expired")]
    TokenExpired,
    #[error("Permission denied")]
    PermissionDenied,
    #[error("Session not found")]
    SessionNotFound,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal server error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        error!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidRequest
            | ApiErrorCode::InvalidIdentity
            | ApiErrorCode::InvalidToken => StatusCode::BAD_REQUEST,
            ApiErrorCode::TokenExpired | ApiErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
            ApiErrorCode::SessionNotFound | ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<TokenError> for ApiErrorCode {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::IncorrectToken => ApiErrorCode::InvalidToken,
            TokenError::Expired => ApiErrorCode::TokenExpired,
            TokenError::NotFound => ApiErrorCode::SessionNotFound,
            TokenError::PermissionDenied => ApiErrorCode::PermissionDenied,
            e @ (TokenError::Store(_)
            | TokenError::Hash(_)
            | TokenError::Internal(_)
            | TokenError::Cancelled) => ApiErrorCode::internal(e),
        }
    }
}
