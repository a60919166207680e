use super::error::*;
use crate::application_port::*;
use crate::domain_model::Identity;
use crate::settings::Api;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Longest identity any store backend keeps; matches `refresh_session.identity`.
pub const MAX_IDENTITY_CHARS: usize = 255;

/// Caller-side identity policy; the token engine itself accepts any string.
/// The identity is opaque and stored exactly as sent.
fn admit_identity(raw: &str, api: &Api) -> Result<Identity, ApiErrorCode> {
    if raw.trim().is_empty() || raw.chars().count() > MAX_IDENTITY_CHARS {
        return Err(ApiErrorCode::InvalidIdentity);
    }
    if api.require_uuid_identity && uuid::Uuid::parse_str(raw).is_err() {
        return Err(ApiErrorCode::InvalidIdentity);
    }
    Ok(Identity::from(raw))
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub id: String,
}

pub async fn generate(
    body: GenerateRequest,
    token_service: Arc<dyn TokenService>,
    api: Api,
    cancel: CancellationToken,
) -> Result<impl warp::Reply, warp::Rejection> {
    let identity = admit_identity(&body.id, &api).map_err(reject::custom)?;

    let pair = token_service
        .issue(&identity, &cancel)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(pair)))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

pub async fn refresh(
    body: RefreshRequest,
    token_service: Arc<dyn TokenService>,
    api: Api,
    cancel: CancellationToken,
) -> Result<impl warp::Reply, warp::Rejection> {
    if body.refresh_token.is_empty() {
        return Err(reject::custom(ApiErrorCode::InvalidRequest));
    }

    let result = if api.bind_access_token {
        let access_token = body
            .access_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| reject::custom(ApiErrorCode::InvalidRequest))?;
        token_service
            .rotate_bound(access_token, &body.refresh_token, &cancel)
            .await
    } else {
        token_service.rotate(&body.refresh_token, &cancel).await
    };
    let pair = result
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(pair)))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub id: Identity,
    pub expires_at: DateTime<Utc>,
}

pub async fn verify(
    body: VerifyRequest,
    token_service: Arc<dyn TokenService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let grant = token_service
        .verify_access(&body.access_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response = VerifyResponse {
        id: grant.identity,
        expires_at: grant.expires_at,
    };
    Ok(warp::reply::json(&ApiResponse::ok(response)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_identity_is_rejected() {
        assert_eq!(
            admit_identity("   ", &Api::default()),
            Err(ApiErrorCode::InvalidIdentity)
        );
    }

    #[test]
    fn surrounding_whitespace_is_kept() {
        assert_eq!(
            admit_identity(" u1", &Api::default()),
            Ok(Identity::from(" u1"))
        );
        assert_ne!(
            admit_identity(" u1", &Api::default()),
            admit_identity("u1", &Api::default())
        );
    }

    #[test]
    fn overlong_identity_is_rejected() {
        let longest = "é".repeat(MAX_IDENTITY_CHARS);
        assert!(admit_identity(&longest, &Api::default()).is_ok());

        let too_long = "é".repeat(MAX_IDENTITY_CHARS + 1);
        assert_eq!(
            admit_identity(&too_long, &Api::default()),
            Err(ApiErrorCode::InvalidIdentity)
        );
    }

    #[test]
    fn any_identity_is_admitted_by_default() {
        assert_eq!(
            admit_identity("user@example.com", &Api::default()),
            Ok(Identity::from("user@example.com"))
        );
    }

    #[test]
    fn uuid_policy_rejects_other_formats() {
        let api = Api {
            require_uuid_identity: true,
            ..Api::default()
        };
        assert_eq!(
            admit_identity("non-uuid-string", &api),
            Err(ApiErrorCode::InvalidIdentity)
        );
        assert!(admit_identity("6ba7b810-9dad-11d1-80b4-00c04fd430c8", &api).is_ok());
    }
}
