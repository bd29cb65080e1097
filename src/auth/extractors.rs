use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use mongodb::bson::oid::ObjectId;
use tracing::warn;

use crate::{auth::jwt::JwtKeys, error::ApiError};

/// Identity attached to the request by the bearer-token gate.
///
/// Handlers take this as an argument; a request that fails the gate never
/// reaches the handler. Rejections reply with the `{success, message}`
/// envelope on a default 200 status, matching the API contract.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: ObjectId,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Auth("No token provided".to_string()))?;

        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "token verification failed");
            ApiError::Auth(e.to_string())
        })?;

        let id = ObjectId::parse_str(&claims.sub).map_err(|e| {
            warn!(error = %e, "malformed user id in token");
            ApiError::Auth(e.to_string())
        })?;

        Ok(AuthUser {
            id,
            email: claims.email,
        })
    }
}
