use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::application::token_service::TokenService;
use crate::errors::AppError;

/// The caller identified by a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
}

/// Extracts `<token>` from `Authorization: Bearer <token>`; the scheme is
/// matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or("authorization header missing")?
        .to_str()
        .map_err(|_| "authorization header is not valid text")?;
    let (scheme, token) = value
        .split_once(' ')
        .ok_or("authorization header must be Bearer <token>")?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err("authorization header must be Bearer <token>");
    }
    let token = token.trim();
    if token.is_empty() {
        return Err("empty bearer token");
    }
    Ok(token)
}

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenService>::from_ref(state);

        let token = bearer_token(&parts.headers).map_err(|reason| {
            tracing::warn!(reason, "auth: missing or invalid authorization header");
            AppError::Unauthenticated
        })?;

        let payload = tokens.parse(token).map_err(|e| {
            tracing::warn!(error = %e, "auth: token parse failed");
            AppError::Unauthenticated
        })?;

        let user_id = payload
            .aud
            .parse::<u64>()
            .ok()
            .filter(|id| *id != 0)
            .ok_or_else(|| {
                tracing::warn!("auth: token audience is not a user id");
                AppError::Unauthenticated
            })?;

        Ok(AuthUser {
            user_id,
            username: payload.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn accepts_bearer_in_any_case() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(&headers("bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(&headers("BEARER  abc ")), Ok("abc"));
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(bearer_token(&HeaderMap::new()).is_err());
        assert!(bearer_token(&headers("Basic abc")).is_err());
        assert!(bearer_token(&headers("Bearer")).is_err());
        assert!(bearer_token(&headers("Bearer   ")).is_err());
        assert!(bearer_token(&headers("abc")).is_err());
    }
}
