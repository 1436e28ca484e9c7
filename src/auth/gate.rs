use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use crate::auth::jwt::{JwtKeys, TokenKind};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller, attached to the request by the gate middleware.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

/// Runs once per request. A valid access token attaches an `Identity` to the
/// request extensions; anything else (no header, malformed header, bad or
/// expired token, refresh token) leaves the request anonymous. Authorization
/// is enforced downstream by the handlers that need an identity, so public
/// endpoints keep working even with a garbage Authorization header present.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let keys = JwtKeys::from_ref(&state);
    if let Some(identity) = bearer_identity(&keys, request.headers()) {
        debug!(email = %identity.email, "request authenticated");
        request.extensions_mut().insert(identity);
    }
    next.run(request).await
}

/// Extracts and verifies `Authorization: Bearer <token>`. Only access tokens
/// yield an identity; a refresh token in the header is treated as anonymous.
pub(crate) fn bearer_identity(keys: &JwtKeys, headers: &HeaderMap) -> Option<Identity> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    let claims = keys.verify(token).ok()?;
    if claims.kind != TokenKind::Access {
        return None;
    }
    Some(Identity {
        user_id: claims.user_id,
        email: claims.email?,
    })
}

/// Extractor for handlers that require an authenticated caller.
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthUser)
            .ok_or(ApiError::AuthenticationRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_ref(&AppState::fake())
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn valid_access_token_yields_identity() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_access(user_id, "a@b.com").unwrap();
        let identity = bearer_identity(&keys, &headers_with(&format!("Bearer {token}")))
            .expect("identity expected");
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.email, "a@b.com");
    }

    #[tokio::test]
    async fn missing_header_is_anonymous() {
        let keys = make_keys();
        assert!(bearer_identity(&keys, &HeaderMap::new()).is_none());
    }

    #[tokio::test]
    async fn malformed_header_is_anonymous() {
        let keys = make_keys();
        let token = keys.sign_access(Uuid::new_v4(), "a@b.com").unwrap();
        // Prefix is case-sensitive, "bearer" must not match.
        assert!(bearer_identity(&keys, &headers_with(&format!("bearer {token}"))).is_none());
        assert!(bearer_identity(&keys, &headers_with("Bearer")).is_none());
        assert!(bearer_identity(&keys, &headers_with("Bearer not-a-jwt")).is_none());
    }

    #[tokio::test]
    async fn refresh_token_in_header_is_anonymous() {
        let keys = make_keys();
        let token = keys.sign_refresh(Uuid::new_v4()).unwrap();
        assert!(bearer_identity(&keys, &headers_with(&format!("Bearer {token}"))).is_none());
    }
}
