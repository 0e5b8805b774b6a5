use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};

use crate::auth::{AuthError, Claims, TokenVerifier};
use crate::error::ApiError;

/// Authenticated user context extracted from a verified token.
///
/// Travels through request extensions as a typed value, so a handler
/// reading an identity field the verifier never populated is a compile
/// error rather than a silent miss at runtime.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub role: Option<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

/// JWT authentication middleware: validates the bearer token and
/// injects the identity for downstream handlers.
pub async fn jwt_auth_middleware(
    State(verifier): State<Arc<TokenVerifier>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)?;
    let claims = verifier.verify(token)?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Admin gate, layered after `jwt_auth_middleware`. Fails closed: no
/// role claim means no admin access.
pub async fn admin_middleware(
    Extension(auth): Extension<AuthUser>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !auth.is_admin() {
        return Err(ApiError::forbidden("Admin access required"));
    }
    Ok(next.run(request).await)
}

/// Pull the token out of `Authorization: Bearer <token>`.
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get("authorization")
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::Malformed("non-ASCII Authorization header".into()))?;

    let token = auth_header.strip_prefix("Bearer ").unwrap_or(auth_header);
    if token.trim().is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn strips_bearer_prefix() {
        let headers = headers_with_auth("Bearer abc.def.ghi");
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn accepts_bare_token() {
        let headers = headers_with_auth("abc.def.ghi");
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn rejects_missing_and_empty() {
        assert!(matches!(
            extract_bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            extract_bearer_token(&headers_with_auth("Bearer ")),
            Err(AuthError::MissingToken)
        ));
    }

    #[test]
    fn admin_requires_exact_role() {
        let user = AuthUser { user_id: 1, username: "u".into(), role: None };
        assert!(!user.is_admin());
        let user = AuthUser { user_id: 1, username: "u".into(), role: Some("user".into()) };
        assert!(!user.is_admin());
        let user = AuthUser { user_id: 1, username: "u".into(), role: Some("admin".into()) };
        assert!(user.is_admin());
    }
}
