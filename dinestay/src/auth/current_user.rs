use crate::{
    AppState,
    auth::session,
    errors::{Error, Result},
    types::{Role, UserId},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{instrument, trace};

/// The authenticated user behind a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Find the session token in the session cookie
fn token_from_cookie<'a>(parts: &'a Parts, cookie_name: &str) -> Option<&'a str> {
    let cookie_str = parts.headers.get(axum::http::header::COOKIE)?.to_str().ok()?;

    cookie_str.split(';').find_map(|cookie| {
        let (name, value) = cookie.trim().split_once('=')?;
        (name == cookie_name && !value.is_empty()).then_some(value)
    })
}

/// Find the session token in an `Authorization: Bearer` header
fn token_from_bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let config = &state.config;

        // Cookie first, the header is for non-browser clients
        let token = token_from_cookie(parts, &config.auth.cookie_name).or_else(|| token_from_bearer(parts));

        let Some(token) = token else {
            trace!("No session token found in request");
            return Err(Error::Unauthenticated { message: None });
        };

        match session::verify_session_token(token, config) {
            Ok(user) => {
                trace!(user_id = %user.id, "Session token verified");
                Ok(user)
            }
            Err(Error::Unauthenticated { .. }) => Err(Error::Unauthenticated { message: None }),
            Err(e) => Err(e),
        }
    }
}

/// An authenticated user with the admin role
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(Error::RoleNotAllowed { role: user.role });
        }
        Ok(RequireAdmin(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_state, session_token};
    use axum::extract::FromRequestParts as _;

    fn parts_with_header(name: &str, value: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header(name, value)
            .body(())
            .unwrap();
        request.into_parts().0
    }

    #[tokio::test]
    async fn test_cookie_session() {
        let state = create_test_state();
        let (user, token) = session_token(&state.config, Role::User);

        let mut parts = parts_with_header("cookie", &format!("theme=dark; token={token}; other=1"));
        let extracted = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();

        assert_eq!(extracted, user);
    }

    #[tokio::test]
    async fn test_bearer_session() {
        let state = create_test_state();
        let (user, token) = session_token(&state.config, Role::Admin);

        let mut parts = parts_with_header("authorization", &format!("Bearer {token}"));
        let extracted = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();

        assert_eq!(extracted, user);
        assert!(extracted.is_admin());
    }

    #[tokio::test]
    async fn test_missing_or_invalid_token_is_unauthenticated() {
        let state = create_test_state();

        let mut parts = parts_with_header("x-unrelated", "1");
        let result = CurrentUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(Error::Unauthenticated { .. })));

        let mut parts = parts_with_header("cookie", "token=garbage");
        let result = CurrentUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(Error::Unauthenticated { .. })));
    }

    #[tokio::test]
    async fn test_require_admin_rejects_users() {
        let state = create_test_state();
        let (_, token) = session_token(&state.config, Role::User);

        let mut parts = parts_with_header("authorization", &format!("Bearer {token}"));
        let result = RequireAdmin::from_request_parts(&mut parts, &state).await;

        match result {
            Err(e @ Error::RoleNotAllowed { .. }) => {
                assert_eq!(e.user_message(), "Role: user is not allowed to access this resource")
            }
            other => panic!("expected RoleNotAllowed, got {other:?}"),
        }
    }
}
