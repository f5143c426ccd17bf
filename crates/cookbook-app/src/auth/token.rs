use std::task::{Context, Poll};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    response::{IntoResponse, Response},
};
use cookbook_dal::user::User;
use cookbook_types::claim::{ApiClaim, Authorization as _, Role};
use cookie::{Cookie, Expiration, SameSite};
use futures::future::{ready, Either, Ready};
use headers::{authorization::Bearer, Authorization, HeaderMapExt as _};
use http::{request::Parts, StatusCode};
use time::OffsetDateTime;
use tower::{Layer, Service};
use tower_cookies::Cookies;
use tower_sessions::Session;
use tracing::{debug, error};

use super::{SESSION_USER_KEY, TOKEN_COOKIE_NAME};

/// Claim of authenticated user, as inserted by [`TokenLayer`]
impl FromRequestParts<AppState> for ApiClaim {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> ApiResult<Self> {
        parts.extensions.get::<ApiClaim>().cloned().ok_or_else(|| {
            debug!("No valid token in request");
            ApiError::Unauthorized
        })
    }
}

fn request_token(request: &Request) -> Option<String> {
    if let Some(Authorization(bearer)) = request.headers().typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }
    request
        .headers()
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(|c| c.ok())
        .find(|c| c.name() == TOKEN_COOKIE_NAME)
        .map(|c| c.value().to_string())
}

/// Validates API token from `Authorization` header or token cookie, if present,
/// and makes its claim available to handlers. Request with invalid token is rejected.
#[derive(Clone)]
pub struct TokenLayer {
    state: AppState,
}

impl TokenLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for TokenLayer {
    type Service = TokenService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TokenService {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct TokenService<S> {
    inner: S,
    state: AppState,
}

impl<S> Service<Request> for TokenService<S>
where
    S: Service<Request, Response = Response>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Either<Ready<Result<Response, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        if let Some(token) = request_token(&request) {
            match self.state.tokens().validate::<ApiClaim>(&token) {
                Ok(claim) => {
                    request.extensions_mut().insert(claim);
                }
                Err(e) => {
                    debug!("Rejecting invalid token: {e}");
                    return Either::Left(ready(Ok(ApiError::Unauthorized.into_response())));
                }
            }
        }
        Either::Right(self.inner.call(request))
    }
}

/// Allows request only if authenticated user has at least one of the roles
#[derive(Clone)]
pub struct RequiredRolesLayer {
    roles: Vec<Role>,
}

impl RequiredRolesLayer {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
        }
    }
}

impl<S> Layer<S> for RequiredRolesLayer {
    type Service = RequiredRolesService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequiredRolesService {
            inner,
            roles: self.roles.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RequiredRolesService<S> {
    inner: S,
    roles: Vec<Role>,
}

impl<S> Service<Request> for RequiredRolesService<S>
where
    S: Service<Request, Response = Response>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Either<Ready<Result<Response, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let rejection = match request.extensions().get::<ApiClaim>() {
            None => Some(ApiError::Unauthorized),
            Some(claim) if !claim.has_any_role(self.roles.iter().copied()) => {
                debug!("User {} lacks any of roles {:?}", claim.sub, self.roles);
                Some(ApiError::Forbidden(
                    "You are not allowed to perform this action".to_string(),
                ))
            }
            Some(_) => None,
        };
        match rejection {
            Some(error) => Either::Left(ready(Ok(error.into_response()))),
            None => Either::Right(self.inner.call(request)),
        }
    }
}

/// Issues API token for user logged in the session, token is also set as cookie
pub async fn token(
    session: Session,
    cookies: Cookies,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, StatusCode> {
    let user = session.get::<User>(SESSION_USER_KEY).await.map_err(|e| {
        error!("Failed to get user from session: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if let Some(known_user) = user {
        let token = ApiClaim::new_expired(known_user.id, known_user.roles.iter().copied());

        let signed_token = state.tokens().issue(token).map_err(|e| {
            error!("Failed to issue token: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

        let cookie = Cookie::build((TOKEN_COOKIE_NAME, signed_token.clone()))
            .http_only(true)
            .secure(state.config().secure_cookies())
            .path("/")
            .same_site(SameSite::Lax)
            .expires(Expiration::DateTime(
                OffsetDateTime::now_utc() + state.tokens().default_validity(),
            ));

        cookies.add(cookie.into());

        Ok(signed_token)
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{body::Body, routing::get, Router};
    use cookbook_auth::token::TokenManager;
    use tower::ServiceExt as _;

    use super::*;
    use crate::state::AppConfig;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    async fn test_state() -> AppState {
        let pool = cookbook_dal::new_pool("sqlite::memory:").await.unwrap();
        let config = AppConfig {
            base_url: "http://localhost:3000".parse().unwrap(),
            default_page_size: 10,
        };
        let tokens = TokenManager::new(SECRET, Duration::from_secs(60)).unwrap();
        AppState::new(config, pool, tokens)
    }

    async fn whoami(claim: ApiClaim) -> String {
        claim.sub
    }

    fn router(state: AppState) -> Router {
        Router::new()
            .route("/admin", get(whoami))
            .layer(RequiredRolesLayer::new([Role::Admin]))
            .route("/me", get(whoami))
            .route("/public", get(|| async { "hello" }))
            .layer(TokenLayer::new(state.clone()))
            .with_state(state)
    }

    fn request(path: &str, token: Option<&str>) -> Request {
        let mut builder = http::Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_token_layer() {
        let state = test_state().await;
        let user_token = state
            .tokens()
            .issue(ApiClaim::new_expired(7, []))
            .unwrap();
        let app = router(state);

        let res = app.clone().oneshot(request("/public", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app.clone().oneshot(request("/me", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app
            .clone()
            .oneshot(request("/public", Some("garbage")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app
            .clone()
            .oneshot(request("/me", Some(&user_token)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let cookie_request = http::Request::builder()
            .uri("/me")
            .header("Cookie", format!("other=1; {TOKEN_COOKIE_NAME}={user_token}"))
            .body(Body::empty())
            .unwrap();
        let res = app.clone().oneshot(cookie_request).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_required_roles() {
        let state = test_state().await;
        let user_token = state
            .tokens()
            .issue(ApiClaim::new_expired(7, []))
            .unwrap();
        let admin_token = state
            .tokens()
            .issue(ApiClaim::new_expired(1, [Role::Admin]))
            .unwrap();
        let app = router(state);

        let res = app.clone().oneshot(request("/admin", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app
            .clone()
            .oneshot(request("/admin", Some(&user_token)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = app
            .oneshot(request("/admin", Some(&admin_token)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
