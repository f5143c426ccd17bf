use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};
use axum::{
    extract::{FromRequest as _, State},
    response::IntoResponse,
    routing::{get, post},
    Form, Json,
};
use crate::validate::Garde;
use cookbook_dal::user::{CreateUser, RegisterUser, User, UserRepository};
use cookbook_types::claim::ApiClaim;
use http::StatusCode;
use tower_cookies::Cookies;
use tower_sessions::Session;
use tracing::{debug, error, info, warn};

const SESSION_COOKIE_NAME: &str = "cookbook";
pub const TOKEN_COOKIE_NAME: &str = "cookbook_token";
const SESSION_USER_KEY: &str = "user";
const SESSION_EXPIRY_SECS: i64 = 3600;

pub mod token;

/// Id of authenticated user
pub fn user_id(claim: &ApiClaim) -> ApiResult<i64> {
    claim.user_id().ok_or_else(|| {
        warn!("Invalid subject in token: {}", claim.sub);
        ApiError::Unauthorized
    })
}

pub async fn logout(session: Session, cookies: Cookies) -> impl IntoResponse {
    session
        .delete()
        .await
        .unwrap_or_else(|e| warn!("Failed to delete session: {e}"));

    cookies.remove(tower_cookies::Cookie::build((SESSION_COOKIE_NAME, "")).path("/").into());
    cookies.remove(tower_cookies::Cookie::build((TOKEN_COOKIE_NAME, "")).path("/").into());

    StatusCode::NO_CONTENT
}

/// Builds authentication router - must be nested on /auth path!
pub fn auth_router(secure_cookies: bool) -> axum::Router<AppState> {
    let session_store = tower_sessions::MemoryStore::default();
    let session_layer = tower_sessions::SessionManagerLayer::new(session_store)
        .with_name(SESSION_COOKIE_NAME)
        .with_secure(secure_cookies)
        .with_expiry(tower_sessions::Expiry::OnInactivity(
            time::Duration::seconds(SESSION_EXPIRY_SECS),
        ));
    axum::Router::new()
        .route("/register", post(register))
        .route("/login", post(db_login))
        .route("/logout", get(logout))
        .route("/token", get(token::token))
        .layer(session_layer)
}

#[derive(serde::Deserialize)]
struct LoginCredentials {
    email: String,
    password: String,
}

#[cfg_attr(feature = "openapi",  utoipa::path(post, path = "/register", tag = "Auth", operation_id = "register",
    request_body = RegisterUser,
    responses((status = StatusCode::CREATED, description = "Registered new user", body = User))))]
pub async fn register(
    user_registry: UserRepository,
    Garde(Json(payload)): Garde<Json<RegisterUser>>,
) -> ApiResult<impl IntoResponse> {
    let user = user_registry.create(CreateUser::from(payload)).await?;
    info!("Registered new user {}", user.email);
    Ok((StatusCode::CREATED, Json(user)))
}

async fn after_ok_login(session: &Session, known_user: User) -> ApiResult<impl IntoResponse> {
    session
        .insert(SESSION_USER_KEY, known_user.clone())
        .await
        .map_err(|e| {
            error!("Failed to store user in session: {e}");
            ApiError::InternalError("Session store failed".into())
        })?;

    Ok((StatusCode::OK, Json(known_user)))
}

pub async fn db_login(
    user_registry: UserRepository,
    session: Session,
    request: axum::extract::Request,
) -> ApiResult<impl IntoResponse> {
    let content_type = request
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidRequest("Missing content-type header".into()))?;
    let credentials = if content_type.starts_with("application/json") {
        let Json(data) = Json::<LoginCredentials>::from_request(request, &())
            .await
            .map_err(|e| {
                debug!("Failed to get login credentials: {e}");
                ApiError::InvalidRequest("Invalid login credentials".into())
            })?;
        data
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        let Form(data) = Form::<LoginCredentials>::from_request(request, &())
            .await
            .map_err(|e| {
                debug!("Failed to get login credentials: {e}");
                ApiError::InvalidRequest("Invalid login credentials".into())
            })?;
        data
    } else {
        return Err(ApiError::InvalidRequest(format!(
            "Unsupported content type {content_type}"
        )));
    };

    let user = user_registry
        .check_password(&credentials.email, &credentials.password)
        .await
        .map_err(|e| {
            debug!("User check error: {e}");
            ApiError::Unauthorized
        })?;

    after_ok_login(&session, user).await
}

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    #[derive(utoipa::OpenApi)]
    #[openapi(paths(register))]
    struct ApiDocs;
    ApiDocs::openapi()
}
