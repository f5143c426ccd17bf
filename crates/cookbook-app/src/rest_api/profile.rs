use axum::{
    response::IntoResponse,
    routing::{get, put},
    Json,
};
use crate::validate::Garde;
use cookbook_dal::user::{ChangeOwnPassword, UpdateUser, UserRepository};
#[cfg_attr(not(feature = "openapi"), allow(unused_imports))]
use cookbook_dal::user::User;
use cookbook_types::claim::{ApiClaim, Role};
use http::StatusCode;
use tracing::info;

use crate::{
    auth::{token::RequiredRolesLayer, user_id},
    error::ApiResult,
    state::AppState,
};

crate::publish_api_docs!(get_profile, update_profile, change_password);

#[cfg_attr(feature = "openapi",  utoipa::path(get, path = "", tag = "Profile", operation_id = "getProfile",
    responses((status = StatusCode::OK, description = "Current user", body = User))))]
async fn get_profile(
    user_registry: UserRepository,
    api_user: ApiClaim,
) -> ApiResult<impl IntoResponse> {
    let user = user_registry.get(user_id(&api_user)?).await?;
    Ok((StatusCode::OK, Json(user)))
}

#[cfg_attr(feature = "openapi",  utoipa::path(put, path = "", tag = "Profile", operation_id = "updateProfile",
    request_body = UpdateUser,
    responses((status = StatusCode::OK, description = "Updated current user", body = User))))]
async fn update_profile(
    user_registry: UserRepository,
    api_user: ApiClaim,
    Garde(Json(payload)): Garde<Json<UpdateUser>>,
) -> ApiResult<impl IntoResponse> {
    let user = user_registry
        .update_email(user_id(&api_user)?, payload)
        .await?;
    Ok((StatusCode::OK, Json(user)))
}

#[cfg_attr(feature = "openapi",  utoipa::path(put, path = "/password", tag = "Profile", operation_id = "changeOwnPassword",
    request_body = ChangeOwnPassword,
    responses((status = StatusCode::NO_CONTENT, description = "Password changed"))))]
async fn change_password(
    user_registry: UserRepository,
    api_user: ApiClaim,
    Garde(Json(payload)): Garde<Json<ChangeOwnPassword>>,
) -> ApiResult<impl IntoResponse> {
    let id = user_id(&api_user)?;
    user_registry.change_own_password(id, payload).await?;
    info!("User {id} changed password");
    Ok((StatusCode::NO_CONTENT, ()))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(get_profile).put(update_profile))
        .route("/password", put(change_password))
        .layer(RequiredRolesLayer::new([Role::User]))
}
