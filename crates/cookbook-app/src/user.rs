use crate::{
    auth::{token::RequiredRolesLayer, user_id},
    error::{ApiError, ApiResult},
    repository_from_request,
};
use crate::validate::Garde;
use cookbook_dal::user::{CreateUser, SetPassword, UpdateUser, User, UserRepository};

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{post, put},
    Json,
};
use cookbook_types::claim::{ApiClaim, Role};
use http::StatusCode;
use tracing::info;

use crate::state::AppState;

repository_from_request!(UserRepository);

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(create_user, list_users, update_user, set_password, delete_user))]
struct ModuleDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ModuleDocs::openapi()
}

#[cfg_attr(feature = "openapi",  utoipa::path(post, path = "", tag = "Users", operation_id = "createUser",
    responses((status = StatusCode::CREATED, description = "Create new User", body = User))))]
pub async fn create_user(
    user_registry: UserRepository,
    Garde(Json(payload)): Garde<Json<CreateUser>>,
) -> ApiResult<impl IntoResponse> {
    let user = user_registry.create(payload).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[cfg_attr(feature = "openapi",  utoipa::path(get, path = "", tag = "Users", operation_id = "listUsers",
    responses((status = StatusCode::OK, description = "List Users", body = Vec<User>))))]
async fn list_users(user_registry: UserRepository) -> ApiResult<impl IntoResponse> {
    let users = user_registry.list(cookbook_dal::MAX_LIMIT).await?;
    Ok((StatusCode::OK, Json(users)))
}

#[cfg_attr(feature = "openapi",  utoipa::path(put, path = "/{id}", tag = "Users", operation_id = "updateUser",
    request_body = UpdateUser,
    responses((status = StatusCode::OK, description = "Updated User", body = User))))]
async fn update_user(
    Path(id): Path<i64>,
    user_registry: UserRepository,
    Garde(Json(payload)): Garde<Json<UpdateUser>>,
) -> ApiResult<impl IntoResponse> {
    let user = user_registry.update_email(id, payload).await?;
    Ok((StatusCode::OK, Json(user)))
}

#[cfg_attr(feature = "openapi",  utoipa::path(put, path = "/{id}/password", tag = "Users", operation_id = "setUserPassword",
    request_body = SetPassword,
    responses((status = StatusCode::NO_CONTENT, description = "Password changed"))))]
async fn set_password(
    Path(id): Path<i64>,
    user_registry: UserRepository,
    Garde(Json(payload)): Garde<Json<SetPassword>>,
) -> ApiResult<impl IntoResponse> {
    user_registry.set_password(id, &payload.new_password).await?;
    info!("Password of user {id} was reset");
    Ok((StatusCode::NO_CONTENT, ()))
}

#[cfg_attr(feature = "openapi",  utoipa::path(delete, path = "/{id}", tag = "Users", operation_id = "deleteUser",
    responses((status = StatusCode::NO_CONTENT, description = "Deleted successfully"))))]
async fn delete_user(
    Path(id): Path<i64>,
    user_registry: UserRepository,
    api_user: ApiClaim,
) -> ApiResult<impl IntoResponse> {
    if user_id(&api_user)? == id {
        return Err(ApiError::Conflict("You cannot delete your own account".to_string()));
    }
    user_registry.delete(id).await?;

    Ok((StatusCode::NO_CONTENT, ()))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create_user).get(list_users))
        .route("/{id}", put(update_user).delete(delete_user))
        .route("/{id}/password", put(set_password))
        .layer(RequiredRolesLayer::new([Role::Admin]))
}
