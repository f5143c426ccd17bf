use crate::{auth::token::RequiredRolesLayer, state::AppState};
use cookbook_dal::{
    comment::CommentRepository, rating::RatingRepository, recipe::RecipeRepository,
};
use cookbook_types::claim::Role;

#[allow(unused_imports)]
use axum::routing::{delete, get, post, put};

crate::repository_from_request!(RecipeRepository);
crate::repository_from_request!(CommentRepository);
crate::repository_from_request!(RatingRepository);

mod crud_api {
    use axum::{
        extract::{Path, Query, State},
        response::IntoResponse,
        Json,
    };
    use crate::validate::Garde;
    use cookbook_dal::recipe::{CreateRecipe, RecipeRepository, UpdateRecipe};
    #[cfg_attr(not(feature = "openapi"), allow(unused_imports))]
    use cookbook_dal::recipe::Recipe;
    use cookbook_types::claim::ApiClaim;
    use http::StatusCode;
    use tracing::debug;

    use crate::{
        auth::user_id,
        error::{ApiError, ApiResult},
        rest_api::{Page, RecipeQuery},
        state::AppState,
    };

    /// Only author or admin can change the recipe
    pub(super) async fn check_can_modify(
        repository: &RecipeRepository,
        id: i64,
        api_user: &ApiClaim,
        action: &str,
    ) -> ApiResult<()> {
        let author_id = repository.author_of(id).await?;
        if api_user.can_modify(author_id) {
            Ok(())
        } else {
            debug!("User {} cannot {action} recipe {id}", api_user.sub);
            Err(ApiError::Forbidden(format!(
                "You are not allowed to {action} this recipe"
            )))
        }
    }

    #[cfg_attr(feature = "openapi",  utoipa::path(get, path = "", tag = "Recipe", operation_id = "listRecipe",
        params(RecipeQuery), responses((status = StatusCode::OK, description = "Recipes, most recently modified first", body = Page<Recipe>))))]
    pub async fn list(
        repository: RecipeRepository,
        State(state): State<AppState>,
        Garde(Query(query)): Garde<Query<RecipeQuery>>,
    ) -> ApiResult<impl IntoResponse> {
        let page_size = state.config().default_page_size;
        let batch = repository
            .list(&query.filter(), query.listing_params(page_size))
            .await?;
        Ok((StatusCode::OK, Json(Page::from_batch(batch, page_size))))
    }

    #[cfg_attr(feature = "openapi",  utoipa::path(get, path = "/own", tag = "Recipe", operation_id = "listOwnRecipe",
        params(RecipeQuery), responses((status = StatusCode::OK, description = "Recipes of current user", body = Page<Recipe>))))]
    pub async fn list_own(
        repository: RecipeRepository,
        State(state): State<AppState>,
        api_user: ApiClaim,
        Garde(Query(query)): Garde<Query<RecipeQuery>>,
    ) -> ApiResult<impl IntoResponse> {
        let page_size = state.config().default_page_size;
        let filter = query.filter().with_author(user_id(&api_user)?);
        let batch = repository
            .list(&filter, query.listing_params(page_size))
            .await?;
        Ok((StatusCode::OK, Json(Page::from_batch(batch, page_size))))
    }

    #[cfg_attr(feature = "openapi",  utoipa::path(get, path = "/{id}", tag = "Recipe", operation_id = "getRecipe",
        responses((status = StatusCode::OK, description = "Get one", body = Recipe))))]
    pub async fn get(
        Path(id): Path<i64>,
        repository: RecipeRepository,
    ) -> ApiResult<impl IntoResponse> {
        let record = repository.get(id).await?;

        Ok((StatusCode::OK, Json(record)))
    }

    #[cfg_attr(feature = "openapi",  utoipa::path(post, path = "", tag = "Recipe", operation_id = "createRecipe",
        responses((status = StatusCode::CREATED, description = "Created Recipe", body = Recipe))))]
    pub async fn create(
        repository: RecipeRepository,
        api_user: ApiClaim,
        Garde(Json(payload)): Garde<Json<CreateRecipe>>,
    ) -> ApiResult<impl IntoResponse> {
        let record = repository.create(payload, user_id(&api_user)?).await?;

        Ok((StatusCode::CREATED, Json(record)))
    }

    #[cfg_attr(feature = "openapi",  utoipa::path(put, path = "/{id}", tag = "Recipe", operation_id = "updateRecipe",
        responses((status = StatusCode::OK, description = "Updated Recipe", body = Recipe))))]
    pub async fn update(
        Path(id): Path<i64>,
        repository: RecipeRepository,
        api_user: ApiClaim,
        Garde(Json(payload)): Garde<Json<UpdateRecipe>>,
    ) -> ApiResult<impl IntoResponse> {
        check_can_modify(&repository, id, &api_user, "edit").await?;
        let record = repository.update(id, payload).await?;

        Ok((StatusCode::OK, Json(record)))
    }

    #[cfg_attr(
        feature = "openapi",
        utoipa::path(delete, path = "/{id}", tag = "Recipe", operation_id = "deleteRecipe")
    )]
    pub async fn delete(
        Path(id): Path<i64>,
        repository: RecipeRepository,
        api_user: ApiClaim,
    ) -> ApiResult<impl IntoResponse> {
        check_can_modify(&repository, id, &api_user, "delete").await?;
        repository.delete(id).await?;

        Ok((StatusCode::NO_CONTENT, ()))
    }
}

mod comment_api {
    use axum::{extract::Path, response::IntoResponse, Json};
    use crate::validate::Garde;
    use cookbook_dal::{
        comment::{CommentRepository, CreateComment},
        recipe::RecipeRepository,
    };
    #[cfg_attr(not(feature = "openapi"), allow(unused_imports))]
    use cookbook_dal::comment::Comment;
    use cookbook_types::claim::ApiClaim;
    use http::StatusCode;
    use tracing::debug;

    use crate::{
        auth::user_id,
        error::{ApiError, ApiResult},
    };

    #[cfg_attr(feature = "openapi",  utoipa::path(get, path = "/{id}/comments", tag = "Recipe", operation_id = "listRecipeComments",
        responses((status = StatusCode::OK, description = "Comments, newest first", body = Vec<Comment>))))]
    pub async fn list(
        Path(recipe_id): Path<i64>,
        recipe_repository: RecipeRepository,
        repository: CommentRepository,
    ) -> ApiResult<impl IntoResponse> {
        if !recipe_repository.exists(recipe_id).await? {
            return Err(ApiError::ResourceNotFound("Recipe".to_string()));
        }
        let comments = repository.list_for_recipe(recipe_id).await?;
        Ok((StatusCode::OK, Json(comments)))
    }

    #[cfg_attr(feature = "openapi",  utoipa::path(post, path = "/{id}/comments", tag = "Recipe", operation_id = "createRecipeComment",
        responses((status = StatusCode::CREATED, description = "Created Comment", body = Comment))))]
    pub async fn create(
        Path(recipe_id): Path<i64>,
        repository: CommentRepository,
        api_user: ApiClaim,
        Garde(Json(payload)): Garde<Json<CreateComment>>,
    ) -> ApiResult<impl IntoResponse> {
        let comment = repository
            .create(recipe_id, user_id(&api_user)?, payload)
            .await?;
        Ok((StatusCode::CREATED, Json(comment)))
    }

    #[cfg_attr(
        feature = "openapi",
        utoipa::path(delete, path = "/{id}/comments/{comment_id}", tag = "Recipe", operation_id = "deleteRecipeComment")
    )]
    pub async fn delete(
        Path((recipe_id, id)): Path<(i64, i64)>,
        repository: CommentRepository,
        api_user: ApiClaim,
    ) -> ApiResult<impl IntoResponse> {
        let comment = repository.get(id).await?;
        if comment.recipe_id != recipe_id {
            return Err(ApiError::ResourceNotFound("Comment".to_string()));
        }
        if !api_user.can_modify(comment.author.id) {
            debug!("User {} cannot delete comment {id}", api_user.sub);
            return Err(ApiError::Forbidden(
                "You are not allowed to delete this comment".to_string(),
            ));
        }
        repository.delete(id).await?;
        Ok((StatusCode::NO_CONTENT, ()))
    }
}

mod rating_api {
    use axum::{extract::Path, response::IntoResponse, Json};
    use crate::validate::Garde;
    use cookbook_dal::rating::{CreateRating, RatingRepository};
    #[cfg_attr(not(feature = "openapi"), allow(unused_imports))]
    use cookbook_dal::rating::{Rating, RatingOutcome};
    use cookbook_types::claim::ApiClaim;
    use http::StatusCode;

    use crate::{auth::user_id, error::ApiResult};

    #[cfg_attr(feature = "openapi",  utoipa::path(get, path = "/{id}/rating", tag = "Recipe", operation_id = "getOwnRating",
        responses((status = StatusCode::OK, description = "Rating of current user or null", body = Option<Rating>))))]
    pub async fn get(
        Path(recipe_id): Path<i64>,
        repository: RatingRepository,
        api_user: ApiClaim,
    ) -> ApiResult<impl IntoResponse> {
        let rating = repository
            .get_for_user(recipe_id, user_id(&api_user)?)
            .await?;
        Ok((StatusCode::OK, Json(rating)))
    }

    #[cfg_attr(feature = "openapi",  utoipa::path(put, path = "/{id}/rating", tag = "Recipe", operation_id = "rateRecipe",
        responses((status = StatusCode::OK, description = "Stored rating and new average", body = RatingOutcome))))]
    pub async fn rate(
        Path(recipe_id): Path<i64>,
        repository: RatingRepository,
        api_user: ApiClaim,
        Garde(Json(payload)): Garde<Json<CreateRating>>,
    ) -> ApiResult<impl IntoResponse> {
        let outcome = repository
            .rate(recipe_id, user_id(&api_user)?, payload)
            .await?;
        Ok((StatusCode::OK, Json(outcome)))
    }
}

crate::publish_api_docs!(
    crud_api::list,
    crud_api::list_own,
    crud_api::get,
    crud_api::create,
    crud_api::update,
    crud_api::delete,
    comment_api::list,
    comment_api::create,
    comment_api::delete,
    rating_api::get,
    rating_api::rate
);

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(crud_api::create))
        .route("/own", get(crud_api::list_own))
        .route("/{id}", put(crud_api::update).delete(crud_api::delete))
        .route("/{id}/comments", post(comment_api::create))
        .route("/{id}/comments/{comment_id}", delete(comment_api::delete))
        .route(
            "/{id}/rating",
            get(rating_api::get).put(rating_api::rate),
        )
        .layer(RequiredRolesLayer::new([Role::User]))
        .route("/", get(crud_api::list))
        .route("/{id}", get(crud_api::get))
        .route("/{id}/comments", get(comment_api::list))
}
