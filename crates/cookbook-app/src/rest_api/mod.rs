use cookbook_dal::{recipe::RecipeFilter, ListingParams};
use garde::Validate;

use crate::state::AppState;

pub mod category;
mod macros;
mod paging;
pub mod profile;
pub mod recipe;
pub mod tag;

pub use paging::{page_params, Page, Paging};

/// Query of recipe listings, page size is fixed by configuration
#[derive(Debug, Clone, Default, Validate, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct RecipeQuery {
    #[garde(range(min = 1))]
    pub page: Option<u32>,
    #[garde(range(min = 1))]
    pub category_id: Option<i64>,
    #[garde(range(min = 1))]
    pub tag_id: Option<i64>,
}

impl RecipeQuery {
    pub fn listing_params(&self, page_size: u32) -> ListingParams {
        page_params(self.page, page_size)
    }

    pub fn filter(&self) -> RecipeFilter {
        RecipeFilter {
            category_id: self.category_id,
            tag_id: self.tag_id,
            author_id: None,
        }
    }
}

/// All REST resources, must be nested on /api path
pub fn api_router() -> axum::Router<AppState> {
    axum::Router::new()
        .nest("/recipe", recipe::router())
        .nest("/category", category::router())
        .nest("/tag", tag::router())
        .nest("/profile", profile::router())
}

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::openapi::OpenApiBuilder;
    let mut docs = OpenApiBuilder::new().build();
    for (path, module_docs) in [
        ("/api/recipe", recipe::api_docs()),
        ("/api/category", category::api_docs()),
        ("/api/tag", tag::api_docs()),
        ("/api/profile", profile::api_docs()),
    ] {
        docs = docs.nest(path, module_docs);
    }
    docs
}
