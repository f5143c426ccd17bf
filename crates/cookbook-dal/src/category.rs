use serde::{Deserialize, Serialize};

classifier_repository!(
    entity = Category,
    create = CreateCategory,
    repository = CategoryRepository,
    repository_impl = CategoryRepositoryImpl,
    table = "category",
    min_title = 3,
    usage = "SELECT count(*) FROM recipe WHERE category_id = ?",
);

pub type UpdateCategory = CreateCategory;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CategoryShort {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

impl From<Category> for CategoryShort {
    fn from(value: Category) -> Self {
        Self {
            id: value.id,
            title: value.title,
            slug: value.slug,
        }
    }
}
