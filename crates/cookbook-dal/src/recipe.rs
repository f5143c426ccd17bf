use std::collections::HashMap;

use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Pool, QueryBuilder, Row as _};
use tracing::{debug, info};

use crate::{
    Batch, ChosenConnection, ChosenDB, ChosenRow, Error, ListingParams, category::CategoryShort,
    error::Result, tag::TagShort, user::UserShort,
};

const SELECT_RECIPE: &str = "SELECT r.id, r.title, r.content, r.slug, r.average_rating, r.created, r.modified,
c.id AS category_id, c.title AS category_title, c.slug AS category_slug,
u.id AS author_id, u.email AS author_email
FROM recipe r
JOIN category c ON r.category_id = c.id
JOIN users u ON r.author_id = u.id";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub average_rating: f64,
    pub category: CategoryShort,
    pub tags: Vec<TagShort>,
    pub author: UserShort,
    pub created: time::PrimitiveDateTime,
    pub modified: time::PrimitiveDateTime,
}

impl<'r> FromRow<'r, ChosenRow> for Recipe {
    fn from_row(row: &'r ChosenRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Recipe {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            slug: row.try_get("slug")?,
            average_rating: row.try_get("average_rating")?,
            category: CategoryShort {
                id: row.try_get("category_id")?,
                title: row.try_get("category_title")?,
                slug: row.try_get("category_slug")?,
            },
            tags: Vec::new(),
            author: UserShort {
                id: row.try_get("author_id")?,
                email: row.try_get("author_email")?,
            },
            created: row.try_get("created")?,
            modified: row.try_get("modified")?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateRecipe {
    #[garde(length(min = 3, max = 255))]
    pub title: String,
    #[garde(length(min = 3, max = 100_000))]
    pub content: String,
    #[garde(range(min = 1))]
    pub category_id: i64,
    /// Tag titles, unknown tags are created
    #[serde(default)]
    #[garde(length(max = 32), inner(length(max = 64)))]
    pub tags: Vec<String>,
}

pub type UpdateRecipe = CreateRecipe;

/// Restricts recipe listing, all present conditions must hold
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeFilter {
    pub category_id: Option<i64>,
    pub tag_id: Option<i64>,
    pub author_id: Option<i64>,
}

impl RecipeFilter {
    pub fn with_author(mut self, author_id: i64) -> Self {
        self.author_id = Some(author_id);
        self
    }

    fn push_conditions(&self, query: &mut QueryBuilder<'_, ChosenDB>) {
        let mut prefix = " WHERE ";
        if let Some(category_id) = self.category_id {
            query.push(prefix).push("r.category_id = ").push_bind(category_id);
            prefix = " AND ";
        }
        if let Some(tag_id) = self.tag_id {
            query
                .push(prefix)
                .push("EXISTS (SELECT 1 FROM recipe_tags rt WHERE rt.recipe_id = r.id AND rt.tag_id = ")
                .push_bind(tag_id)
                .push(")");
            prefix = " AND ";
        }
        if let Some(author_id) = self.author_id {
            query.push(prefix).push("r.author_id = ").push_bind(author_id);
        }
    }
}

pub type RecipeRepository = RecipeRepositoryImpl<Pool<ChosenDB>>;

pub struct RecipeRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> RecipeRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = ChosenDB> + sqlx::Acquire<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateRecipe, author_id: i64) -> Result<Recipe> {
        use sqlx::Acquire as _;
        let mut conn = self.executor.acquire().await?;
        let mut transaction = conn.begin().await?;

        crate::user::check_user(&mut transaction, author_id).await?;
        check_category(&mut transaction, payload.category_id).await?;
        let slug = crate::slug::unique_slug(&mut transaction, "recipe", &payload.title, None).await?;
        let now = crate::now();
        let result = sqlx::query(
            "INSERT INTO recipe (title, content, slug, average_rating, category_id, author_id, created, modified)
            VALUES (?, ?, ?, 0, ?, ?, ?, ?)",
        )
        .bind(&payload.title)
        .bind(&payload.content)
        .bind(&slug)
        .bind(payload.category_id)
        .bind(author_id)
        .bind(now)
        .bind(now)
        .execute(&mut *transaction)
        .await?;
        let id = result.last_insert_rowid();
        set_tags(&mut transaction, id, &payload.tags).await?;

        let recipe = get(id, &mut transaction).await?;
        transaction.commit().await?;
        info!("User {author_id} created recipe {id}");
        Ok(recipe)
    }

    pub async fn update(&self, id: i64, payload: UpdateRecipe) -> Result<Recipe> {
        use sqlx::Acquire as _;
        let mut conn = self.executor.acquire().await?;
        let mut transaction = conn.begin().await?;

        let (title, slug): (String, String) =
            sqlx::query_as("SELECT title, slug FROM recipe WHERE id = ?")
                .bind(id)
                .fetch_one(&mut *transaction)
                .await
                .map_err(Error::not_found("Recipe"))?;
        check_category(&mut transaction, payload.category_id).await?;
        let slug = if title != payload.title {
            crate::slug::unique_slug(&mut transaction, "recipe", &payload.title, Some(id)).await?
        } else {
            slug
        };
        sqlx::query(
            "UPDATE recipe SET title = ?, content = ?, slug = ?, category_id = ?, modified = ? WHERE id = ?",
        )
        .bind(&payload.title)
        .bind(&payload.content)
        .bind(&slug)
        .bind(payload.category_id)
        .bind(crate::now())
        .bind(id)
        .execute(&mut *transaction)
        .await?;

        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?")
            .bind(id)
            .execute(&mut *transaction)
            .await?;
        set_tags(&mut transaction, id, &payload.tags).await?;

        let recipe = get(id, &mut transaction).await?;
        transaction.commit().await?;
        Ok(recipe)
    }

    pub async fn get(&self, id: i64) -> Result<Recipe> {
        use sqlx::Acquire as _;
        let mut conn = self.executor.acquire().await?;
        get(id, &mut conn).await
    }

    /// Id of recipe author, used for permission checks
    pub async fn author_of(&self, id: i64) -> Result<i64> {
        sqlx::query_scalar("SELECT author_id FROM recipe WHERE id = ?")
            .bind(id)
            .fetch_one(&self.executor)
            .await
            .map_err(Error::not_found("Recipe"))
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM recipe WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.executor)
            .await?;
        Ok(found.is_some())
    }

    /// Most recently modified recipes first
    pub async fn list(&self, filter: &RecipeFilter, params: ListingParams) -> Result<Batch<Recipe>> {
        use sqlx::Acquire as _;
        let mut conn = self.executor.acquire().await?;

        let limit = params.limit.min(crate::MAX_LIMIT as i64);
        let mut query = QueryBuilder::<ChosenDB>::new(SELECT_RECIPE);
        filter.push_conditions(&mut query);
        query
            .push(" ORDER BY r.modified DESC, r.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(params.offset);
        let mut rows: Vec<Recipe> = query.build_query_as().fetch_all(&mut *conn).await?;
        load_tags(&mut conn, &mut rows).await?;

        let mut count_query = QueryBuilder::<ChosenDB>::new("SELECT count(*) FROM recipe r");
        filter.push_conditions(&mut count_query);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&mut *conn)
            .await?;

        Ok(Batch {
            offset: params.offset,
            limit,
            total: total as u64,
            rows,
        })
    }

    pub async fn count_by_category(&self, category_id: i64) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM recipe WHERE category_id = ?")
            .bind(category_id)
            .fetch_one(&self.executor)
            .await?;
        Ok(count as u64)
    }

    pub async fn count_by_tag(&self, tag_id: i64) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM recipe_tags WHERE tag_id = ?")
            .bind(tag_id)
            .fetch_one(&self.executor)
            .await?;
        Ok(count as u64)
    }

    /// Deletes recipe with its comments, ratings and tag links
    pub async fn delete(&self, id: i64) -> Result<()> {
        use sqlx::Acquire as _;
        let mut conn = self.executor.acquire().await?;
        let mut transaction = conn.begin().await?;

        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM recipe WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *transaction)
            .await?;
        if found.is_none() {
            return Err(Error::RecordNotFound("Recipe".to_string()));
        }

        for sql in [
            "DELETE FROM comment WHERE recipe_id = ?",
            "DELETE FROM rating WHERE recipe_id = ?",
            "DELETE FROM recipe_tags WHERE recipe_id = ?",
            "DELETE FROM recipe WHERE id = ?",
        ] {
            sqlx::query(sql).bind(id).execute(&mut *transaction).await?;
        }
        transaction.commit().await?;
        info!("Deleted recipe {id}");
        Ok(())
    }
}

async fn check_category(conn: &mut ChosenConnection, category_id: i64) -> Result<()> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM category WHERE id = ?")
        .bind(category_id)
        .fetch_optional(&mut *conn)
        .await?;
    match found {
        Some(_) => Ok(()),
        None => Err(Error::InvalidReference("Category".to_string())),
    }
}

async fn set_tags(conn: &mut ChosenConnection, recipe_id: i64, titles: &[String]) -> Result<()> {
    for title in crate::tag::normalize_titles(titles) {
        let tag_id = crate::tag::get_or_create_id(&mut *conn, &title).await?;
        sqlx::query("INSERT OR IGNORE INTO recipe_tags (recipe_id, tag_id) VALUES (?, ?)")
            .bind(recipe_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn get(id: i64, conn: &mut ChosenConnection) -> Result<Recipe> {
    let mut recipe = sqlx::query_as::<_, Recipe>(&format!("{SELECT_RECIPE} WHERE r.id = ?"))
        .bind(id)
        .fetch_one(&mut *conn)
        .await
        .map_err(Error::not_found("Recipe"))?;
    recipe.tags = sqlx::query_as::<_, TagShort>(
        "SELECT t.id, t.title, t.slug FROM tag t JOIN recipe_tags rt ON rt.tag_id = t.id
        WHERE rt.recipe_id = ? ORDER BY t.title",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(recipe)
}

async fn load_tags(conn: &mut ChosenConnection, recipes: &mut [Recipe]) -> Result<()> {
    if recipes.is_empty() {
        return Ok(());
    }
    let mut query = QueryBuilder::<ChosenDB>::new(
        "SELECT rt.recipe_id, t.id, t.title, t.slug FROM recipe_tags rt
        JOIN tag t ON rt.tag_id = t.id WHERE rt.recipe_id IN (",
    );
    let mut ids = query.separated(", ");
    for recipe in recipes.iter() {
        ids.push_bind(recipe.id);
    }
    query.push(") ORDER BY t.title");

    let links: Vec<(i64, i64, String, String)> = query.build_query_as().fetch_all(&mut *conn).await?;
    debug!("Loaded {} tag links for {} recipes", links.len(), recipes.len());
    let mut tags: HashMap<i64, Vec<TagShort>> = HashMap::new();
    for (recipe_id, id, title, slug) in links {
        tags.entry(recipe_id)
            .or_default()
            .push(TagShort { id, title, slug });
    }
    for recipe in recipes.iter_mut() {
        if let Some(recipe_tags) = tags.remove(&recipe.id) {
            recipe.tags = recipe_tags;
        }
    }
    Ok(())
}
