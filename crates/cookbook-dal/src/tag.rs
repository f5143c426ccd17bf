use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ChosenConnection, error::Result};

classifier_repository!(
    entity = Tag,
    create = CreateTag,
    repository = TagRepository,
    repository_impl = TagRepositoryImpl,
    table = "tag",
    min_title = 1,
    usage = "SELECT count(DISTINCT recipe_id) FROM recipe_tags WHERE tag_id = ?",
);

pub type UpdateTag = CreateTag;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TagShort {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

impl<'c, E> TagRepositoryImpl<E>
where
    for<'a> &'a E:
        sqlx::Executor<'c, Database = crate::ChosenDB> + sqlx::Acquire<'c, Database = crate::ChosenDB>,
{
    pub async fn find_by_title(&self, title: &str) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>(
            "SELECT id, title, slug, created, modified FROM tag WHERE title = ?",
        )
        .bind(title.trim())
        .fetch_optional(&self.executor)
        .await?;
        Ok(tag)
    }

    pub async fn get_or_create(&self, title: &str) -> Result<Tag> {
        use sqlx::Acquire as _;
        let title = clean_title(title)?;
        let mut conn = self.executor.acquire().await?;
        let mut transaction = conn.begin().await?;
        let id = get_or_create_id(&mut transaction, title).await?;
        let tag = get(id, &mut *transaction).await?;
        transaction.commit().await?;
        Ok(tag)
    }
}

/// Normalizes list of tag titles - trims them, skips empty and duplicate ones
pub fn normalize_titles<S: AsRef<str>>(titles: &[S]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(titles.len());
    for title in titles {
        let title = title.as_ref().trim();
        if !title.is_empty() && !normalized.iter().any(|t| t == title) {
            normalized.push(title.to_string());
        }
    }
    normalized
}

pub(crate) async fn get_or_create_id(conn: &mut ChosenConnection, title: &str) -> Result<i64> {
    let title = title.trim();
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM tag WHERE title = ?")
        .bind(title)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let slug = crate::slug::unique_slug(conn, "tag", title, None).await?;
    let now = crate::now();
    let result =
        sqlx::query("INSERT INTO tag (title, slug, created, modified) VALUES (?, ?, ?, ?)")
            .bind(title)
            .bind(&slug)
            .bind(now)
            .bind(now)
            .execute(&mut *conn)
            .await?;
    debug!("Created new tag {title}");
    Ok(result.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_titles() {
        let titles = normalize_titles(&[" soup", "", "vegan ", "soup", "  "]);
        assert_eq!(titles, vec!["soup".to_string(), "vegan".to_string()]);
        assert!(normalize_titles::<&str>(&[]).is_empty());
    }
}
