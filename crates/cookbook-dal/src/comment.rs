use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Pool, Row as _};
use tracing::debug;

use crate::{ChosenDB, ChosenRow, Error, error::Result, user::UserShort};

const SELECT_COMMENT: &str = "SELECT c.id, c.content, c.recipe_id, c.created,
u.id AS author_id, u.email AS author_email
FROM comment c JOIN users u ON c.author_id = u.id";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub recipe_id: i64,
    pub author: UserShort,
    pub created: time::PrimitiveDateTime,
}

impl<'r> FromRow<'r, ChosenRow> for Comment {
    fn from_row(row: &'r ChosenRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Comment {
            id: row.try_get("id")?,
            content: row.try_get("content")?,
            recipe_id: row.try_get("recipe_id")?,
            author: UserShort {
                id: row.try_get("author_id")?,
                email: row.try_get("author_email")?,
            },
            created: row.try_get("created")?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateComment {
    #[garde(length(min = 3, max = 5000))]
    pub content: String,
}

pub type CommentRepository = CommentRepositoryImpl<Pool<ChosenDB>>;

pub struct CommentRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> CommentRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = ChosenDB> + sqlx::Acquire<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(
        &self,
        recipe_id: i64,
        author_id: i64,
        payload: CreateComment,
    ) -> Result<Comment> {
        use sqlx::Acquire as _;
        let mut conn = self.executor.acquire().await?;
        let mut transaction = conn.begin().await?;

        let recipe: Option<i64> = sqlx::query_scalar("SELECT id FROM recipe WHERE id = ?")
            .bind(recipe_id)
            .fetch_optional(&mut *transaction)
            .await?;
        if recipe.is_none() {
            return Err(Error::RecordNotFound("Recipe".to_string()));
        }
        crate::user::check_user(&mut transaction, author_id).await?;

        let result = sqlx::query(
            "INSERT INTO comment (content, recipe_id, author_id, created) VALUES (?, ?, ?, ?)",
        )
        .bind(&payload.content)
        .bind(recipe_id)
        .bind(author_id)
        .bind(crate::now())
        .execute(&mut *transaction)
        .await?;

        let comment = get(result.last_insert_rowid(), &mut *transaction).await?;
        transaction.commit().await?;
        debug!("User {author_id} commented recipe {recipe_id}");
        Ok(comment)
    }

    pub async fn get(&self, id: i64) -> Result<Comment> {
        get(id, &self.executor).await
    }

    /// Newest comments first
    pub async fn list_for_recipe(&self, recipe_id: i64) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "{SELECT_COMMENT} WHERE c.recipe_id = ? ORDER BY c.created DESC, c.id DESC"
        ))
        .bind(recipe_id)
        .fetch_all(&self.executor)
        .await?;
        Ok(comments)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM comment WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::RecordNotFound("Comment".to_string()));
        }
        Ok(())
    }
}

async fn get<'c, E>(id: i64, executor: E) -> Result<Comment>
where
    E: sqlx::Executor<'c, Database = ChosenDB>,
{
    sqlx::query_as::<_, Comment>(&format!("{SELECT_COMMENT} WHERE c.id = ?"))
        .bind(id)
        .fetch_one(executor)
        .await
        .map_err(Error::not_found("Comment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_length() {
        let comment = CreateComment {
            content: "ok".to_string(),
        };
        assert!(comment.validate().is_err());
        let comment = CreateComment {
            content: "Tasty!".to_string(),
        };
        assert!(comment.validate().is_ok());
        let comment = CreateComment {
            content: "x".repeat(5001),
        };
        assert!(comment.validate().is_err());
    }
}
