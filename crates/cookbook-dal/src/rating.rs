use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use tracing::debug;

use crate::{ChosenConnection, Error, error::Result};

/// Arithmetic mean of rating values, 0 when there are no ratings
pub fn average_rating(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<i64>() as f64 / values.len() as f64
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Rating {
    pub id: i64,
    pub value: i64,
    pub recipe_id: i64,
    pub user_id: i64,
    pub created: time::PrimitiveDateTime,
    pub modified: time::PrimitiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateRating {
    #[garde(range(min = 1, max = 5))]
    pub value: i64,
}

/// Stored rating together with refreshed recipe average
#[derive(Debug, Serialize, Deserialize, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RatingOutcome {
    pub rating: Rating,
    pub average_rating: f64,
}

/// Recalculates average of all ratings of the recipe and stores it in recipe
pub(crate) async fn recompute_average(conn: &mut ChosenConnection, recipe_id: i64) -> Result<f64> {
    let values: Vec<i64> = sqlx::query_scalar("SELECT value FROM rating WHERE recipe_id = ?")
        .bind(recipe_id)
        .fetch_all(&mut *conn)
        .await?;
    let average = average_rating(&values);
    sqlx::query("UPDATE recipe SET average_rating = ? WHERE id = ?")
        .bind(average)
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;
    debug!("Recipe {recipe_id} has now average rating {average} from {} ratings", values.len());
    Ok(average)
}

pub type RatingRepository = RatingRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct RatingRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> RatingRepositoryImpl<E>
where
    for<'a> &'a E:
        sqlx::Executor<'c, Database = crate::ChosenDB> + sqlx::Acquire<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Creates or updates rating of the recipe by the user, there is at most one per user and recipe
    pub async fn rate(
        &self,
        recipe_id: i64,
        user_id: i64,
        payload: CreateRating,
    ) -> Result<RatingOutcome> {
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
        crate::user::check_user(&mut transaction, user_id).await?;

        let now = crate::now();
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM rating WHERE recipe_id = ? AND user_id = ?")
                .bind(recipe_id)
                .bind(user_id)
                .fetch_optional(&mut *transaction)
                .await?;
        let id = match existing {
            Some(id) => {
                sqlx::query("UPDATE rating SET value = ?, modified = ? WHERE id = ?")
                    .bind(payload.value)
                    .bind(now)
                    .bind(id)
                    .execute(&mut *transaction)
                    .await?;
                id
            }
            None => sqlx::query(
                "INSERT INTO rating (value, recipe_id, user_id, created, modified) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(payload.value)
            .bind(recipe_id)
            .bind(user_id)
            .bind(now)
            .bind(now)
            .execute(&mut *transaction)
            .await
            .map_err(Error::unique_violation("Rating"))?
            .last_insert_rowid(),
        };

        let average_rating = recompute_average(&mut transaction, recipe_id).await?;
        let rating = get(id, &mut *transaction).await?;
        transaction.commit().await?;
        Ok(RatingOutcome {
            rating,
            average_rating,
        })
    }

    pub async fn get_for_user(&self, recipe_id: i64, user_id: i64) -> Result<Option<Rating>> {
        let rating = sqlx::query_as::<_, Rating>(
            "SELECT id, value, recipe_id, user_id, created, modified FROM rating
            WHERE recipe_id = ? AND user_id = ?",
        )
        .bind(recipe_id)
        .bind(user_id)
        .fetch_optional(&self.executor)
        .await?;
        Ok(rating)
    }

    pub async fn list_for_recipe(&self, recipe_id: i64) -> Result<Vec<Rating>> {
        let ratings = sqlx::query_as::<_, Rating>(
            "SELECT id, value, recipe_id, user_id, created, modified FROM rating
            WHERE recipe_id = ? ORDER BY id",
        )
        .bind(recipe_id)
        .fetch_all(&self.executor)
        .await?;
        Ok(ratings)
    }
}

async fn get<'c, E>(id: i64, executor: E) -> Result<Rating>
where
    E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    sqlx::query_as::<_, Rating>(
        "SELECT id, value, recipe_id, user_id, created, modified FROM rating WHERE id = ?",
    )
    .bind(id)
    .fetch_one(executor)
    .await
    .map_err(Error::not_found("Rating"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[]), 0.0);
        assert_eq!(average_rating(&[4]), 4.0);
        assert_eq!(average_rating(&[5, 4]), 4.5);
        assert!((average_rating(&[1, 2, 2]) - 5.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rating_range() {
        assert!(CreateRating { value: 0 }.validate().is_err());
        assert!(CreateRating { value: 6 }.validate().is_err());
        assert!(CreateRating { value: 1 }.validate().is_ok());
        assert!(CreateRating { value: 5 }.validate().is_ok());
    }
}
