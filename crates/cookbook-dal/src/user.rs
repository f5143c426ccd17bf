use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{Result as HashResult, SaltString, rand_core::OsRng},
};

use cookbook_types::{claim::Role, general::ValidEmail};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use tracing::{debug, info};

use crate::{ChosenConnection, Error, error::Result};

fn hash_password(password: &str) -> HashResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}

fn verify_password(password: &str, password_hash: &str) -> HashResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)?;
    let res = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
    if let Err(e) = res {
        debug!("Invalid password, error {e}");
    }
    Ok(res.is_ok())
}

fn is_valid_role(role: &str, _ctx: &()) -> garde::Result {
    role.parse::<Role>()
        .map_err(|e| garde::Error::new(e.to_string()))
        .map(|_| ())
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateUser {
    #[garde(dive)]
    pub email: ValidEmail,
    #[garde(length(min = 8, max = 255))]
    pub password: String,
    #[garde(inner(inner(custom(is_valid_role))))]
    pub roles: Option<Vec<String>>,
}

/// Self registration, new account gets only [`Role::User`]
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterUser {
    #[garde(dive)]
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub email: ValidEmail,
    #[garde(length(min = 8, max = 255))]
    pub password: String,
    #[garde(matches(password))]
    pub confirm_password: String,
}

impl From<RegisterUser> for CreateUser {
    fn from(value: RegisterUser) -> Self {
        CreateUser {
            email: value.email,
            password: value.password,
            roles: Some(vec![Role::User.to_string()]),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateUser {
    #[garde(dive)]
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub email: ValidEmail,
}

/// Password change by user, requires current password
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChangeOwnPassword {
    #[garde(length(min = 1, max = 255))]
    pub current_password: String,
    #[garde(length(min = 8, max = 255))]
    pub new_password: String,
    #[garde(matches(new_password))]
    pub confirm_new_password: String,
}

/// Password reset by admin
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SetPassword {
    #[garde(length(min = 8, max = 255))]
    pub new_password: String,
    #[garde(matches(new_password))]
    pub confirm_new_password: String,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserInt {
    id: i64,
    email: String,
    roles: Option<String>,
    created: time::PrimitiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    pub id: i64,
    pub email: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<String>))]
    pub roles: Vec<Role>,
    pub created: time::PrimitiveDateTime,
}

impl From<UserInt> for User {
    fn from(value: UserInt) -> Self {
        let mut roles: Vec<Role> = value
            .roles
            .iter()
            .flat_map(|s| s.split(','))
            .filter_map(|s| s.parse().ok())
            .collect();
        if !roles.contains(&Role::User) {
            roles.push(Role::User);
        }
        Self {
            id: value.id,
            email: value.email,
            roles,
            created: value.created,
        }
    }
}

/// Author information embedded in recipes and comments
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserShort {
    pub id: i64,
    pub email: String,
}

pub type UserRepository = UserRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct UserRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> UserRepositoryImpl<E>
where
    for<'a> &'a E:
        sqlx::Executor<'c, Database = crate::ChosenDB> + sqlx::Acquire<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateUser) -> Result<User> {
        let password = hash_password(&payload.password)?;
        let email = payload.email.as_ref();
        let roles = payload.roles.map(|roles| {
            roles
                .iter()
                .map(|r| r.trim().to_lowercase())
                .collect::<Vec<_>>()
                .join(",")
        });
        let result = sqlx::query(
            "INSERT INTO users (email, password, roles, created) VALUES (?, ?, ?, ?)",
        )
        .bind(email)
        .bind(password)
        .bind(roles)
        .bind(crate::now())
        .execute(&self.executor)
        .await
        .map_err(Error::unique_violation("User"))?;

        let id = result.last_insert_rowid();
        info!("Created user {email} with id {id}");
        self.get(id).await
    }

    pub async fn list(&self, limit: usize) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, UserInt>(
            "SELECT id, email, roles, created FROM users ORDER BY email LIMIT ?",
        )
        .bind(limit.min(crate::MAX_LIMIT) as i64)
        .fetch_all(&self.executor)
        .await?
        .into_iter()
        .map(User::from)
        .collect();
        Ok(users)
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM users")
            .fetch_one(&self.executor)
            .await?;
        Ok(count as u64)
    }

    /// Deletes user together with all content created by the user.
    /// Averages of other recipes rated by the user are recomputed.
    pub async fn delete(&self, id: i64) -> Result<()> {
        use sqlx::Acquire as _;
        let mut conn = self.executor.acquire().await?;
        let mut transaction = conn.begin().await?;

        match sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *transaction)
            .await?
        {
            Some(_id) => {
                let rated_recipes: Vec<i64> = sqlx::query_scalar(
                    "SELECT DISTINCT r.recipe_id FROM rating r JOIN recipe rc ON r.recipe_id = rc.id
                    WHERE r.user_id = ? AND rc.author_id != ?",
                )
                .bind(id)
                .bind(id)
                .fetch_all(&mut *transaction)
                .await?;

                const CLEANUP: &[&str] = &[
                    "DELETE FROM comment WHERE author_id = ?1 OR recipe_id IN (SELECT id FROM recipe WHERE author_id = ?1)",
                    "DELETE FROM rating WHERE user_id = ?1 OR recipe_id IN (SELECT id FROM recipe WHERE author_id = ?1)",
                    "DELETE FROM recipe_tags WHERE recipe_id IN (SELECT id FROM recipe WHERE author_id = ?1)",
                    "DELETE FROM recipe WHERE author_id = ?1",
                ];
                for sql in CLEANUP {
                    sqlx::query(sql).bind(id).execute(&mut *transaction).await?;
                }
                sqlx::query("DELETE FROM users WHERE id = ?")
                    .bind(id)
                    .execute(&mut *transaction)
                    .await?;

                for recipe_id in rated_recipes {
                    crate::rating::recompute_average(&mut transaction, recipe_id).await?;
                }
                transaction.commit().await?;
                info!("Deleted user {id}");
                Ok(())
            }
            None => Err(Error::RecordNotFound("User".to_string())),
        }
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        let user: User = sqlx::query_as::<_, UserInt>(
            "SELECT id, email, roles, created FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.executor)
        .await
        .map_err(Error::not_found("User"))?
        .into();
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User> {
        let user: User = sqlx::query_as::<_, UserInt>(
            "SELECT id, email, roles, created FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_one(&self.executor)
        .await
        .map_err(Error::not_found("User"))?
        .into();
        Ok(user)
    }

    pub async fn update_email(&self, id: i64, payload: UpdateUser) -> Result<User> {
        let res = sqlx::query("UPDATE users SET email = ? WHERE id = ?")
            .bind(payload.email.as_ref())
            .bind(id)
            .execute(&self.executor)
            .await
            .map_err(Error::unique_violation("User"))?;
        if res.rows_affected() == 0 {
            return Err(Error::RecordNotFound("User".to_string()));
        }
        self.get(id).await
    }

    pub async fn set_password(&self, id: i64, password: &str) -> Result<()> {
        let hashed_password = hash_password(password)?;
        let res = sqlx::query("UPDATE users SET password = ? WHERE id = ?")
            .bind(hashed_password)
            .bind(id)
            .execute(&self.executor)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::RecordNotFound("User".to_string()));
        }
        Ok(())
    }

    pub async fn change_password(&self, email: &str, password: &str) -> Result<()> {
        let user = self.find_by_email(email).await?;
        self.set_password(user.id, password).await
    }

    /// Sets new password only if current password matches
    pub async fn change_own_password(&self, id: i64, payload: ChangeOwnPassword) -> Result<()> {
        let hashed_password: String = sqlx::query_scalar("SELECT password FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&self.executor)
            .await
            .map_err(Error::not_found("User"))?;
        if !verify_password(&payload.current_password, &hashed_password).unwrap_or(false) {
            return Err(Error::InvalidCredentials);
        }
        self.set_password(id, &payload.new_password).await
    }

    pub async fn check_password(&self, email: &str, password: &str) -> Result<User> {
        let (id, hashed_password): (i64, String) =
            sqlx::query_as("SELECT id, password FROM users WHERE email = ?")
                .bind(email)
                .fetch_one(&self.executor)
                .await
                .map_err(|e| {
                    debug!("User check error: {e}");
                    Error::InvalidCredentials
                })?;
        if verify_password(password, &hashed_password).unwrap_or(false) {
            return self.get(id).await;
        }
        Err(Error::InvalidCredentials)
    }
}

/// Referenced user must exist, deleted users cannot author anything
pub(crate) async fn check_user(conn: &mut ChosenConnection, user_id: i64) -> Result<()> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
    match found {
        Some(_) => Ok(()),
        None => Err(Error::InvalidReference("User".to_string())),
    }
}
