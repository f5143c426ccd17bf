use cookbook_dal::{
    Error,
    rating::{CreateRating, RatingRepositoryImpl},
    recipe::RecipeRepositoryImpl,
    user::{ChangeOwnPassword, CreateUser, UpdateUser, UserRepositoryImpl},
};
use cookbook_types::claim::Role;

mod common;
use common::init_db;

fn new_user(email: &str) -> CreateUser {
    CreateUser {
        email: email.parse().unwrap(),
        password: "kitchen-secret".to_string(),
        roles: None,
    }
}

#[tokio::test]
async fn test_user_create_and_login() {
    let conn = init_db().await;
    let repo = UserRepositoryImpl::new(conn);

    let user = repo.create(new_user("chef@example.com")).await.unwrap();
    assert_eq!(user.roles, vec![Role::User]);

    let logged = repo
        .check_password("chef@example.com", "kitchen-secret")
        .await
        .unwrap();
    assert_eq!(logged.id, user.id);
    assert!(matches!(
        repo.check_password("chef@example.com", "wrong").await,
        Err(Error::InvalidCredentials)
    ));
    assert!(matches!(
        repo.check_password("nobody@example.com", "kitchen-secret")
            .await,
        Err(Error::InvalidCredentials)
    ));

    assert!(matches!(
        repo.create(new_user("chef@example.com")).await,
        Err(Error::DuplicateRecord(_))
    ));
    assert_eq!(repo.count().await.unwrap(), 4);
    assert_eq!(repo.list(100).await.unwrap()[0].email, "admin@example.com");
    assert!(repo.get(1).await.unwrap().roles.contains(&Role::Admin));
}

#[tokio::test]
async fn test_user_passwords() {
    let conn = init_db().await;
    let repo = UserRepositoryImpl::new(conn);
    let user = repo.create(new_user("chef@example.com")).await.unwrap();

    let wrong = ChangeOwnPassword {
        current_password: "not-it".to_string(),
        new_password: "new-secret".to_string(),
        confirm_new_password: "new-secret".to_string(),
    };
    assert!(matches!(
        repo.change_own_password(user.id, wrong).await,
        Err(Error::InvalidCredentials)
    ));

    let change = ChangeOwnPassword {
        current_password: "kitchen-secret".to_string(),
        new_password: "new-secret".to_string(),
        confirm_new_password: "new-secret".to_string(),
    };
    repo.change_own_password(user.id, change).await.unwrap();
    repo.check_password("chef@example.com", "new-secret")
        .await
        .unwrap();

    repo.change_password("chef@example.com", "third-secret")
        .await
        .unwrap();
    repo.check_password("chef@example.com", "third-secret")
        .await
        .unwrap();
    assert!(matches!(
        repo.set_password(999, "whatever-secret").await,
        Err(Error::RecordNotFound(_))
    ));
}

#[tokio::test]
async fn test_update_email() {
    let conn = init_db().await;
    let repo = UserRepositoryImpl::new(conn);

    let user = repo
        .update_email(
            2,
            UpdateUser {
                email: "chef@example.com".parse().unwrap(),
            },
        )
        .await
        .unwrap();
    assert_eq!(user.email, "chef@example.com");
    assert_eq!(repo.find_by_email("chef@example.com").await.unwrap().id, 2);

    let clash = repo
        .update_email(
            2,
            UpdateUser {
                email: "admin@example.com".parse().unwrap(),
            },
        )
        .await;
    assert!(matches!(clash, Err(Error::DuplicateRecord(_))));
}

#[tokio::test]
async fn test_user_delete() {
    let conn = init_db().await;
    let ratings = RatingRepositoryImpl::new(conn.clone());
    ratings.rate(3, 2, CreateRating { value: 1 }).await.unwrap();
    ratings.rate(3, 1, CreateRating { value: 5 }).await.unwrap();
    ratings.rate(1, 3, CreateRating { value: 2 }).await.unwrap();

    let repo = UserRepositoryImpl::new(conn.clone());
    repo.delete(2).await.unwrap();
    assert!(matches!(repo.get(2).await, Err(Error::RecordNotFound(_))));

    let recipes = RecipeRepositoryImpl::new(conn.clone());
    assert!(!recipes.exists(1).await.unwrap());
    assert!(!recipes.exists(2).await.unwrap());
    let remaining = recipes.get(3).await.unwrap();
    assert_eq!(remaining.average_rating, 5.0);

    let orphans: i64 = sqlx::query_scalar("SELECT count(*) FROM rating WHERE recipe_id = 1")
        .fetch_one(&conn)
        .await
        .unwrap();
    assert_eq!(orphans, 0);
    let comments: i64 = sqlx::query_scalar("SELECT count(*) FROM comment")
        .fetch_one(&conn)
        .await
        .unwrap();
    assert_eq!(comments, 0);

    assert!(matches!(repo.delete(2).await, Err(Error::RecordNotFound(_))));
}
