use cookbook_dal::{
    Error,
    rating::{CreateRating, RatingRepositoryImpl},
    recipe::RecipeRepositoryImpl,
};

mod common;
use common::init_db;

#[tokio::test]
async fn test_rating_average() {
    let conn = init_db().await;
    let repo = RatingRepositoryImpl::new(conn.clone());

    let outcome = repo.rate(1, 1, CreateRating { value: 5 }).await.unwrap();
    assert_eq!(outcome.average_rating, 5.0);
    assert_eq!(outcome.rating.value, 5);
    assert_eq!(outcome.rating.user_id, 1);

    let outcome = repo.rate(1, 3, CreateRating { value: 2 }).await.unwrap();
    assert_eq!(outcome.average_rating, 3.5);

    let recipes = RecipeRepositoryImpl::new(conn);
    assert_eq!(recipes.get(1).await.unwrap().average_rating, 3.5);
    assert_eq!(recipes.get(2).await.unwrap().average_rating, 0.0);
}

#[tokio::test]
async fn test_rating_twice_updates() {
    let conn = init_db().await;
    let repo = RatingRepositoryImpl::new(conn);

    let first = repo.rate(2, 3, CreateRating { value: 1 }).await.unwrap();
    let second = repo.rate(2, 3, CreateRating { value: 4 }).await.unwrap();
    assert_eq!(first.rating.id, second.rating.id);
    assert_eq!(second.average_rating, 4.0);

    let ratings = repo.list_for_recipe(2).await.unwrap();
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings[0].value, 4);

    let own = repo.get_for_user(2, 3).await.unwrap().unwrap();
    assert_eq!(own.value, 4);
    assert!(repo.get_for_user(2, 1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_rating_missing_recipe() {
    let conn = init_db().await;
    let repo = RatingRepositoryImpl::new(conn);
    let res = repo.rate(100, 3, CreateRating { value: 3 }).await;
    assert!(matches!(res, Err(Error::RecordNotFound(_))));
}

#[tokio::test]
async fn test_rating_unknown_user() {
    let conn = init_db().await;
    let repo = RatingRepositoryImpl::new(conn.clone());
    let res = repo.rate(1, 999, CreateRating { value: 3 }).await;
    assert!(matches!(res, Err(Error::InvalidReference(ref e)) if e == "User"));
    assert!(repo.list_for_recipe(1).await.unwrap().is_empty());

    let recipes = RecipeRepositoryImpl::new(conn);
    assert_eq!(recipes.get(1).await.unwrap().average_rating, 0.0);
}
