use cookbook_dal::user::{self, User};
use cookbook_e2e_tests::{
    ADMIN_EMAIL, OTHER_USER_EMAIL, TestUser, USER_EMAIL, extend_url, launch_env, login,
    prepare_env, rest::create_recipe,
};
use cookbook_types::general::ValidEmail;
use garde::Validate as _;
use reqwest::StatusCode;
use serde_json::json;
use tracing::info;
use tracing_test::traced_test;

async fn find_user(client: &reqwest::Client, users_url: &reqwest::Url, email: &str) -> User {
    let response = client.get(users_url.clone()).send().await.unwrap();
    assert!(response.status().is_success());
    let users: Vec<User> = response.json().await.unwrap();
    users.into_iter().find(|u| u.email == email).unwrap()
}

#[tokio::test]
#[traced_test]
async fn test_invalid_user_email() {
    let (args, _config_guard) = prepare_env("test_user_invalid_email").await.unwrap();
    let new_user = user::CreateUser {
        email: ValidEmail::cheat("invalid".to_string()),
        password: "password".to_string(),
        roles: Some(vec!["admin".to_string()]),
    };
    assert!(new_user.email.validate().is_err());
    let base_url = args.base_url.clone();

    let (client, _server) = launch_env(args, TestUser::Admin).await.unwrap();

    let url = base_url.join("users").unwrap();
    let response = client.post(url).json(&new_user).send().await.unwrap();
    info!("Response: {:#?}", response);
    assert_eq!(422, response.status().as_u16());
    info!("Response body: {:#?}", response.text().await.unwrap());
}

#[tokio::test]
#[traced_test]
async fn test_invalid_role() {
    let (args, _config_guard) = prepare_env("test_invalid_role").await.unwrap();
    let base_url = args.base_url.clone();
    let (client, _server) = launch_env(args, TestUser::Admin).await.unwrap();

    let url = base_url.join("users").unwrap();
    let response = client
        .post(url)
        .json(&json!({"email": "chef@example.com", "password": "password", "roles": ["admin", "chef"]}))
        .send()
        .await
        .unwrap();
    info!("Response: {:#?}", response);
    assert_eq!(422, response.status().as_u16());
}

#[tokio::test]
#[traced_test]
async fn test_manage_users() {
    let (args, _config_guard) = prepare_env("test_manage_users").await.unwrap();
    let base_url = args.base_url.clone();
    let (client, _server) = launch_env(args, TestUser::Admin).await.unwrap();
    let users_url = base_url.join("users").unwrap();

    let response = client
        .post(users_url.clone())
        .json(&json!({"email": "chef@example.com", "password": "password", "roles": ["admin"]}))
        .send()
        .await
        .unwrap();
    info!("Response: {:#?}", response);
    assert_eq!(201, response.status().as_u16());
    let chef: User = response.json().await.unwrap();
    assert!(chef.roles.contains(&cookbook_types::claim::Role::Admin));

    let response = client
        .post(users_url.clone())
        .json(&json!({"email": "chef@example.com", "password": "password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::CONFLICT, response.status());

    let chef_url = extend_url(&users_url, chef.id);
    let response = client
        .put(chef_url.clone())
        .json(&json!({"email": "head.chef@example.com"}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let chef: User = response.json().await.unwrap();
    assert_eq!("head.chef@example.com", chef.email);

    let response = client
        .put(extend_url(&chef_url, "password"))
        .json(&json!({"new_password": "new-password", "confirm_new_password": "new-password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::NO_CONTENT, response.status());
    login(&base_url, "head.chef@example.com", "new-password")
        .await
        .unwrap();

    let admin = find_user(&client, &users_url, ADMIN_EMAIL).await;
    let response = client
        .delete(extend_url(&users_url, admin.id))
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::CONFLICT, response.status());

    let response = client.delete(chef_url.clone()).send().await.unwrap();
    assert_eq!(StatusCode::NO_CONTENT, response.status());
    let response = client.delete(chef_url).send().await.unwrap();
    assert_eq!(StatusCode::NOT_FOUND, response.status());
}

#[tokio::test]
#[traced_test]
async fn test_users_need_admin() {
    let (args, _config_guard) = prepare_env("test_users_need_admin").await.unwrap();
    let base_url = args.base_url.clone();
    let (client, _server) = launch_env(args, TestUser::User).await.unwrap();
    let users_url = base_url.join("users").unwrap();

    let response = client.get(users_url.clone()).send().await.unwrap();
    assert_eq!(StatusCode::FORBIDDEN, response.status());

    let response = reqwest::get(users_url).await.unwrap();
    assert_eq!(StatusCode::UNAUTHORIZED, response.status());
}

#[tokio::test]
#[traced_test]
async fn test_delete_user_with_content() {
    let (args, _config_guard) = prepare_env("test_delete_user_with_content")
        .await
        .unwrap();
    let base_url = args.base_url.clone();
    let (admin, _server) = launch_env(args, TestUser::Admin).await.unwrap();
    let cook = login(&base_url, USER_EMAIL, cookbook_e2e_tests::TEST_PASSWORD)
        .await
        .unwrap();
    let taster = login(&base_url, OTHER_USER_EMAIL, cookbook_e2e_tests::TEST_PASSWORD)
        .await
        .unwrap();

    let category = cookbook_e2e_tests::rest::create_category(&admin, &base_url, "Soups")
        .await
        .unwrap();
    let cooks_recipe = create_recipe(&cook, &base_url, "Tomato soup", category.id, &[])
        .await
        .unwrap();
    let tasters_recipe = create_recipe(&taster, &base_url, "Onion soup", category.id, &[])
        .await
        .unwrap();
    cookbook_e2e_tests::rest::rate_recipe(&cook, &base_url, tasters_recipe.id, 5)
        .await
        .unwrap();
    cookbook_e2e_tests::rest::rate_recipe(&admin, &base_url, tasters_recipe.id, 2)
        .await
        .unwrap();

    let users_url = base_url.join("users").unwrap();
    let cook_user = find_user(&admin, &users_url, USER_EMAIL).await;
    let response = admin
        .delete(extend_url(&users_url, cook_user.id))
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::NO_CONTENT, response.status());

    let recipe_url = base_url.join("api/recipe/").unwrap();
    let response = admin
        .get(extend_url(&recipe_url, cooks_recipe.id))
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::NOT_FOUND, response.status());

    let response = admin
        .get(extend_url(&recipe_url, tasters_recipe.id))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let recipe: cookbook_dal::recipe::Recipe = response.json().await.unwrap();
    assert_eq!(2.0, recipe.average_rating);
}
