use cookbook_e2e_tests::{prepare_env, spawn_server};
use tracing::info;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_health() {
    let (args, _config_guard) = prepare_env("test_health").await.unwrap();
    let base_url = args.base_url.clone();
    let _server = spawn_server(args).await.unwrap();

    let response = reqwest::get(base_url.join("health").unwrap()).await.unwrap();
    info!("Response: {:#?}", response);
    assert!(response.status().is_success());
    assert_eq!("OK", response.text().await.unwrap());
}
