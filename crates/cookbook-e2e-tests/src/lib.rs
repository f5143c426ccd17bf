use std::{fmt::Display, path::Path, time::Duration};

use anyhow::{Result, anyhow};
use cookbook_dal::user::{CreateUser, User, UserRepository};
use cookbook_server::config::{Parser, ServerConfig};
use rand::Rng as _;
use reqwest::Url;
use serde_json::json;
use tempfile::TempDir;
use tokio::sync::oneshot;
use tracing::{debug, info};

pub mod rest;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const USER_EMAIL: &str = "cook@example.com";
pub const OTHER_USER_EMAIL: &str = "taster@example.com";
pub const TEST_PASSWORD: &str = "password123";

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
}

pub fn test_config(test_name: &str, base_dir: &Path) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix_in(format!("{}_", test_name), base_dir)?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?;
    let port = port.to_string();
    let base_url = format!("http://localhost:{}", port);
    let args = &[
        "cookbook-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
        "--base-url",
        &base_url,
        "--default-page-size",
        "3",
    ];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

/// Config in fresh temporary data directory with migrated database
pub async fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    let (config, guard) = test_config(test_name, &std::env::temp_dir())?;
    let pool = cookbook_dal::new_pool(&config.backend.database_url()).await?;
    cookbook_dal::migrate(&pool).await?;
    pool.close().await;
    Ok((config, guard))
}

/// Stops server when dropped
pub struct ServerGuard {
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

pub async fn spawn_server(args: ServerConfig) -> Result<ServerGuard> {
    let health_url = args.base_url.join("health")?;
    let state = cookbook_server::build_state(&args).await?;
    let (sender, receiver) = oneshot::channel::<()>();
    let shutdown = async move {
        let _ = receiver.await;
    };
    tokio::spawn(async move {
        if let Err(e) = cookbook_server::run_graceful_with_state(args, state, shutdown).await {
            tracing::error!("Server error: {e}");
        }
    });

    let client = reqwest::Client::new();
    for _ in 0..50 {
        match client.get(health_url.clone()).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Server is ready");
                return Ok(ServerGuard {
                    shutdown: Some(sender),
                });
            }
            _ => tokio::time::sleep(Duration::from_millis(100)).await,
        }
    }
    Err(anyhow!("Server did not start"))
}

pub async fn create_user(
    args: &ServerConfig,
    email: &str,
    roles: Option<Vec<String>>,
) -> Result<User> {
    let pool = cookbook_dal::new_pool(&args.backend.database_url()).await?;
    let repository = UserRepository::new(pool);
    let new_user = CreateUser {
        email: email.parse()?,
        password: TEST_PASSWORD.to_string(),
        roles,
    };
    let user = repository.create(new_user).await?;
    debug!("Created test user {}", user.email);
    Ok(user)
}

/// Client with session and token cookies of logged in user
pub async fn login(base_url: &Url, email: &str, password: &str) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder().cookie_store(true).build()?;
    let response = client
        .post(base_url.join("auth/login")?)
        .json(&json!({"email": email, "password": password}))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(anyhow!("Login failed with status {}", response.status()));
    }
    let response = client.get(base_url.join("auth/token")?).send().await?;
    if !response.status().is_success() {
        return Err(anyhow!("Token failed with status {}", response.status()));
    }
    Ok(client)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestUser {
    Admin,
    User,
    None,
}

/// Creates admin and two regular users, starts server and returns client of chosen user
pub async fn launch_env(args: ServerConfig, user: TestUser) -> Result<(reqwest::Client, ServerGuard)> {
    create_user(&args, ADMIN_EMAIL, Some(vec!["admin".to_string()])).await?;
    create_user(&args, USER_EMAIL, None).await?;
    create_user(&args, OTHER_USER_EMAIL, None).await?;
    let base_url = args.base_url.clone();
    let guard = spawn_server(args).await?;
    let client = match user {
        TestUser::Admin => login(&base_url, ADMIN_EMAIL, TEST_PASSWORD).await?,
        TestUser::User => login(&base_url, USER_EMAIL, TEST_PASSWORD).await?,
        TestUser::None => reqwest::Client::new(),
    };
    Ok((client, guard))
}

pub fn extend_url(url: &Url, segment: impl Display) -> Url {
    let mut url = url.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(&segment.to_string());
    }
    url
}
