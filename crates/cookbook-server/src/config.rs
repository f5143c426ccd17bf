use std::time::Duration;

use crate::error::Result;
pub use clap::Parser;
use cookbook_types::config::BackendConfig;
use url::Url;

#[derive(Debug, Clone, clap::Parser)]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 3000,
        env = "COOKBOOK_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,
    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "COOKBOOK_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[arg(
        long,
        env = "COOKBOOK_BASE_URL",
        default_value = "http://localhost:3000",
        help = "Base URL of the server, as visible to users. Cookies are secure only for https"
    )]
    pub base_url: Url,

    #[command(flatten)]
    pub backend: BackendConfig,

    #[arg(
        long,
        env = "COOKBOOK_TOKEN_VALIDITY",
        default_value = "1 day",
        help = "Default token validity in human friendly format (e.g. 1d, 1h, 1m, 1s - or combined)",
        value_parser = humantime::parse_duration
    )]
    pub token_validity: Duration,

    #[arg(
        long,
        env = "COOKBOOK_DEFAULT_PAGE_SIZE",
        default_value = "10",
        help = "Default page size, recipe listings always use it"
    )]
    pub default_page_size: u32,

    #[arg(long, env = "COOKBOOK_CORS", help = "Enable permissive CORS")]
    pub cors: bool,
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }
}
