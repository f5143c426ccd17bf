use std::sync::Arc;

use cookbook_auth::token::TokenManager;
use cookbook_dal::Pool;
use url::Url;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(app_config: AppConfig, pool: Pool, tokens: TokenManager) -> Self {
        AppState {
            state: Arc::new(AppStateInner {
                app_config,
                pool,
                tokens,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.state.tokens
    }
}

struct AppStateInner {
    pool: Pool,
    app_config: AppConfig,
    tokens: TokenManager,
}

pub struct AppConfig {
    pub base_url: Url,
    pub default_page_size: u32,
}

impl AppConfig {
    /// Cookies are marked secure only when served over https
    pub fn secure_cookies(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}
