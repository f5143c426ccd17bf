use cookbook_types::config::BackendConfig;

pub mod change_password;
pub mod create_user;
pub mod seed;

#[allow(async_fn_in_trait)]
pub trait Executor {
    async fn run(self) -> anyhow::Result<()>;
}

/// Opens database, creating it with current schema when needed
pub(crate) async fn open_pool(backend: &BackendConfig) -> anyhow::Result<cookbook_dal::Pool> {
    backend.ensure_data_dir()?;
    let pool = cookbook_dal::new_pool(&backend.database_url()).await?;
    cookbook_dal::migrate(&pool).await?;
    Ok(pool)
}
