use clap::Args;
use cookbook_dal::user::UserRepository;
use cookbook_types::{config::BackendConfig, general::ValidEmail};

use crate::commands::{open_pool, Executor};

#[derive(Args, Debug)]
pub struct ChangePasswordCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(short, long, help = "User email, used as username")]
    pub email: ValidEmail,
    #[arg(short, long, help = "New user password")]
    pub password: String,
}

impl Executor for ChangePasswordCmd {
    async fn run(self) -> anyhow::Result<()> {
        if self.password.chars().count() < 8 {
            anyhow::bail!("Password must have at least 8 characters");
        }
        let repository = UserRepository::new(open_pool(&self.backend).await?);
        repository
            .change_password(self.email.as_ref(), &self.password)
            .await?;
        Ok(())
    }
}
