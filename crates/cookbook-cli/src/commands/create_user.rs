use clap::Args;
use cookbook_dal::user::{CreateUser, UserRepository};
use cookbook_types::{claim::Role, config::BackendConfig, general::ValidEmail};
use tracing::info;

use crate::commands::{open_pool, Executor};

#[derive(Args, Debug)]
pub struct CreateUserCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(short, long, help = "User email, used as username")]
    pub email: ValidEmail,
    #[arg(short, long, help = "User password, at least 8 characters")]
    pub password: String,
    #[arg(short, long, num_args=0..,
        value_delimiter = ',', help = "Roles of the user, comma separated or used multiple times, admin and user roles are supported, user role is implicit")]
    pub roles: Vec<Role>,
}

impl Executor for CreateUserCmd {
    async fn run(self) -> anyhow::Result<()> {
        if self.password.chars().count() < 8 {
            anyhow::bail!("Password must have at least 8 characters");
        }
        let repository = UserRepository::new(open_pool(&self.backend).await?);
        let roles: Vec<String> = self.roles.iter().map(|r| r.to_string()).collect();
        let new_user = CreateUser {
            email: self.email,
            password: self.password,
            roles: if roles.is_empty() { None } else { Some(roles) },
        };
        let user = repository.create(new_user).await?;
        info!("Created user {} with id {}", user.email, user.id);

        Ok(())
    }
}
