use clap::{Parser, Subcommand};

use crate::commands::{
    change_password::ChangePasswordCmd, create_user::CreateUserCmd, seed::SeedCmd,
};

#[derive(Parser)]
#[command(
    version,
    about,
    long_about = "CLI for cookbook - manages users and demo data directly in the database."
)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    CreateUser(CreateUserCmd),
    ChangePassword(ChangePasswordCmd),
    Seed(SeedCmd),
}

impl crate::commands::Executor for Command {
    async fn run(self) -> anyhow::Result<()> {
        match self {
            Command::CreateUser(cmd) => cmd.run().await,
            Command::ChangePassword(cmd) => cmd.run().await,
            Command::Seed(cmd) => cmd.run().await,
        }
    }
}
