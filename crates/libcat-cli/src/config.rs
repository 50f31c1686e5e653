use clap::{Parser, Subcommand};

use crate::commands::{
    change_password::ChangePasswordCmd, create_user::CreateUserCmd, list_users::ListUsersCmd,
};

#[derive(Parser)]
#[command(
    version,
    about,
    long_about = "CLI for the library catalog - manages users directly in the catalog database."
)]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    CreateUser(CreateUserCmd),
    ListUsers(ListUsersCmd),
    ChangePassword(ChangePasswordCmd),
}

impl crate::commands::Executor for Command {
    async fn run(self) -> anyhow::Result<()> {
        match self {
            Command::CreateUser(cmd) => cmd.run().await,
            Command::ListUsers(cmd) => cmd.run().await,
            Command::ChangePassword(cmd) => cmd.run().await,
        }
    }
}
