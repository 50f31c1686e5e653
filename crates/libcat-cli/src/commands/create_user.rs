use clap::Parser;
use libcat_types::{claim::Role, config::BackendConfig, general::ValidEmail};

use crate::commands::{Executor, create_user_repository};

#[derive(Parser, Debug)]
pub struct CreateUserCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(short, long, help = "User name")]
    name: Option<String>,
    #[arg(short, long, help = "User email, used as username")]
    pub email: ValidEmail,
    #[arg(short, long, help = "User password")]
    pub password: String,
    #[arg(short, long, num_args=0..,
        value_delimiter = ';', help = "Roles of the user, semicolon separated or used multiple times, currently admin and librarian are supported, not hierarchical - add all roles the user should have")]
    pub roles: Vec<Role>,
}

impl Executor for CreateUserCmd {
    async fn run(self) -> anyhow::Result<()> {
        let repository = create_user_repository(&self.backend.database_url()).await?;
        let roles: Vec<String> = self.roles.iter().map(|r| r.to_string()).collect();
        let new_user = libcat_dal::user::CreateUser {
            name: self.name,
            email: self.email,
            password: Some(self.password),
            roles: if roles.is_empty() { None } else { Some(roles) },
        };
        let user = repository.create(new_user).await?;
        println!("Created user {} with id {}", user.email, user.id);

        Ok(())
    }
}
