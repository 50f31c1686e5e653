use clap::Args;
use libcat_types::config::BackendConfig;

use crate::commands::{Executor, create_user_repository};

#[derive(Args, Debug)]
pub struct ListUsersCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(short, long, default_value = "100", help = "Maximum number of users")]
    pub limit: usize,
}

impl Executor for ListUsersCmd {
    async fn run(self) -> anyhow::Result<()> {
        let repository = create_user_repository(&self.backend.database_url()).await?;
        let users = repository.list(self.limit).await?;
        for user in users {
            println!("{}", serde_json::to_string(&user)?);
        }
        Ok(())
    }
}
