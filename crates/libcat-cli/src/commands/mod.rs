pub mod change_password;
pub mod create_user;
pub mod list_users;

use libcat_dal::user::UserRepository;

#[allow(async_fn_in_trait)]
pub trait Executor {
    async fn run(self) -> anyhow::Result<()>;
}

pub async fn create_user_repository(database_url: &str) -> anyhow::Result<UserRepository> {
    let pool = sqlx::sqlite::SqlitePool::connect(database_url).await?;
    Ok(UserRepository::new(pool))
}
