use anyhow::{Result, anyhow};
use libcat_dal::user::{CreateUser, User, UserRepository};
use libcat_server::config::{Parser, ServerConfig};
use rand::Rng as _;
use reqwest::Url;
use serde_json::json;
use tempfile::TempDir;
use tracing::debug;

pub mod rest;

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, std::time::Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
}

pub fn test_config(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix(format!("{}_", test_name))?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?;
    let port = port.to_string();
    let base_url = format!("http://localhost:{}", port);
    let args = &[
        "libcat-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
        "--base-url",
        &base_url,
    ];
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

/// Creates test config and an empty migrated database, so tests can seed
/// records before the server starts.
pub async fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    let (config, guard) = test_config(test_name)?;
    let pool = libcat_dal::new_pool(&config.database_url()).await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;
    Ok((config, guard))
}

/// Well known test identities.
#[derive(Debug, Clone, Copy)]
pub enum TestUser {
    Member,
    Librarian,
    Admin,
}

impl TestUser {
    pub fn email(&self) -> &'static str {
        match self {
            TestUser::Member => "member@example.com",
            TestUser::Librarian => "librarian@example.com",
            TestUser::Admin => "admin@example.com",
        }
    }

    pub fn password(&self) -> &'static str {
        "testpassword"
    }

    fn roles(&self) -> Option<Vec<String>> {
        match self {
            TestUser::Member => None,
            TestUser::Librarian => Some(vec!["librarian".to_string()]),
            TestUser::Admin => Some(vec!["admin".to_string()]),
        }
    }
}

pub async fn create_test_user(database_url: &str, who: TestUser) -> Result<User> {
    let pool = libcat_dal::new_pool(database_url).await?;
    let user_registry = UserRepository::new(pool);
    let user = user_registry
        .create(CreateUser {
            email: who.email().parse()?,
            name: None,
            password: Some(who.password().to_string()),
            roles: who.roles(),
        })
        .await?;
    Ok(user)
}

/// Starts the server on its configured port and waits until it answers on
/// /health.
pub async fn spawn_server(args: ServerConfig) -> Result<()> {
    let base_url = args.base_url.clone();
    tokio::spawn(async move {
        if let Err(e) = libcat_server::run(args).await {
            eprintln!("Server failed: {e}");
        }
    });

    let health_url = base_url.join("health")?;
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if let Ok(response) = client.get(health_url.clone()).send().await {
            if response.status().is_success() {
                return Ok(());
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    Err(anyhow!("Server did not come up"))
}

/// Client holding a session cookie, not following redirects, so tests can
/// assert on the redirect responses themselves.
pub fn client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    Ok(client)
}

/// Signs the client in, which stores the session cookie on it.
pub async fn login(client: &reqwest::Client, base_url: &Url, who: TestUser) -> Result<()> {
    let response = client
        .post(base_url.join("auth/login")?)
        .json(&json!({"email": who.email(), "password": who.password()}))
        .send()
        .await?;
    debug!("Login response: {:#?}", response);
    if !response.status().is_redirection() {
        return Err(anyhow!("Login failed with status {}", response.status()));
    }
    Ok(())
}

/// Starts the server with one seeded user and returns a client already
/// signed in as that user.
pub async fn launch_env(args: ServerConfig, who: TestUser) -> Result<(reqwest::Client, User)> {
    let user = create_test_user(&args.database_url(), who).await?;
    let base_url = args.base_url.clone();
    spawn_server(args).await?;

    let client = client()?;
    login(&client, &base_url, who).await?;
    Ok((client, user))
}

pub fn extend_url(base: &Url, segment: impl std::fmt::Display) -> Url {
    let mut url = base.clone();
    url.path_segments_mut()
        .expect("base url cannot be a base")
        .push(&segment.to_string());
    url
}
