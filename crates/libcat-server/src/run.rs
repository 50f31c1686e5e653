use crate::config::ServerConfig;
use crate::error::Result;
use axum::http::StatusCode;
use axum::{Router, response::IntoResponse, routing::get};
use futures::FutureExt;
use libcat_app::state::{AppConfig, AppState};
use libcat_app::{auth::auth_router, catalog, home, user};
use tracing::debug;

pub async fn run(args: ServerConfig) -> Result<()> {
    let state = build_state(&args).await?;
    run_with_state(args, state).await
}

pub async fn run_with_state(args: ServerConfig, state: AppState) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c().map(|_| ());
    run_graceful_with_state(args, state, shutdown).await
}

pub async fn run_graceful_with_state<S>(
    args: ServerConfig,
    state: AppState,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let mut app = main_router(&args, state);

    if !args.no_cors {
        app = app.layer(tower_http::cors::CorsLayer::very_permissive());
    }

    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let addr = std::net::SocketAddr::from((ip, args.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    debug!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

fn main_router(args: &ServerConfig, state: AppState) -> Router<()> {
    let session_store = tower_sessions::MemoryStore::default();
    let session_validity = time::Duration::try_from(args.session_validity)
        .unwrap_or_else(|_| time::Duration::days(1));
    let session_layer = tower_sessions::SessionManagerLayer::new(session_store)
        .with_name("libcat")
        .with_secure(false)
        .with_expiry(tower_sessions::Expiry::OnInactivity(session_validity));

    Router::new()
        .route("/", get(home::index))
        .route("/mybooks", get(catalog::instance::my_borrowed))
        .route("/borrowed_books", get(catalog::instance::all_borrowed))
        .nest("/books", catalog::book::router())
        .nest("/author", catalog::author::router())
        .nest("/genre", catalog::genre::router())
        .nest("/book", catalog::instance::router())
        .nest("/users", user::router())
        .nest("/auth", auth_router())
        .layer(session_layer)
        .with_state(state)
        .route("/health", get(health))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let app_config = AppConfig {
        default_page_size: config.default_page_size,
    };

    let pool = libcat_dal::new_pool(&config.database_url()).await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    Ok(AppState::new(app_config, pool))
}
