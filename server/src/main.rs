mod config;
mod routes;
mod state;

#[tokio::main]
async fn main() {
    // A missing .env file is normal outside local development.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = match config::ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };

    tracing::info!(
        token_format = %config.token_format,
        protected = ?config.policy.protected_routes(),
        public = ?config.policy.public_routes(),
        cookie_secure = config.cookie_secure,
        "route guard configured"
    );

    let port = config.port;
    let app = routes::app(state::AppState::new(&config));

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %port, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(%port, "ballotgate listening");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}
