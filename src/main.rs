mod routes;
mod views;

use supervisor_web::config::ServerConfig;
use tracing::info;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let config = ServerConfig::default();
    config.validate().expect("invalid server configuration");

    let state = routes::AppState::new(&config).expect("failed to render control page");
    let app = routes::build_router(state);

    let server = axum::Server::try_bind(&config.bind_addr).expect("failed to bind listener");
    info!(api_url = %config.api_url, "server listening on http://{}", config.bind_addr);
    server
        .serve(app.into_make_service())
        .await
        .expect("server failed");
}
