pub mod page;

use axum::{body::Bytes, Router};
use supervisor_web::config::ServerConfig;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub page: Bytes,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self, minijinja::Error> {
        let page = crate::views::page::render_page(config)?;
        Ok(Self {
            page: Bytes::from(page),
        })
    }
}

// Every method on every path is answered with the control page.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(page::control_page)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
