use crate::routes::AppState;
use axum::{body::Bytes, extract::State, response::Html};

pub async fn control_page(State(state): State<AppState>) -> Html<Bytes> {
    Html(state.page)
}
