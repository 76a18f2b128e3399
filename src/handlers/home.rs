//! Home page.

use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../templates/index.html");

/// `GET /`
///
/// Serves the static page that launches Plaid Link. No state, no database.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
