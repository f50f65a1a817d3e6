//! HTTP surface: a one-button page and the CSV download behind it.
//!
//! Every download request runs the whole pipeline again; nothing is cached
//! between requests.

use crate::error::CombinerError;
use crate::fetch::ResourceFetcher;
use crate::pipeline::CombinePipeline;
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Download Combined CSV</title>
</head>
<body>
  <h1>Download Combined CSV</h1>
  <form action="/download" method="get">
    <button type="submit">Download CSV</button>
  </form>
</body>
</html>
"#;

/// Bind `addr` and serve until the listener fails
pub async fn serve<F>(pipeline: CombinePipeline<F>, addr: SocketAddr) -> anyhow::Result<()>
where
    F: ResourceFetcher + 'static,
{
    let app = create_router(Arc::new(pipeline));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn create_router<F>(pipeline: Arc<CombinePipeline<F>>) -> Router
where
    F: ResourceFetcher + 'static,
{
    Router::new()
        .route("/", get(index))
        .route("/download", get(download::<F>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(pipeline)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn download<F>(
    State(pipeline): State<Arc<CombinePipeline<F>>>,
) -> Result<impl IntoResponse, ApiError>
where
    F: ResourceFetcher + 'static,
{
    let (bytes, stats) = pipeline.run().await?;
    info!(
        "Serving {} bytes ({} hours)",
        stats.output_bytes, stats.combined_rows
    );

    let disposition = format!(
        "attachment; filename=\"{}\"",
        pipeline.config().attachment_name
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// Pipeline failure rendered as a JSON error body
pub struct ApiError(CombinerError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // upstream sources are at fault for fetch failures
        let status = if self.0.is_fetch() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        error!("Download failed: {}", self.0);

        (
            status,
            Json(json!({
                "error": self.0.to_string()
            })),
        )
            .into_response()
    }
}

impl From<CombinerError> for ApiError {
    fn from(err: CombinerError) -> Self {
        Self(err)
    }
}
