use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    Router,
    extract::{Request, State},
    middleware::Next,
    response::{Html, Response},
    routing::get,
};

/// Number of requests served from the static file root.
#[derive(Debug, Clone, Default)]
pub struct HitCounter(Arc<AtomicU64>);

impl HitCounter {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Middleware: count every request that reaches the static file server.
pub async fn count_hit(State(hits): State<HitCounter>, req: Request, next: Next) -> Response {
    hits.0.fetch_add(1, Ordering::Relaxed);
    next.run(req).await
}

async fn metrics_page(State(hits): State<HitCounter>) -> Html<String> {
    Html(format!(
        "<html>\n  <body>\n    <h1>Welcome, Chirpy Admin</h1>\n    \
         <p>Chirpy has been visited {} times!</p>\n  </body>\n</html>\n",
        hits.get()
    ))
}

pub fn router(hits: HitCounter) -> Router {
    Router::new()
        .route("/admin/metrics", get(metrics_page))
        .with_state(hits)
}
