use crate::db::UserStore;
use crate::server::routes::users;
use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
};
use std::time::Instant;
use tracing::info;

/// Shared handler state. Cloneable; the store is an explicit handle, not a
/// process-wide singleton.
#[derive(Clone)]
pub struct RosterState {
    pub store: UserStore,
}

impl RosterState {
    pub fn new(store: UserStore) -> Self {
        Self { store }
    }
}

/// Access log: one line per handled request.
async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    info!(
        %method,
        path,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "Request handled"
    );
    response
}

pub fn roster_router(state: RosterState) -> Router {
    Router::new()
        .merge(users::router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
