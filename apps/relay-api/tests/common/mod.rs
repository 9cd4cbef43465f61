use std::sync::Arc;

use axum::Router;

use relay_api::config::Config;
use relay_api::relay::registry::Registry;
use relay_api::AppState;

/// Build an isolated AppState backed by a fresh in-memory registry.
pub fn test_state() -> AppState {
    AppState {
        config: Arc::new(Config {
            port: 0,
            allowed_origins: Vec::new(),
        }),
        registry: Arc::new(Registry::new()),
    }
}

/// Build the full application router with an isolated state.
pub fn test_app() -> (Router, AppState) {
    let state = test_state();
    let app = relay_api::routes::router().with_state(state.clone());
    (app, state)
}
