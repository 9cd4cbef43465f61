pub mod config;
pub mod error;
pub mod relay;
pub mod routes;

use std::sync::Arc;

use config::Config;
use relay::registry::Registry;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<Registry>,
}
