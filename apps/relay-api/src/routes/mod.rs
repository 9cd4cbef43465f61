pub mod health;
pub mod sessions;

use axum::Router;
use utoipa::OpenApi;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(crate::relay::server::router())
        .nest("/api", sessions::router())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        sessions::create_session,
        sessions::list_sessions,
        sessions::get_session,
        sessions::delete_session,
    ),
    components(schemas(
        crate::error::ApiErrorBody,
        crate::error::ApiErrorDetail,
        crate::error::FieldError,
        crate::relay::registry::SessionInfo,
        sessions::CreateSessionRequest,
        sessions::ListSessionsResponse,
        health::HealthResponse,
    )),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Sessions", description = "Session management"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_doc_covers_the_session_surface() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/health"));
        assert!(doc.paths.paths.contains_key("/api/sessions"));
        assert!(doc.paths.paths.contains_key("/api/sessions/{id}"));
        assert!(doc.to_pretty_json().is_ok());
    }
}
