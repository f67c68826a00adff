use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

/// Path of the Swagger UI.
const DOCS_PATH: &str = "/docs";
/// Path of the generated OpenAPI document.
const OPENAPI_PATH: &str = "/api-doc/openapi.json";

/// Swagger UI for the game commands, event stream and healthcheck.
pub fn router() -> Router<SharedState> {
    SwaggerUi::new(DOCS_PATH)
        .url(OPENAPI_PATH, ApiDoc::openapi())
        .into()
}
