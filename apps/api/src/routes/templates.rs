use axum::Json;

use crate::templates::{catalog, TemplateInfo};

/// GET /api/v1/templates
/// The template catalog in display order, with premium and photo flags.
pub async fn catalog_handler() -> Json<Vec<TemplateInfo>> {
    Json(catalog())
}
