use actix_web::{Responder, get, web::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "OK")]
    pub status: String,
}

#[utoipa::path(
    summary = "API health status",
    description = "Returns status OK when the API is available and responding.",
    responses(
        (status = 200, description = "Health check passed.", body = HealthResponse),
    ),
    tag = "Health",
)]
#[get("/health")]
pub async fn health_check() -> impl Responder {
    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
