use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod health_check;
pub mod index;
pub mod uploads;

/// JSON body returned for every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorMessage {
    #[schema(example = "an error occurred in the api")]
    pub error: String,
}
