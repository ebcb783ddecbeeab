use actix_multipart::MultipartError;
use actix_multipart::form::{MultipartForm, bytes::Bytes};
use actix_web::{
    HttpRequest, HttpResponse, Responder, ResponseError,
    http::{StatusCode, header::ContentType},
    post,
    web::{Data, Json},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use utoipa::ToSchema;

use crate::routes::ErrorMessage;
use crate::storage::{StorageClient, StorageError};
use crate::vision::{CaptionError, VisionClient};

/// Content type assumed when the upload does not declare one.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no image file provided")]
    MissingImage,

    /// The request body could not be parsed as a multipart form.
    #[error("invalid multipart payload: {0}")]
    Multipart(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Caption(#[from] CaptionError),
}

impl ResponseError for UploadError {
    fn status_code(&self) -> StatusCode {
        match self {
            UploadError::MissingImage | UploadError::Multipart(_) => StatusCode::BAD_REQUEST,
            // Storage and caption failures are kept distinct internally but
            // both surface as a generic server error.
            UploadError::Storage(_) | UploadError::Caption(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_message = ErrorMessage {
            error: self.to_string(),
        };
        let body =
            serde_json::to_string(&error_message).expect("failed to serialize error message");
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(body)
    }
}

/// Multipart form carrying the uploaded image under the `image` field.
#[derive(Debug, MultipartForm)]
pub struct UploadForm {
    #[multipart(limit = "10MB")]
    pub image: Option<Bytes>,
}

/// Wraps multipart extraction failures so they produce the same
/// `ErrorMessage` JSON body as handler errors instead of actix-multipart's
/// plain-text response. Installed via `MultipartFormConfig::error_handler`.
pub fn handle_multipart_error(err: MultipartError, _req: &HttpRequest) -> actix_web::Error {
    UploadError::Multipart(err.to_string()).into()
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    #[schema(example = "https://storage.googleapis.com/captioner-uploads/6f9a.jpg")]
    pub image_url: String,
    #[schema(example = "This image likely contains: Dog, Pet, Mammal.")]
    pub caption: String,
}

#[utoipa::path(
    summary = "Upload an image and caption it",
    description = "Stores the uploaded image in the bucket and derives a caption from its top labels.",
    responses(
        (status = 200, description = "Image stored and captioned.", body = UploadResponse),
        (status = 400, description = "No image file in the request.", body = ErrorMessage),
        (status = 500, description = "Storage or captioning failed.", body = ErrorMessage),
    ),
    tag = "Uploads",
)]
#[post("/upload")]
pub async fn upload_image(
    storage: Data<StorageClient>,
    vision: Data<VisionClient>,
    MultipartForm(form): MultipartForm<UploadForm>,
) -> Result<impl Responder, UploadError> {
    let image = form.image.ok_or(UploadError::MissingImage)?;

    let filename = image
        .file_name
        .clone()
        .unwrap_or_else(|| "unnamed".to_string());
    let content_type = image
        .content_type
        .as_ref()
        .map(|mime| mime.to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

    info!(filename = %filename, size = image.data.len(), "received image upload");

    let image_url = storage
        .upload_image(image.data.to_vec(), &content_type)
        .await?;
    let caption = vision.caption(&image_url).await?;

    info!(image_url = %image_url, caption = %caption, "generated caption for uploaded image");

    Ok(Json(UploadResponse { image_url, caption }))
}
