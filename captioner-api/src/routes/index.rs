use actix_web::{HttpResponse, Responder, get, http::header::ContentType};

/// Upload page embedded at compile time.
const UPLOAD_PAGE: &str = include_str!("upload_page.html");

#[utoipa::path(
    summary = "Upload page",
    description = "Serves the HTML page used to upload an image from a browser.",
    responses(
        (status = 200, description = "Upload page rendered.", body = String, content_type = "text/html"),
    ),
    tag = "Uploads",
)]
#[get("/")]
pub async fn upload_page() -> impl Responder {
    HttpResponse::Ok()
        .insert_header(ContentType::html())
        .body(UPLOAD_PAGE)
}
