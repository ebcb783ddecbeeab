use std::net::TcpListener;
use std::time::Duration;

use actix_multipart::form::MultipartFormConfig;
use actix_web::{App, HttpResponse, HttpServer, dev::Server, web};
use tracing::error;
use tracing_actix_web::TracingLogger;
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::retry::RetrySchedule;
use crate::routes::{
    ErrorMessage,
    health_check::{HealthResponse, health_check},
    index::upload_page,
    uploads::{UploadResponse, handle_multipart_error, upload_image},
};
use crate::storage::{StorageClient, authorize_public_read};
use crate::vision::VisionClient;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    /// Builds the application: collaborator clients, the startup bucket
    /// authorization gate, and the HTTP server.
    ///
    /// The listener is not created until the bucket grants public read
    /// access, so the service never accepts an upload it could not serve
    /// back publicly.
    pub async fn build(config: ApiConfig) -> Result<Self, anyhow::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.application.upstream_timeout_secs))
            .build()?;
        let storage = StorageClient::new(http.clone(), &config.storage);
        let vision = VisionClient::new(http, &config.vision);

        let schedule = RetrySchedule::from(&config.policy_retry);
        if let Err(e) = authorize_public_read(&storage, &schedule).await {
            error!(
                bucket = %config.storage.bucket,
                error = %e,
                "failed to authorize public read access on the bucket"
            );
            return Err(e.into());
        }

        let address = format!("{}:{}", config.application.host, config.application.port);
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let server = run(listener, storage, vision)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

async fn openapi_spec(doc: web::Data<utoipa::openapi::OpenApi>) -> HttpResponse {
    HttpResponse::Ok().json(doc.get_ref())
}

/// Builds the HTTP server on an already bound listener.
///
/// Kept separate from [`Application::build`] so tests can spawn the server
/// with collaborator clients pointed at mock endpoints and without the
/// startup authorization gate.
pub fn run(
    listener: TcpListener,
    storage: StorageClient,
    vision: VisionClient,
) -> Result<Server, anyhow::Error> {
    #[derive(OpenApi)]
    #[openapi(
        paths(
            crate::routes::health_check::health_check,
            crate::routes::index::upload_page,
            crate::routes::uploads::upload_image,
        ),
        components(schemas(ErrorMessage, HealthResponse, UploadResponse))
    )]
    struct ApiDoc;

    let storage = web::Data::new(storage);
    let vision = web::Data::new(vision);
    let openapi = web::Data::new(ApiDoc::openapi());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .service(upload_page)
            .service(upload_image)
            .service(health_check)
            .route("/api-docs/openapi.json", web::get().to(openapi_spec))
            .app_data(MultipartFormConfig::default().error_handler(handle_multipart_error))
            .app_data(storage.clone())
            .app_data(vision.clone())
            .app_data(openapi.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
