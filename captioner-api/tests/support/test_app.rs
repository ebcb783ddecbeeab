#![allow(dead_code)]

use captioner_api::config::ApiConfig;
use captioner_api::startup::run;
use captioner_api::storage::StorageClient;
use captioner_api::vision::VisionClient;
use captioner_config::{Environment, load_config};
use std::io;
use std::net::TcpListener;
use wiremock::MockServer;

pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub storage: MockServer,
    pub vision: MockServer,
    pub bucket: String,
    server_handle: tokio::task::JoinHandle<io::Result<()>>,
}

impl TestApp {
    pub async fn health(&self) -> reqwest::Response {
        self.api_client
            .get(format!("{}/health", self.address))
            .send()
            .await
            .expect("failed to execute request")
    }

    /// Posts a multipart form with the given field carrying the bytes.
    pub async fn upload_field(&self, field_name: &str, bytes: Vec<u8>) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("photo.jpg")
            .mime_str("image/jpeg")
            .expect("invalid mime type");
        let form = reqwest::multipart::Form::new().part(field_name.to_string(), part);

        self.api_client
            .post(format!("{}/upload", self.address))
            .multipart(form)
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn upload_image(&self, bytes: Vec<u8>) -> reqwest::Response {
        self.upload_field("image", bytes).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

pub async fn spawn_test_app() -> TestApp {
    // We set the environment to dev.
    Environment::Dev.set();

    let base_address = "127.0.0.1";
    let listener =
        TcpListener::bind(format!("{base_address}:0")).expect("failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let storage_server = MockServer::start().await;
    let vision_server = MockServer::start().await;

    let mut config = load_config::<ApiConfig>().expect("Failed to read configuration");
    config.storage.base_url = storage_server.uri();
    config.storage.public_base_url = storage_server.uri();
    config.vision.base_url = vision_server.uri();

    let http = reqwest::Client::new();
    let storage = StorageClient::new(http.clone(), &config.storage);
    let vision = VisionClient::new(http, &config.vision);

    // The startup authorization gate has its own tests; here the bare server
    // is spawned against mock collaborators.
    let server = run(listener, storage, vision).expect("failed to build server");
    let server_handle = tokio::spawn(server);

    TestApp {
        address: format!("http://{base_address}:{port}"),
        api_client: reqwest::Client::new(),
        storage: storage_server,
        vision: vision_server,
        bucket: config.storage.bucket.clone(),
        server_handle,
    }
}
