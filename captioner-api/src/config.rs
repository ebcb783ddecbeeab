use captioner_config::SerializableSecretString;
use captioner_config::shared::RetryConfig;
use serde::Deserialize;
use std::fmt;

/// Complete configuration for the captioner API service.
///
/// Contains all settings required to run the service including server
/// settings, the storage bucket, the vision collaborator, and the retry
/// schedule used when applying the bucket access policy at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Application server settings.
    pub application: ApplicationSettings,
    /// Object storage settings.
    pub storage: StorageConfig,
    /// Vision API settings.
    pub vision: VisionConfig,
    /// Retry schedule for the startup bucket policy grant.
    pub policy_retry: RetryConfig,
}

/// HTTP server configuration settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    /// Host address the service listens on.
    pub host: String,
    /// Port number the service listens on.
    ///
    /// The `PORT` environment variable, when set, takes precedence.
    pub port: u16,
    /// Timeout, in seconds, applied to every outbound collaborator request.
    pub upstream_timeout_secs: u64,
}

impl fmt::Display for ApplicationSettings {
    /// Formats application settings for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "    host: {}", self.host)?;
        writeln!(f, "    port: {}", self.port)?;
        writeln!(f, "    upstream timeout: {}s", self.upstream_timeout_secs)
    }
}

/// Google Cloud Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the storage JSON API.
    pub base_url: String,
    /// Base URL under which uploaded objects are publicly reachable.
    pub public_base_url: String,
    /// Name of the bucket uploads are written to.
    pub bucket: String,
    /// Bearer token used to authenticate against the storage API.
    pub auth_token: SerializableSecretString,
}

/// Cloud Vision API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    /// Base URL of the vision API.
    pub base_url: String,
    /// Bearer token used to authenticate against the vision API.
    pub auth_token: SerializableSecretString,
}
