use crate::config::StorageConfig;
use crate::retry::{RetryError, RetrySchedule, Transient, retry_with_backoff};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// IAM role granting read access to objects in a bucket.
pub const PUBLIC_READ_ROLE: &str = "roles/storage.objectViewer";

/// IAM member identifier matching every (including anonymous) caller.
pub const ALL_USERS_MEMBER: &str = "allUsers";

/// File extension appended to every generated object key.
const OBJECT_EXTENSION: &str = "jpg";

/// Errors raised by the storage gateway.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The bucket policy was modified between our read and write. Retryable,
    /// since the grant is idempotent.
    #[error("the bucket access policy was modified concurrently")]
    PolicyConflict,

    #[error("storage responded with status {status}: {body}")]
    Unexpected { status: StatusCode, body: String },
}

impl Transient for StorageError {
    fn is_transient(&self) -> bool {
        matches!(self, StorageError::PolicyConflict)
    }
}

/// An IAM policy document as stored on a bucket.
///
/// Only the fields the service touches are modeled; the etag is carried back
/// on writes so the storage service can detect concurrent modification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub bindings: Vec<PolicyBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// A role/members pair inside an IAM policy document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyBinding {
    pub role: String,
    pub members: Vec<String>,
}

impl Policy {
    /// Adds `member` to the binding for `role`, creating the binding if
    /// needed. Returns whether the policy changed; granting an existing
    /// member is a no-op.
    pub fn grant(&mut self, role: &str, member: &str) -> bool {
        if let Some(binding) = self.bindings.iter_mut().find(|b| b.role == role) {
            if binding.members.iter().any(|m| m == member) {
                return false;
            }

            binding.members.push(member.to_string());
            return true;
        }

        self.bindings.push(PolicyBinding {
            role: role.to_string(),
            members: vec![member.to_string()],
        });

        true
    }
}

/// Gateway to the storage JSON API.
///
/// Cheap to clone; the underlying HTTP client is shared.
#[derive(Debug, Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    base_url: String,
    public_base_url: String,
    bucket: String,
    auth_token: SecretString,
}

impl StorageClient {
    pub fn new(http: reqwest::Client, config: &StorageConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            auth_token: config.auth_token.clone().into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Uploads the image bytes under a freshly generated object key and
    /// returns the publicly resolvable URL of the object.
    ///
    /// Keys are random v4 uuids with a fixed extension, so concurrent uploads
    /// never overwrite each other.
    pub async fn upload_image(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let object_name = format!("{}.{OBJECT_EXTENSION}", Uuid::new_v4());
        let url = format!("{}/upload/storage/v1/b/{}/o", self.base_url, self.bucket);

        let response = self
            .http
            .post(&url)
            .query(&[("uploadType", "media"), ("name", object_name.as_str())])
            .header(CONTENT_TYPE, content_type)
            .bearer_auth(self.auth_token.expose_secret())
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Unexpected { status, body });
        }

        debug!(%object_name, bucket = %self.bucket, "uploaded image to bucket");

        Ok(format!(
            "{}/{}/{object_name}",
            self.public_base_url, self.bucket
        ))
    }

    /// Grants public read access on the bucket if it is not granted already.
    ///
    /// Read-modify-write against the live policy document. The write carries
    /// the etag from the read, so a concurrent modification surfaces as
    /// [`StorageError::PolicyConflict`].
    pub async fn ensure_public_read(&self) -> Result<(), StorageError> {
        let mut policy = self.get_iam_policy().await?;

        if !policy.grant(PUBLIC_READ_ROLE, ALL_USERS_MEMBER) {
            debug!(bucket = %self.bucket, "bucket policy already grants public read");
            return Ok(());
        }

        self.set_iam_policy(&policy).await
    }

    async fn get_iam_policy(&self) -> Result<Policy, StorageError> {
        let url = format!("{}/storage/v1/b/{}/iam", self.base_url, self.bucket);

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.auth_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Unexpected { status, body });
        }

        Ok(response.json::<Policy>().await?)
    }

    async fn set_iam_policy(&self, policy: &Policy) -> Result<(), StorageError> {
        let url = format!("{}/storage/v1/b/{}/iam", self.base_url, self.bucket);

        let response = self
            .http
            .put(&url)
            .bearer_auth(self.auth_token.expose_secret())
            .json(policy)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::CONFLICT || status == StatusCode::PRECONDITION_FAILED {
            return Err(StorageError::PolicyConflict);
        }

        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Unexpected { status, body })
    }
}

/// Startup gate: grants public read access on the bucket, retrying policy
/// conflicts with exponential backoff.
///
/// The caller must not start accepting requests until this returns `Ok`;
/// failure is fatal to the process.
pub async fn authorize_public_read(
    client: &StorageClient,
    schedule: &RetrySchedule,
) -> Result<(), RetryError<StorageError>> {
    retry_with_backoff(schedule, "bucket public-read grant", async || {
        client.ensure_public_read().await
    })
    .await?;

    info!(bucket = %client.bucket(), "bucket grants public read access");

    Ok(())
}
