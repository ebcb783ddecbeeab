use crate::config::VisionConfig;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Number of top-ranked labels folded into the caption.
const MAX_CAPTION_LABELS: usize = 3;

/// Maximum number of labels requested from the vision API.
const MAX_LABEL_RESULTS: u32 = 10;

/// Caption returned when the vision API finds no labels at all.
const EMPTY_CAPTION: &str = "No recognizable content found in this image.";

/// Errors raised by the caption generator.
#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("vision request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("vision responded with status {status}: {body}")]
    Unexpected { status: StatusCode, body: String },

    /// The vision API answered but reported an error for the image.
    #[error("vision could not annotate the image: {0}")]
    Upstream(String),
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    label_annotations: Vec<LabelAnnotation>,
    error: Option<UpstreamStatus>,
}

#[derive(Debug, Deserialize)]
struct LabelAnnotation {
    description: String,
}

#[derive(Debug, Deserialize)]
struct UpstreamStatus {
    message: String,
}

/// Client for the vision API's label detection.
///
/// Cheap to clone; the underlying HTTP client is shared.
#[derive(Debug, Clone)]
pub struct VisionClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: SecretString,
}

impl VisionClient {
    pub fn new(http: reqwest::Client, config: &VisionConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone().into(),
        }
    }

    /// Asks the vision API for label annotations of the image behind
    /// `image_url` and returns the ranked label descriptions.
    pub async fn label_image(&self, image_url: &str) -> Result<Vec<String>, CaptionError> {
        let url = format!("{}/v1/images:annotate", self.base_url);
        let body = serde_json::json!({
            "requests": [{
                "image": { "source": { "imageUri": image_url } },
                "features": [{ "type": "LABEL_DETECTION", "maxResults": MAX_LABEL_RESULTS }],
            }],
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.auth_token.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CaptionError::Unexpected { status, body });
        }

        let annotated: AnnotateResponse = response.json().await?;
        let image = annotated
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| CaptionError::Upstream("response contained no annotations".into()))?;

        if let Some(error) = image.error {
            return Err(CaptionError::Upstream(error.message));
        }

        let labels: Vec<String> = image
            .label_annotations
            .into_iter()
            .map(|label| label.description)
            .collect();

        debug!(label_count = labels.len(), "vision returned ranked labels");

        Ok(labels)
    }

    /// Produces a caption for the image behind `image_url`.
    pub async fn caption(&self, image_url: &str) -> Result<String, CaptionError> {
        let labels = self.label_image(image_url).await?;

        Ok(format_caption(&labels))
    }
}

/// Formats the ranked labels into a one-sentence caption.
///
/// Uses at most the top three labels. An empty label list yields a fixed
/// fallback sentence rather than a caption with no content.
pub fn format_caption(labels: &[String]) -> String {
    if labels.is_empty() {
        return EMPTY_CAPTION.to_string();
    }

    let top_labels = labels
        .iter()
        .take(MAX_CAPTION_LABELS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    format!("This image likely contains: {top_labels}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn caption_uses_only_the_top_three_labels() {
        let caption = format_caption(&labels(&["Dog", "Pet", "Mammal", "Animal", "Canine"]));

        assert_eq!(caption, "This image likely contains: Dog, Pet, Mammal.");
    }

    #[test]
    fn caption_with_fewer_than_three_labels_has_no_trailing_separator() {
        let caption = format_caption(&labels(&["Dog"]));

        assert_eq!(caption, "This image likely contains: Dog.");

        let caption = format_caption(&labels(&["Dog", "Pet"]));

        assert_eq!(caption, "This image likely contains: Dog, Pet.");
    }

    #[test]
    fn caption_without_labels_falls_back_to_fixed_text() {
        assert_eq!(
            format_caption(&[]),
            "No recognizable content found in this image."
        );
    }
}
