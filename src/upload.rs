//! Image host upload adapter.
//!
//! One unsigned multipart POST per image against the cloud-name-scoped
//! endpoint; the response carries either a public `secure_url` or a
//! structured error message. With blank or placeholder credentials nothing is
//! sent; callers fall back to a manually pasted URL instead.

use serde::Deserialize;

use crate::models::BrandingConfig;

const UPLOAD_ENDPOINT_BASE: &str = "https://api.cloudinary.com/v1_1";
const PLACEHOLDER_MARKER: &str = "YOUR_";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Cloud name or upload preset is blank/placeholder; prompt for a pasted
    /// URL instead of attempting the request.
    #[error("image host credentials are not configured")]
    NotConfigured,

    /// The host answered with an error, e.g. a preset that is not unsigned.
    #[error("upload rejected: {0}")]
    Rejected(String),

    #[error("image host unreachable: {0}")]
    Network(String),
}

/// An image the admin supplied: either a URL pasted directly, or raw bytes
/// that must go through the uploader.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Url(String),
    File { bytes: Vec<u8>, filename: String },
}

pub struct ImageUploader {
    client: reqwest::Client,
    cloud_name: String,
    upload_preset: String,
}

impl ImageUploader {
    pub fn new(cloud_name: &str, upload_preset: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name: cloud_name.to_string(),
            upload_preset: upload_preset.to_string(),
        }
    }

    /// Credentials live on the branding document so the admin can change
    /// them from the setup screen without redeploying.
    pub fn from_branding(branding: &BrandingConfig) -> Self {
        Self::new(
            &branding.cloudinary_cloud_name,
            &branding.cloudinary_upload_preset,
        )
    }

    pub fn is_configured(&self) -> bool {
        let usable = |value: &str| !value.trim().is_empty() && !value.contains(PLACEHOLDER_MARKER);
        usable(&self.cloud_name) && usable(&self.upload_preset)
    }

    /// Uploads one file and returns its public URL.
    pub async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<String, UploadError> {
        if !self.is_configured() {
            return Err(UploadError::NotConfigured);
        }

        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone());

        let url = format!("{UPLOAD_ENDPOINT_BASE}/{}/image/upload", self.cloud_name);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| UploadError::Network(err.to_string()))?;

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|err| UploadError::Network(err.to_string()))?;

        match body.secure_url {
            Some(url) => Ok(url),
            None => Err(UploadError::Rejected(
                body.error
                    .map(|err| err.message)
                    .unwrap_or_else(|| "upload preset must allow unsigned uploads".to_string()),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    error: Option<UploadApiError>,
}

#[derive(Debug, Deserialize)]
struct UploadApiError {
    message: String,
}

/// Resolves an [`ImageSource`] to a public URL. A pasted URL passes through
/// untouched with no network call, so image fields keep working with blank
/// upload credentials.
pub async fn resolve_image_source(
    uploader: &ImageUploader,
    source: ImageSource,
) -> Result<String, UploadError> {
    match source {
        ImageSource::Url(url) => Ok(url),
        ImageSource::File { bytes, filename } => uploader.upload(bytes, &filename).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_or_placeholder_credentials_disable_uploads() {
        assert!(!ImageUploader::new("", "").is_configured());
        assert!(!ImageUploader::new("demo-cloud", "").is_configured());
        assert!(!ImageUploader::new("YOUR_CLOUD_NAME", "ml_default").is_configured());
        assert!(ImageUploader::new("demo-cloud", "ml_default").is_configured());
    }

    #[tokio::test]
    async fn unconfigured_upload_fails_without_network() {
        let uploader = ImageUploader::new("", "");
        let result = uploader.upload(vec![1, 2, 3], "cut.jpg").await;
        assert!(matches!(result, Err(UploadError::NotConfigured)));
    }

    #[tokio::test]
    async fn pasted_url_passes_through_even_when_unconfigured() {
        let uploader = ImageUploader::new("", "");
        let url = resolve_image_source(
            &uploader,
            ImageSource::Url("https://cdn.example.com/cut.jpg".to_string()),
        )
        .await
        .expect("passthrough");
        assert_eq!(url, "https://cdn.example.com/cut.jpg");
    }

    #[test]
    fn rejection_message_comes_from_response_body() {
        let body: UploadResponse = serde_json::from_value(serde_json::json!({
            "error": { "message": "Upload preset must be whitelisted" }
        }))
        .expect("decode");
        assert!(body.secure_url.is_none());
        assert_eq!(
            body.error.expect("error").message,
            "Upload preset must be whitelisted"
        );
    }
}
