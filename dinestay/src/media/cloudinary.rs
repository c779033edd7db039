//! Cloudinary media host implementation
//!
//! Talks to the Cloudinary upload API (`/v1_1/{cloud_name}/image/{upload,destroy}`) with signed
//! requests. The signature is the SHA-256 hex digest of the alphabetically sorted signed
//! parameters (`key=value` joined by `&`) with the API secret appended.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::{
    config::CloudinaryConfig,
    db::models::resources::Image,
    media::{MediaError, MediaHost, Result},
};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

pub struct CloudinaryMediaHost {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryMediaHost {
    pub fn new(config: CloudinaryConfig) -> Result<Self> {
        if config.cloud_name.is_empty() || config.api_key.is_empty() || config.api_secret.is_empty() {
            return Err(MediaError::Config("cloud_name, api_key and api_secret are required".to_string()));
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1_1/{}/image/{action}",
            self.config.base_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    /// Sign the given parameters. Callers pass every signed parameter except the API key and
    /// the file itself, which Cloudinary excludes from the signature.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        format!("{:x}", Sha256::digest(format!("{to_sign}{}", self.config.api_secret).as_bytes()))
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => format!("unexpected status {status}"),
        }
    }
}

#[async_trait]
impl MediaHost for CloudinaryMediaHost {
    #[tracing::instrument(skip(self, data), err)]
    async fn upload(&self, data: &str, folder: &str) -> Result<Image> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[("folder", folder), ("timestamp", &timestamp)]);

        let response = self
            .client
            .post(self.endpoint("upload"))
            .json(&json!({
                "file": data,
                "folder": folder,
                "timestamp": timestamp,
                "api_key": self.config.api_key,
                "signature": signature,
                "signature_algorithm": "sha256",
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MediaError::Upload(Self::error_message(response).await));
        }

        let uploaded: UploadResponse = response.json().await?;
        Ok(Image {
            public_id: uploaded.public_id,
            url: uploaded.secure_url,
        })
    }

    #[tracing::instrument(skip(self), err)]
    async fn destroy(&self, public_id: &str) -> Result<()> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[("public_id", public_id), ("timestamp", &timestamp)]);

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .json(&json!({
                "public_id": public_id,
                "timestamp": timestamp,
                "api_key": self.config.api_key,
                "signature": signature,
                "signature_algorithm": "sha256",
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MediaError::Destroy {
                public_id: public_id.to_string(),
                reason: Self::error_message(response).await,
            });
        }

        let destroyed: DestroyResponse = response.json().await?;
        match destroyed.result.as_str() {
            // "not found" means there is nothing left to release
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::Destroy {
                public_id: public_id.to_string(),
                reason: other.to_string(),
            }),
        }
    }
}
