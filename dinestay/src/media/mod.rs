//! Media host abstraction layer
//!
//! Resource images are not stored by this service. They are uploaded to a media host, and the
//! resource keeps only the returned `{public_id, url}` references. This module defines the
//! [`MediaHost`] trait plus two helpers that implement the compensation rules the resource
//! handlers rely on:
//!
//! - [`upload_all`] uploads a batch sequentially and destroys whatever it already uploaded if a
//!   later upload fails, so a failed batch leaves nothing behind on the host.
//! - [`release`] attempts to destroy every image of a batch and reports the ones that could not
//!   be released.

use async_trait::async_trait;
use std::sync::Arc;

use crate::{config::MediaConfig, db::models::resources::Image};

pub mod cloudinary;
pub mod dummy;

/// Create a media host from configuration
///
/// Adding a new host requires adding a match arm here.
pub fn create_media_host(config: &MediaConfig) -> Result<Arc<dyn MediaHost>> {
    match config {
        MediaConfig::Cloudinary(cloudinary_config) => {
            Ok(Arc::new(cloudinary::CloudinaryMediaHost::new(cloudinary_config.clone())?))
        }
        MediaConfig::Dummy(dummy_config) => Ok(Arc::new(dummy::DummyMediaHost::from(dummy_config.clone()))),
    }
}

/// Result type for media host operations
pub type Result<T> = std::result::Result<T, MediaError>;

/// Errors that can occur while talking to the media host
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Upload rejected by media host: {0}")]
    Upload(String),

    #[error("Failed to destroy image {public_id}: {reason}")]
    Destroy { public_id: String, reason: String },

    #[error("Media host request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid media host configuration: {0}")]
    Config(String),
}

impl MediaError {
    /// Whether the failure happened while removing media (as opposed to adding it)
    pub fn is_removal(&self) -> bool {
        matches!(self, MediaError::Destroy { .. })
    }
}

/// Abstract media host interface
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Upload one image into `folder`.
    ///
    /// `data` is whatever the host accepts as a file source: a `data:` URI, or a remote URL for
    /// the host to fetch.
    async fn upload(&self, data: &str, folder: &str) -> Result<Image>;

    /// Remove a previously uploaded image.
    async fn destroy(&self, public_id: &str) -> Result<()>;
}

/// Upload every source in order. On the first failure, destroy the images this call already
/// uploaded and return the upload error.
pub async fn upload_all(host: &dyn MediaHost, sources: &[String], folder: &str) -> Result<Vec<Image>> {
    let mut uploaded = Vec::with_capacity(sources.len());

    for source in sources {
        match host.upload(source, folder).await {
            Ok(image) => uploaded.push(image),
            Err(e) => {
                tracing::warn!(
                    folder,
                    uploaded = uploaded.len(),
                    error = %e,
                    "Image upload failed, rolling back images uploaded in this batch"
                );
                let leaked = release(host, &uploaded).await;
                if !leaked.is_empty() {
                    tracing::error!(count = leaked.len(), "Could not roll back uploaded images");
                }
                return Err(e);
            }
        }
    }

    Ok(uploaded)
}

/// Attempt to destroy every image. Returns the images that could not be released.
pub async fn release(host: &dyn MediaHost, images: &[Image]) -> Vec<Image> {
    let mut failed = Vec::new();

    for image in images {
        if let Err(e) = host.destroy(&image.public_id).await {
            tracing::warn!(public_id = %image.public_id, error = %e, "Failed to destroy image");
            failed.push(image.clone());
        }
    }

    failed
}
