//! Dummy media host implementation
//!
//! Keeps uploaded images in process memory and hands out URLs under a configurable base. Useful
//! for development and tests, where it also supports injecting upload and destroy failures.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    config::DummyMediaConfig,
    db::models::resources::Image,
    media::{MediaError, MediaHost, Result},
};

#[derive(Default)]
struct DummyState {
    hosted: HashMap<String, Image>,
    uploads_left: Option<usize>,
    failing_destroys: HashSet<String>,
}

#[derive(Clone)]
pub struct DummyMediaHost {
    base_url: String,
    state: Arc<Mutex<DummyState>>,
}

impl DummyMediaHost {
    pub fn new() -> Self {
        Self::from(DummyMediaConfig::default())
    }

    /// Number of images currently hosted.
    pub fn hosted_count(&self) -> usize {
        self.state.lock().hosted.len()
    }

    pub fn is_hosted(&self, public_id: &str) -> bool {
        self.state.lock().hosted.contains_key(public_id)
    }

    /// Accept `n` more uploads, then reject every further one.
    pub fn fail_uploads_after(&self, n: usize) {
        self.state.lock().uploads_left = Some(n);
    }

    /// Make every destroy of `public_id` fail.
    pub fn fail_destroy(&self, public_id: &str) {
        self.state.lock().failing_destroys.insert(public_id.to_string());
    }

    /// Remove all injected failures.
    pub fn heal(&self) {
        let mut state = self.state.lock();
        state.uploads_left = None;
        state.failing_destroys.clear();
    }
}

impl Default for DummyMediaHost {
    fn default() -> Self {
        Self::new()
    }
}

impl From<DummyMediaConfig> for DummyMediaHost {
    fn from(config: DummyMediaConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            state: Arc::new(Mutex::new(DummyState::default())),
        }
    }
}

#[async_trait]
impl MediaHost for DummyMediaHost {
    async fn upload(&self, data: &str, folder: &str) -> Result<Image> {
        if data.trim().is_empty() {
            return Err(MediaError::Upload("empty file".to_string()));
        }

        let mut state = self.state.lock();
        if let Some(left) = state.uploads_left.as_mut() {
            if *left == 0 {
                return Err(MediaError::Upload("dummy host refused upload".to_string()));
            }
            *left -= 1;
        }

        let public_id = format!("{folder}/{}", Uuid::new_v4().simple());
        let image = Image {
            url: format!("{}/{public_id}", self.base_url),
            public_id: public_id.clone(),
        };
        state.hosted.insert(public_id, image.clone());

        tracing::debug!(public_id = %image.public_id, "Dummy media host stored image");
        Ok(image)
    }

    async fn destroy(&self, public_id: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.failing_destroys.contains(public_id) {
            return Err(MediaError::Destroy {
                public_id: public_id.to_string(),
                reason: "dummy host refused destroy".to_string(),
            });
        }

        // Destroying an unknown id is not an error, matching hosted services
        state.hosted.remove(public_id);
        Ok(())
    }
}
