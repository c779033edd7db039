//! Test utilities: an in-memory application wired to a dummy media host, plus session helpers.

use crate::auth::{current_user::CurrentUser, session::create_session_token};
use crate::config::{Config, DatabaseConfig, DummyMediaConfig, MediaConfig};
use crate::db::handlers::{InMemoryResourceStore, ResourceStore};
use crate::db::models::resources::{ResourceCreateDBRequest, ResourceDBResponse};
use crate::media::{self, dummy::DummyMediaHost};
use crate::types::{ResourceKind, Role};
use crate::{AppState, build_router};
use axum_test::TestServer;
use std::sync::Arc;
use uuid::Uuid;

pub const TEST_IMAGE: &str = "data:image/png;base64,iVBORw0KGgo=";

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        database: DatabaseConfig::Memory,
        media: MediaConfig::Dummy(DummyMediaConfig::default()),
        ..Default::default()
    }
}

pub fn create_test_state() -> AppState {
    AppState::builder()
        .config(create_test_config())
        .store(Arc::new(InMemoryResourceStore::new()))
        .media(Arc::new(DummyMediaHost::new()))
        .build()
}

/// Mint a session for a fresh user with the given role.
pub fn session_token(config: &Config, role: Role) -> (CurrentUser, String) {
    let id = Uuid::new_v4();
    let user = CurrentUser {
        id,
        name: format!("user-{}", &id.simple().to_string()[..8]),
        role,
    };
    let token = create_session_token(&user, config).expect("Failed to create session token");
    (user, token)
}

/// A running test server, with handles on the store and media host behind it.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub store: InMemoryResourceStore,
    pub media: DummyMediaHost,
}

impl TestApp {
    pub fn token(&self, role: Role) -> (CurrentUser, String) {
        session_token(&self.state.config, role)
    }

    /// Insert a resource directly, with `images` uploaded through the dummy host.
    pub async fn create_resource(&self, kind: ResourceKind, name: &str, category: &str, images: usize) -> ResourceDBResponse {
        let sources = vec![TEST_IMAGE.to_string(); images];
        let images = media::upload_all(&self.media, &sources, kind.folder())
            .await
            .expect("Failed to upload test images");

        let request = ResourceCreateDBRequest {
            name: name.to_string(),
            description: format!("{name} description"),
            phone_no: 5551234,
            address: "1 Test Street".to_string(),
            category: category.to_string(),
            images,
            created_by: Uuid::new_v4(),
        };

        self.store.create(kind, &request).await.expect("Failed to create test resource")
    }
}

pub fn create_test_app() -> TestApp {
    let store = InMemoryResourceStore::new();
    let media = DummyMediaHost::new();
    let state = AppState::builder()
        .config(create_test_config())
        .store(Arc::new(store.clone()))
        .media(Arc::new(media.clone()))
        .build();

    let router = build_router(state.clone()).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        state,
        store,
        media,
    }
}
