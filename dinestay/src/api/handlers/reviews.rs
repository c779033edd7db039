//! Review handlers.
//!
//! Both review writes (submit and delete) go through [`apply_review_change`]: load the parent,
//! compute a new [`ReviewSummary`] from its current reviews, and persist it with a
//! compare-and-swap on the document version. A lost race reloads and re-applies the change.

use crate::api::extract::{JsonBody, Params};
use crate::api::handlers::resources::not_found;
use crate::api::models::reviews::{ReviewSubmission, parse_id};
use crate::auth::current_user::CurrentUser;
use crate::db::models::resources::ResourceDBResponse;
use crate::errors::{Error, Result};
use crate::reviews::{ReviewSummary, remove_review, upsert_review};
use crate::types::{ResourceId, ResourceKind, ResourceType, abbrev_uuid};
use crate::AppState;
use axum::{Json, extract::State};
use serde_json::{Value, json};
use tracing::{debug, info};

/// Attempts before a contended review write gives up with 409.
pub const MAX_REVIEW_WRITE_ATTEMPTS: usize = 5;

async fn apply_review_change<F>(state: &AppState, kind: ResourceKind, id: ResourceId, change: F) -> Result<ReviewSummary>
where
    F: Fn(&ResourceDBResponse) -> Result<ReviewSummary> + Send,
{
    for attempt in 1..=MAX_REVIEW_WRITE_ATTEMPTS {
        let resource = state.store.get_by_id(kind, id).await?.ok_or_else(|| not_found(kind))?;
        let summary = change(&resource)?;

        if state.store.save_reviews(kind, id, resource.version, &summary).await? {
            return Ok(summary);
        }
        debug!(attempt, resource_id = %abbrev_uuid(&id), "Review write lost a version race, retrying");
    }

    Err(Error::Conflict {
        message: "Too many concurrent review updates, please retry".to_string(),
    })
}

#[tracing::instrument(skip_all, fields(kind = %T::KIND))]
pub async fn submit_review<T: ResourceType>(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(body): JsonBody<ReviewSubmission>,
) -> Result<Json<Value>> {
    let kind = T::KIND;
    let id = body.resource_id(kind)?;
    let draft = body.into_draft(&user)?;

    let summary = apply_review_change(&state, kind, id, |resource| Ok(upsert_review(&resource.reviews, draft.clone()))).await?;

    info!(
        resource_id = %abbrev_uuid(&id),
        reviews = summary.num_of_reviews,
        ratings = summary.ratings,
        "Review saved"
    );

    Ok(Json(json!({ "success": true })))
}

#[tracing::instrument(skip_all, fields(kind = %T::KIND))]
pub async fn list_reviews<T: ResourceType>(State(state): State<AppState>, Params(params): Params) -> Result<Json<Value>> {
    let kind = T::KIND;
    let id = parse_id(params.get("id").map(String::as_str).unwrap_or_default())?;

    let resource = state.store.get_by_id(kind, id).await?.ok_or_else(|| not_found(kind))?;

    Ok(Json(json!({
        "success": true,
        "reviews": resource.reviews,
    })))
}

#[tracing::instrument(skip_all, fields(kind = %T::KIND))]
pub async fn delete_review<T: ResourceType>(
    State(state): State<AppState>,
    user: CurrentUser,
    Params(params): Params,
) -> Result<Json<Value>> {
    let kind = T::KIND;
    let id = parse_id(params.get(kind.id_field()).map(String::as_str).unwrap_or_default())?;
    let review_id = parse_id(params.get("id").map(String::as_str).unwrap_or_default())?;

    let summary = apply_review_change(&state, kind, id, |resource| {
        if let Some(review) = resource.reviews.iter().find(|r| r.id == review_id) {
            if review.user != user.id && !user.is_admin() {
                return Err(Error::Forbidden {
                    message: "You are not allowed to delete this review".to_string(),
                });
            }
        }
        Ok(remove_review(&resource.reviews, review_id))
    })
    .await?;

    info!(
        resource_id = %abbrev_uuid(&id),
        reviews = summary.num_of_reviews,
        ratings = summary.ratings,
        "Review removed"
    );

    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::{DbError, Result as DbResult};
    use crate::db::handlers::{InMemoryResourceStore, ResourceStore};
    use crate::db::models::resources::{ResourceCreateDBRequest, ResourceUpdateDBRequest};
    use crate::media::{MediaHost, dummy::DummyMediaHost};
    use crate::query::ResourceQuery;
    use crate::reviews::ReviewDraft;
    use crate::test_utils::*;
    use crate::types::Role;
    use axum::http::StatusCode;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn review(app: &TestApp, token: &str, kind: ResourceKind, id: ResourceId, rating: Value) -> axum_test::TestResponse {
        let path = format!("/api/v1/{}_review", kind.singular());
        let mut body = json!({ "rating": rating, "comment": "Lovely" });
        body[kind.id_field()] = json!(id);
        app.server.put(&path).authorization_bearer(token).json(&body).await
    }

    #[test_log::test(tokio::test)]
    async fn test_submit_requires_login() {
        let app = create_test_app();
        let created = app.create_resource(ResourceKind::Hotel, "Grand", "Luxury", 0).await;

        let response = app
            .server
            .put("/api/v1/hotel_review")
            .json(&json!({ "rating": 5, "comment": "x", "hotelId": created.id }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[test_log::test(tokio::test)]
    async fn test_submit_and_resubmit() {
        let app = create_test_app();
        let created = app.create_resource(ResourceKind::Hotel, "Grand", "Luxury", 0).await;
        let (ann, ann_token) = app.token(Role::User);
        let (_, bob_token) = app.token(Role::User);

        review(&app, &ann_token, ResourceKind::Hotel, created.id, json!(4)).await.assert_status_ok();
        review(&app, &bob_token, ResourceKind::Hotel, created.id, json!("2")).await.assert_status_ok();

        let stored = app.store.get_by_id(ResourceKind::Hotel, created.id).await.unwrap().unwrap();
        assert_eq!(stored.num_of_reviews, 2);
        assert_eq!(stored.ratings, 3.0);
        assert_eq!(stored.reviews[0].name, ann.name);

        // second review from the same user replaces the first
        review(&app, &ann_token, ResourceKind::Hotel, created.id, json!(5)).await.assert_status_ok();
        let stored = app.store.get_by_id(ResourceKind::Hotel, created.id).await.unwrap().unwrap();
        assert_eq!(stored.num_of_reviews, 2);
        assert_eq!(stored.ratings, 3.5);
    }

    #[test_log::test(tokio::test)]
    async fn test_submit_to_missing_or_malformed_resource() {
        let app = create_test_app();
        let (_, token) = app.token(Role::User);

        let response = review(&app, &token, ResourceKind::Restaurant, uuid::Uuid::new_v4(), json!(3)).await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["message"], "Restaurant not found");

        let response = app
            .server
            .put("/api/v1/restaurant_review")
            .authorization_bearer(&token)
            .json(&json!({ "rating": 3, "comment": "x", "restaurantId": "abc" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[test_log::test(tokio::test)]
    async fn test_submit_rejects_out_of_range_rating() {
        let app = create_test_app();
        let created = app.create_resource(ResourceKind::Hotel, "Grand", "Luxury", 0).await;
        let (_, token) = app.token(Role::User);

        let response = review(&app, &token, ResourceKind::Hotel, created.id, json!(9)).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let stored = app.store.get_by_id(ResourceKind::Hotel, created.id).await.unwrap().unwrap();
        assert_eq!(stored.num_of_reviews, 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_list_reviews() {
        let app = create_test_app();
        let created = app.create_resource(ResourceKind::Restaurant, "Bistro", "French", 0).await;
        let (_, token) = app.token(Role::User);
        review(&app, &token, ResourceKind::Restaurant, created.id, json!(4)).await.assert_status_ok();

        let response = app.server.get(&format!("/api/v1/restaurant_reviews?id={}", created.id)).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["reviews"].as_array().unwrap().len(), 1);
        assert_eq!(body["reviews"][0]["rating"], 4.0);
        assert_eq!(body["reviews"][0]["comment"], "Lovely");

        let response = app.server.get(&format!("/api/v1/restaurant_reviews?id={}", uuid::Uuid::new_v4())).await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[test_log::test(tokio::test)]
    async fn test_delete_reviews_down_to_zero() {
        let app = create_test_app();
        let created = app.create_resource(ResourceKind::Hotel, "Grand", "Luxury", 0).await;
        let (_, a_token) = app.token(Role::User);
        let (b, b_token) = app.token(Role::User);
        review(&app, &a_token, ResourceKind::Hotel, created.id, json!(4)).await.assert_status_ok();
        review(&app, &b_token, ResourceKind::Hotel, created.id, json!(2)).await.assert_status_ok();

        let stored = app.store.get_by_id(ResourceKind::Hotel, created.id).await.unwrap().unwrap();
        let b_review = stored.reviews.iter().find(|r| r.user == b.id).unwrap().id;
        let a_review = stored.reviews.iter().find(|r| r.user != b.id).unwrap().id;

        app.server
            .delete(&format!("/api/v1/hotel_reviews?hotelId={}&id={b_review}", created.id))
            .authorization_bearer(&b_token)
            .await
            .assert_status_ok();
        let stored = app.store.get_by_id(ResourceKind::Hotel, created.id).await.unwrap().unwrap();
        assert_eq!((stored.num_of_reviews, stored.ratings), (1, 4.0));

        app.server
            .delete(&format!("/api/v1/hotel_reviews?hotelId={}&id={a_review}", created.id))
            .authorization_bearer(&a_token)
            .await
            .assert_status_ok();
        let stored = app.store.get_by_id(ResourceKind::Hotel, created.id).await.unwrap().unwrap();
        assert_eq!((stored.num_of_reviews, stored.ratings), (0, 0.0));
    }

    #[test_log::test(tokio::test)]
    async fn test_delete_someone_elses_review() {
        let app = create_test_app();
        let created = app.create_resource(ResourceKind::Hotel, "Grand", "Luxury", 0).await;
        let (_, author_token) = app.token(Role::User);
        let (_, other_token) = app.token(Role::User);
        let (_, admin_token) = app.token(Role::Admin);
        review(&app, &author_token, ResourceKind::Hotel, created.id, json!(5)).await.assert_status_ok();

        let stored = app.store.get_by_id(ResourceKind::Hotel, created.id).await.unwrap().unwrap();
        let path = format!("/api/v1/hotel_reviews?hotelId={}&id={}", created.id, stored.reviews[0].id);

        app.server.delete(&path).authorization_bearer(&other_token).await.assert_status(StatusCode::FORBIDDEN);
        app.server.delete(&path).authorization_bearer(&admin_token).await.assert_status_ok();

        let stored = app.store.get_by_id(ResourceKind::Hotel, created.id).await.unwrap().unwrap();
        assert_eq!(stored.num_of_reviews, 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_delete_unknown_review_recomputes() {
        let app = create_test_app();
        let created = app.create_resource(ResourceKind::Hotel, "Grand", "Luxury", 0).await;
        let (_, token) = app.token(Role::User);
        review(&app, &token, ResourceKind::Hotel, created.id, json!(3)).await.assert_status_ok();
        let before = app.store.get_by_id(ResourceKind::Hotel, created.id).await.unwrap().unwrap();

        app.server
            .delete(&format!("/api/v1/hotel_reviews?hotelId={}&id={}", created.id, uuid::Uuid::new_v4()))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        let after = app.store.get_by_id(ResourceKind::Hotel, created.id).await.unwrap().unwrap();
        assert_eq!(after.reviews, before.reviews);
        assert_eq!(after.ratings, 3.0);
        assert_eq!(after.version, before.version + 1);
    }

    /// Store that lets another writer bump the version right before each of the first
    /// `races` review writes.
    struct RacingStore {
        inner: InMemoryResourceStore,
        races: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ResourceStore for RacingStore {
        async fn create(&self, kind: ResourceKind, request: &ResourceCreateDBRequest) -> DbResult<ResourceDBResponse> {
            self.inner.create(kind, request).await
        }

        async fn get_by_id(&self, kind: ResourceKind, id: ResourceId) -> DbResult<Option<ResourceDBResponse>> {
            self.inner.get_by_id(kind, id).await
        }

        async fn list(&self, kind: ResourceKind, query: &ResourceQuery) -> DbResult<Vec<ResourceDBResponse>> {
            self.inner.list(kind, query).await
        }

        async fn count(&self, kind: ResourceKind, query: &ResourceQuery) -> DbResult<i64> {
            self.inner.count(kind, query).await
        }

        async fn update(
            &self,
            kind: ResourceKind,
            id: ResourceId,
            expected_version: Option<i64>,
            request: &ResourceUpdateDBRequest,
        ) -> DbResult<ResourceDBResponse> {
            self.inner.update(kind, id, expected_version, request).await
        }

        async fn save_reviews(
            &self,
            kind: ResourceKind,
            id: ResourceId,
            expected_version: i64,
            summary: &ReviewSummary,
        ) -> DbResult<bool> {
            let raced = self
                .races
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if raced {
                // a concurrent review from someone else lands first
                let current = self.inner.get_by_id(kind, id).await?.ok_or(DbError::NotFound)?;
                let competing = upsert_review(
                    &current.reviews,
                    ReviewDraft {
                        user: uuid::Uuid::new_v4(),
                        name: "Racer".to_string(),
                        rating: 1.0,
                        comment: "first".to_string(),
                    },
                );
                self.inner.save_reviews(kind, id, current.version, &competing).await?;
            }
            self.inner.save_reviews(kind, id, expected_version, summary).await
        }

        async fn delete(&self, kind: ResourceKind, id: ResourceId) -> DbResult<bool> {
            self.inner.delete(kind, id).await
        }
    }

    async fn racing_state(races: usize) -> (AppState, ResourceId) {
        let inner = InMemoryResourceStore::new();
        let created = inner
            .create(
                ResourceKind::Hotel,
                &ResourceCreateDBRequest {
                    name: "Grand".to_string(),
                    description: "Nice".to_string(),
                    phone_no: 1,
                    address: "Main St".to_string(),
                    category: "Luxury".to_string(),
                    images: vec![],
                    created_by: uuid::Uuid::new_v4(),
                },
            )
            .await
            .unwrap();

        let state = AppState::builder()
            .config(create_test_config())
            .store(Arc::new(RacingStore {
                inner,
                races: AtomicUsize::new(races),
            }) as Arc<dyn ResourceStore>)
            .media(Arc::new(DummyMediaHost::new()) as Arc<dyn MediaHost>)
            .build();
        (state, created.id)
    }

    fn draft(rating: f64) -> ReviewDraft {
        ReviewDraft {
            user: uuid::Uuid::new_v4(),
            name: "Ann".to_string(),
            rating,
            comment: "ok".to_string(),
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_lost_race_is_reapplied_on_fresh_data() {
        let (state, id) = racing_state(2).await;

        let summary = apply_review_change(&state, ResourceKind::Hotel, id, |r| Ok(upsert_review(&r.reviews, draft(5.0))))
            .await
            .unwrap();

        // both competing reviews survive alongside ours
        assert_eq!(summary.num_of_reviews, 3);
        assert_eq!(summary.ratings, (1.0 + 1.0 + 5.0) / 3.0);
        let stored = state.store.get_by_id(ResourceKind::Hotel, id).await.unwrap().unwrap();
        assert_eq!(stored.reviews, summary.reviews);
    }

    #[test_log::test(tokio::test)]
    async fn test_persistent_contention_is_a_conflict() {
        let (state, id) = racing_state(MAX_REVIEW_WRITE_ATTEMPTS).await;

        let result = apply_review_change(&state, ResourceKind::Hotel, id, |r| Ok(upsert_review(&r.reviews, draft(5.0)))).await;

        match result {
            Err(e @ Error::Conflict { .. }) => assert_eq!(e.status_code(), StatusCode::CONFLICT),
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}
