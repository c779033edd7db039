//! Hotel and restaurant CRUD handlers.
//!
//! Every handler is generic over a [`ResourceType`] marker and registered once per kind, see
//! [`crate::api::handlers::resource_routes`].

use crate::api::extract::{JsonBody, Params};
use crate::api::models::resources::{ResourceCreate, ResourceResponse, ResourceUpdate};
use crate::api::models::reviews::parse_id;
use crate::auth::current_user::RequireAdmin;
use crate::db::errors::DbError;
use crate::db::models::resources::{Image, ResourceDBResponse, ResourceUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::media::{self, MediaError};
use crate::query::ResourceQuery;
use crate::types::{ResourceKind, ResourceType, abbrev_uuid};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use tracing::{info, warn};

pub(crate) fn not_found(kind: ResourceKind) -> Error {
    Error::NotFound {
        resource: kind.label().to_string(),
    }
}

/// Map a store error, reporting a vanished document as the kind's 404.
fn store_error(kind: ResourceKind, err: DbError) -> Error {
    match err {
        DbError::NotFound => not_found(kind),
        e => e.into(),
    }
}

/// Destroy images uploaded during a request that is failing.
async fn roll_back_uploads(state: &AppState, images: &[Image]) {
    let leaked = media::release(state.media.as_ref(), images).await;
    if !leaked.is_empty() {
        warn!(count = leaked.len(), "Could not roll back uploaded images");
    }
}

fn page(resources: Vec<ResourceDBResponse>) -> Vec<ResourceResponse> {
    resources.into_iter().map(ResourceResponse::from).collect()
}

/// Public list: search, filter and paginate.
#[tracing::instrument(skip_all, fields(kind = %T::KIND))]
pub async fn list_resources<T: ResourceType>(State(state): State<AppState>, Params(params): Params) -> Result<Json<Value>> {
    let kind = T::KIND;
    let per_page = state.config.catalog.page_size as i64;

    let query = ResourceQuery::all().search(&params).filter(&params)?;
    let window = query.clone().paginate(&params, per_page)?;

    let total = state.store.count(kind, &ResourceQuery::all()).await?;
    let filtered = state.store.count(kind, &query).await?;
    let resources = state.store.list(kind, &window).await?;

    Ok(Json(json!({
        "success": true,
        kind.collection(): page(resources),
        kind.count_key(): total,
        "resultPerPage": per_page,
        kind.filtered_count_key(): filtered,
    })))
}

/// Admin list: every document, unfiltered and unpaginated.
#[tracing::instrument(skip_all, fields(kind = %T::KIND))]
pub async fn list_all_resources<T: ResourceType>(State(state): State<AppState>, _: RequireAdmin) -> Result<Json<Value>> {
    let kind = T::KIND;
    let resources = state.store.list(kind, &ResourceQuery::all()).await?;

    Ok(Json(json!({
        "success": true,
        kind.collection(): page(resources),
    })))
}

#[tracing::instrument(skip_all, fields(kind = %T::KIND))]
pub async fn create_resource<T: ResourceType>(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    JsonBody(body): JsonBody<ResourceCreate>,
) -> Result<(StatusCode, Json<Value>)> {
    let kind = T::KIND;
    let (mut request, sources) = body.validate(kind, admin.id)?;

    request.images = media::upload_all(state.media.as_ref(), &sources, kind.folder()).await?;

    let created = match state.store.create(kind, &request).await {
        Ok(created) => created,
        Err(e) => {
            roll_back_uploads(&state, &request.images).await;
            return Err(e.into());
        }
    };

    info!(
        resource_id = %abbrev_uuid(&created.id),
        images = created.images.len(),
        "Created {}",
        kind.singular()
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            kind.singular(): ResourceResponse::from(created),
        })),
    ))
}

#[tracing::instrument(skip_all, fields(kind = %T::KIND))]
pub async fn get_resource<T: ResourceType>(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    let kind = T::KIND;
    let id = parse_id(&id)?;

    let resource = state.store.get_by_id(kind, id).await?.ok_or_else(|| not_found(kind))?;

    Ok(Json(json!({
        "success": true,
        kind.singular(): ResourceResponse::from(resource),
    })))
}

#[tracing::instrument(skip_all, fields(kind = %T::KIND))]
pub async fn update_resource<T: ResourceType>(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<ResourceUpdate>,
) -> Result<Json<Value>> {
    let kind = T::KIND;
    let id = parse_id(&id)?;

    let existing = state.store.get_by_id(kind, id).await?.ok_or_else(|| not_found(kind))?;
    let (mut request, sources) = body.validate(kind)?;

    if let Some(sources) = sources {
        request.images = Some(media::upload_all(state.media.as_ref(), &sources, kind.folder()).await?);
    }

    // Replacing images must not race another replacement, or one uploaded set is never referenced
    let expected_version = request.images.as_ref().map(|_| existing.version);

    let updated = match state.store.update(kind, id, expected_version, &request).await {
        Ok(updated) => updated,
        Err(e) => {
            if let Some(uploaded) = &request.images {
                roll_back_uploads(&state, uploaded).await;
            }
            return Err(store_error(kind, e));
        }
    };

    // The document no longer references the old set, so failures only leak media
    if request.images.is_some() {
        let leaked = media::release(state.media.as_ref(), &existing.images).await;
        if !leaked.is_empty() {
            warn!(
                resource_id = %abbrev_uuid(&id),
                count = leaked.len(),
                "Replaced images could not be released"
            );
        }
    }

    Ok(Json(json!({
        "success": true,
        kind.singular(): ResourceResponse::from(updated),
    })))
}

#[tracing::instrument(skip_all, fields(kind = %T::KIND))]
pub async fn delete_resource<T: ResourceType>(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let kind = T::KIND;
    let id = parse_id(&id)?;

    let existing = state.store.get_by_id(kind, id).await?.ok_or_else(|| not_found(kind))?;

    let unreleased = media::release(state.media.as_ref(), &existing.images).await;
    if let Some(first) = unreleased.first() {
        // Keep only what is still hosted so a retry does not touch released media
        if unreleased.len() < existing.images.len() {
            let request = ResourceUpdateDBRequest {
                images: Some(unreleased.clone()),
                ..Default::default()
            };
            state
                .store
                .update(kind, id, Some(existing.version), &request)
                .await
                .map_err(|e| store_error(kind, e))?;
        }

        return Err(Error::Media(MediaError::Destroy {
            public_id: first.public_id.clone(),
            reason: format!("{} image(s) could not be released", unreleased.len()),
        }));
    }

    if !state.store.delete(kind, id).await? {
        return Err(not_found(kind));
    }

    info!(resource_id = %abbrev_uuid(&id), "Deleted {}", kind.singular());

    Ok(Json(json!({
        "success": true,
        "message": format!("{} Delete Successfully", kind.label()),
    })))
}
