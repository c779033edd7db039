//! Request extractors that reject with the service's JSON error envelope.

use axum::{
    body::Body,
    extract::{FromRequest, FromRequestParts, Query, rejection::JsonRejection},
    http::{Request, request::Parts},
};
use serde::de::DeserializeOwned;

use crate::{AppState, errors::Error, query::QueryParams};

/// JSON request body. Malformed bodies become a 400 instead of axum's plain-text rejection.
pub struct JsonBody<T>(pub T);

impl<T> FromRequest<AppState> for JsonBody<T>
where
    T: DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request(req: Request<Body>, state: &AppState) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(bad_body(rejection)),
        }
    }
}

fn bad_body(rejection: JsonRejection) -> Error {
    Error::BadRequest {
        message: rejection.body_text(),
    }
}

/// Raw query-string parameters, kept as strings for the query builder.
pub struct Params(pub QueryParams);

impl FromRequestParts<AppState> for Params {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Query::<QueryParams>::from_request_parts(parts, state)
            .await
            .map(|Query(params)| Self(params))
            .map_err(|rejection| Error::BadRequest {
                message: rejection.body_text(),
            })
    }
}
