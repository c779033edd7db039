//! API request models for reviews.

use crate::auth::current_user::CurrentUser;
use crate::errors::{Error, Result};
use crate::reviews::ReviewDraft;
use crate::types::{ResourceId, ResourceKind};
use serde::Deserialize;
use serde_json::Value;
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use std::collections::HashMap;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// Parse a resource or review id, rejecting anything that is not a UUID.
pub fn parse_id(raw: &str) -> Result<ResourceId> {
    raw.trim().parse().map_err(|_| Error::invalid_id())
}

/// Body of `PUT /{singular}_review`.
///
/// The parent id is carried under a kind-specific key (`hotelId`, `restaurantId`), so it is
/// collected from the remaining fields and looked up with [`ReviewSubmission::resource_id`].
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewSubmission {
    #[serde(default)]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub rating: Option<f64>,
    pub comment: Option<String>,
    #[serde(flatten)]
    pub rest: HashMap<String, Value>,
}

impl ReviewSubmission {
    pub fn resource_id(&self, kind: ResourceKind) -> Result<ResourceId> {
        match self.rest.get(kind.id_field()) {
            Some(Value::String(raw)) => parse_id(raw),
            _ => Err(Error::invalid_id()),
        }
    }

    /// Validate the submission and turn it into a draft authored by `user`.
    pub fn into_draft(self, user: &CurrentUser) -> Result<ReviewDraft> {
        let rating = self.rating.ok_or_else(|| Error::Validation {
            message: "Please Enter Rating".to_string(),
        })?;
        if !rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(Error::Validation {
                message: format!("Rating must be between {MIN_RATING} and {MAX_RATING}"),
            });
        }

        let comment = self
            .comment
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::Validation {
                message: "Please Enter Comment".to_string(),
            })?;

        Ok(ReviewDraft {
            user: user.id,
            name: user.name.clone(),
            rating,
            comment,
        })
    }
}
