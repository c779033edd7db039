//! API request/response models for hotels and restaurants.

use crate::db::models::resources::{Image, ResourceCreateDBRequest, ResourceDBResponse, ResourceUpdateDBRequest, Review};
use crate::errors::{Error, Result};
use crate::types::{ResourceId, ResourceKind, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

/// Image sources as sent by clients: either one source or a list of them.
///
/// Each source is a `data:` URI or a remote URL that the media host can fetch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ImageInput {
    One(String),
    Many(Vec<String>),
}

impl ImageInput {
    pub fn into_sources(self) -> Vec<String> {
        match self {
            ImageInput::One(source) => vec![source],
            ImageInput::Many(sources) => sources,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RequiredField {
    Name,
    Description,
    PhoneNo,
    Address,
    Category,
}

impl RequiredField {
    fn missing(self, kind: ResourceKind) -> Error {
        let what = match self {
            RequiredField::Name => "Name",
            RequiredField::Description => "Description",
            RequiredField::PhoneNo => "Phone #",
            RequiredField::Address => "Address",
            RequiredField::Category => "Category",
        };
        Error::Validation {
            message: format!("Please Enter {} {what}", kind.label()),
        }
    }
}

fn required_text(value: Option<String>, field: RequiredField, kind: ResourceKind) -> Result<String> {
    present_text(value, field, kind)?.ok_or_else(|| field.missing(kind))
}

/// `None` stays `None`; a present value must not be blank.
fn present_text(value: Option<String>, field: RequiredField, kind: ResourceKind) -> Result<Option<String>> {
    match value {
        None => Ok(None),
        Some(text) => {
            // names are stored trimmed
            let text = match field {
                RequiredField::Name => text.trim().to_string(),
                _ => text,
            };
            if text.trim().is_empty() {
                Err(field.missing(kind))
            } else {
                Ok(Some(text))
            }
        }
    }
}

/// Request body for creating a resource
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCreate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub phone_no: Option<i64>,
    pub address: Option<String>,
    pub category: Option<String>,
    pub images: Option<ImageInput>,
}

impl ResourceCreate {
    /// Validate the textual fields. Returns the database request (with no images yet) and the
    /// image sources still to be uploaded.
    pub fn validate(self, kind: ResourceKind, created_by: UserId) -> Result<(ResourceCreateDBRequest, Vec<String>)> {
        let request = ResourceCreateDBRequest {
            name: required_text(self.name, RequiredField::Name, kind)?,
            description: required_text(self.description, RequiredField::Description, kind)?,
            phone_no: self.phone_no.ok_or_else(|| RequiredField::PhoneNo.missing(kind))?,
            address: required_text(self.address, RequiredField::Address, kind)?,
            category: required_text(self.category, RequiredField::Category, kind)?,
            images: Vec::new(),
            created_by,
        };

        let sources = self.images.map(ImageInput::into_sources).unwrap_or_default();
        Ok((request, sources))
    }
}

/// Request body for a partial update. A present `images` key (even `[]`) replaces the whole set.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub phone_no: Option<i64>,
    pub address: Option<String>,
    pub category: Option<String>,
    pub images: Option<ImageInput>,
}

impl ResourceUpdate {
    /// Validate the provided fields. Returns the database request (images left unset) and the
    /// replacement image sources, if the set is being replaced.
    pub fn validate(self, kind: ResourceKind) -> Result<(ResourceUpdateDBRequest, Option<Vec<String>>)> {
        let request = ResourceUpdateDBRequest {
            name: present_text(self.name, RequiredField::Name, kind)?,
            description: present_text(self.description, RequiredField::Description, kind)?,
            phone_no: self.phone_no,
            address: present_text(self.address, RequiredField::Address, kind)?,
            category: present_text(self.category, RequiredField::Category, kind)?,
            images: None,
        };

        Ok((request, self.images.map(ImageInput::into_sources)))
    }
}

/// A resource as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceResponse {
    #[serde(rename = "_id")]
    pub id: ResourceId,
    pub name: String,
    pub description: String,
    pub phone_no: i64,
    pub address: String,
    pub ratings: f64,
    pub images: Vec<Image>,
    pub category: String,
    pub num_of_reviews: i32,
    pub reviews: Vec<Review>,
    pub user: UserId,
    pub created_at: DateTime<Utc>,
}

impl From<ResourceDBResponse> for ResourceResponse {
    fn from(db: ResourceDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            phone_no: db.phone_no,
            address: db.address,
            ratings: db.ratings,
            images: db.images,
            category: db.category,
            num_of_reviews: db.num_of_reviews,
            reviews: db.reviews,
            user: db.created_by,
            created_at: db.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn create_body(value: serde_json::Value) -> ResourceCreate {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_images_accepts_string_or_array() {
        let one = create_body(json!({ "images": "data:image/png;base64,AAAA" }));
        assert_eq!(one.images.unwrap().into_sources(), vec!["data:image/png;base64,AAAA"]);

        let many = create_body(json!({ "images": ["a", "b"] }));
        assert_eq!(many.images.unwrap().into_sources(), vec!["a", "b"]);
    }

    #[test]
    fn test_phone_accepts_number_or_numeric_string() {
        assert_eq!(create_body(json!({ "phoneNo": 5551234 })).phone_no, Some(5551234));
        assert_eq!(create_body(json!({ "phoneNo": "5551234" })).phone_no, Some(5551234));
        assert!(serde_json::from_value::<ResourceCreate>(json!({ "phoneNo": "call me" })).is_err());
    }

    #[test]
    fn test_create_validation_messages() {
        let complete = json!({
            "name": "  Grand  ",
            "description": "Nice",
            "phoneNo": 1,
            "address": "Main St",
            "category": "Luxury",
        });

        let (request, sources) = create_body(complete.clone())
            .validate(ResourceKind::Hotel, Uuid::new_v4())
            .unwrap();
        assert_eq!(request.name, "Grand");
        assert!(sources.is_empty());

        let cases = [
            ("name", "Please Enter Hotel Name"),
            ("description", "Please Enter Hotel Description"),
            ("phoneNo", "Please Enter Hotel Phone #"),
            ("address", "Please Enter Hotel Address"),
            ("category", "Please Enter Hotel Category"),
        ];
        for (field, message) in cases {
            let mut body = complete.clone();
            body.as_object_mut().unwrap().remove(field);
            let err = create_body(body).validate(ResourceKind::Hotel, Uuid::new_v4()).unwrap_err();
            assert_eq!(err.user_message(), message);
        }

        let mut blank = complete.clone();
        blank["name"] = json!("   ");
        let err = create_body(blank).validate(ResourceKind::Restaurant, Uuid::new_v4()).unwrap_err();
        assert_eq!(err.user_message(), "Please Enter Restaurant Name");
    }

    #[test]
    fn test_update_validation() {
        let update: ResourceUpdate = serde_json::from_value(json!({ "address": "New St", "images": [] })).unwrap();
        let (request, images) = update.validate(ResourceKind::Hotel).unwrap();

        assert_eq!(request.address.as_deref(), Some("New St"));
        assert_eq!(request.name, None);
        assert_eq!(images, Some(vec![]));

        let update: ResourceUpdate = serde_json::from_value(json!({ "category": "" })).unwrap();
        let err = update.validate(ResourceKind::Hotel).unwrap_err();
        assert_eq!(err.user_message(), "Please Enter Hotel Category");
    }

    #[test]
    fn test_response_field_names() {
        let db = ResourceDBResponse {
            id: Uuid::new_v4(),
            name: "Grand".to_string(),
            description: "Nice".to_string(),
            phone_no: 1,
            address: "Main St".to_string(),
            ratings: 0.0,
            images: vec![],
            category: "Luxury".to_string(),
            num_of_reviews: 0,
            reviews: vec![],
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            version: 3,
        };

        let value = serde_json::to_value(ResourceResponse::from(db.clone())).unwrap();
        assert_eq!(value["_id"], json!(db.id));
        assert_eq!(value["user"], json!(db.created_by));
        assert!(value.get("phoneNo").is_some());
        assert!(value.get("numOfReviews").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("version").is_none());
    }
}
