//! HTTP request handlers.
//!
//! Handlers are generic over a [`ResourceType`] marker; [`resource_routes`] registers the full
//! set for one kind:
//!
//! | method | path                                     | auth          |
//! |--------|------------------------------------------|---------------|
//! | GET    | `/{collection}`                          | public        |
//! | GET    | `/admin/{collection}`                    | admin         |
//! | POST   | `/admin/{singular}/new`                  | admin         |
//! | PUT    | `/admin/{singular}/{id}`                 | admin         |
//! | DELETE | `/admin/{singular}/{id}`                 | admin         |
//! | GET    | `/{singular}/{id}`                       | public        |
//! | PUT    | `/{singular}_review`                     | authenticated |
//! | GET    | `/{singular}_reviews?id=`                | public        |
//! | DELETE | `/{singular}_reviews?{singular}Id=&id=`  | authenticated |

use crate::{AppState, types::ResourceType};
use axum::{
    Router,
    routing::{get, post, put},
};

pub mod resources;
pub mod reviews;

/// Routes for one resource kind, relative to the API prefix.
pub fn resource_routes<T: ResourceType>() -> Router<AppState> {
    let kind = T::KIND;
    let collection = kind.collection();
    let singular = kind.singular();

    Router::new()
        .route(&format!("/{collection}"), get(resources::list_resources::<T>))
        .route(&format!("/admin/{collection}"), get(resources::list_all_resources::<T>))
        .route(&format!("/admin/{singular}/new"), post(resources::create_resource::<T>))
        .route(
            &format!("/admin/{singular}/{{id}}"),
            put(resources::update_resource::<T>).delete(resources::delete_resource::<T>),
        )
        .route(&format!("/{singular}/{{id}}"), get(resources::get_resource::<T>))
        .route(&format!("/{singular}_review"), put(reviews::submit_review::<T>))
        .route(
            &format!("/{singular}_reviews"),
            get(reviews::list_reviews::<T>).delete(reviews::delete_review::<T>),
        )
}
