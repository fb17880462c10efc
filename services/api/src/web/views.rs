//! services/api/src/web/views.rs
//!
//! JSON view models shared by several handlers. Domain types from the `core`
//! crate carry no serialization; these structs are the wire format.

use chrono::{DateTime, Utc};
use serde::Serialize;
use store_locator_core::domain::{Location, Review, ScoredStore, Store, TagCount, TopStore, User};
use utoipa::ToSchema;
use uuid::Uuid;

/// GeoJSON-style location: `{ "type": "Point", "coordinates": [lng, lat], "address": ... }`.
#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct LocationView {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
    pub address: String,
}

impl From<&Location> for LocationView {
    fn from(location: &Location) -> Self {
        Self {
            kind: Location::KIND.to_string(),
            coordinates: vec![location.point.lng, location.point.lat],
            address: location.address.clone(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct StoreView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created: DateTime<Utc>,
    pub location: LocationView,
    pub photo: Option<String>,
    pub author: Uuid,
}

impl From<Store> for StoreView {
    fn from(store: Store) -> Self {
        Self {
            location: LocationView::from(&store.location),
            id: store.id,
            name: store.name,
            slug: store.slug,
            description: store.description,
            tags: store.tags,
            created: store.created,
            photo: store.photo,
            author: store.author,
        }
    }
}

pub fn store_views(stores: Vec<Store>) -> Vec<StoreView> {
    stores.into_iter().map(StoreView::from).collect()
}

/// The reduced projection returned by the map endpoint.
#[derive(Serialize, ToSchema, Debug)]
pub struct NearStoreView {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub location: LocationView,
    pub photo: Option<String>,
}

impl From<Store> for NearStoreView {
    fn from(store: Store) -> Self {
        Self {
            location: LocationView::from(&store.location),
            id: store.id,
            slug: store.slug,
            name: store.name,
            description: store.description,
            photo: store.photo,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct SearchResultView {
    #[serde(flatten)]
    pub store: StoreView,
    pub score: f64,
}

impl From<ScoredStore> for SearchResultView {
    fn from(hit: ScoredStore) -> Self {
        Self {
            store: hit.store.into(),
            score: hit.score,
        }
    }
}

/// A user as shown to themselves, hearts included.
#[derive(Serialize, ToSchema, Debug)]
pub struct UserView {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub hearts: Vec<Uuid>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            name: user.name,
            hearts: user.hearts,
        }
    }
}

/// Public author details attached to a store page.
#[derive(Serialize, ToSchema, Debug)]
pub struct AuthorView {
    pub user_id: Uuid,
    pub name: String,
}

impl From<User> for AuthorView {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            name: user.name,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ReviewView {
    pub id: Uuid,
    pub store: Uuid,
    pub author: Uuid,
    pub text: String,
    pub rating: i32,
    pub created: DateTime<Utc>,
}

impl From<Review> for ReviewView {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            store: review.store,
            author: review.author,
            text: review.text,
            rating: review.rating,
            created: review.created,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct TagCountView {
    pub tag: String,
    pub count: i64,
}

impl From<TagCount> for TagCountView {
    fn from(tag: TagCount) -> Self {
        Self {
            tag: tag.tag,
            count: tag.count,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct TopStoreView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub photo: Option<String>,
    pub average_rating: f64,
    pub review_count: i64,
}

impl From<TopStore> for TopStoreView {
    fn from(top: TopStore) -> Self {
        Self {
            id: top.id,
            name: top.name,
            slug: top.slug,
            photo: top.photo,
            average_rating: top.average_rating,
            review_count: top.review_count,
        }
    }
}
