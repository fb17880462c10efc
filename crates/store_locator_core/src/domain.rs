//! crates/store_locator_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::ports::{PortError, PortResult};

/// A store as persisted. `reviews` are not part of the row; see [`StoreDetail`].
#[derive(Debug, Clone, PartialEq)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created: DateTime<Utc>,
    pub location: Location,
    pub photo: Option<String>,
    pub author: Uuid,
}

impl Store {
    /// Only the author of a store may edit it.
    pub fn confirm_owner(&self, user_id: Uuid) -> PortResult<()> {
        if self.author == user_id {
            Ok(())
        } else {
            Err(PortError::Forbidden(
                "You must own a store in order to edit it".to_string(),
            ))
        }
    }
}

/// A GeoJSON-style point with a street address. The type tag is always "Point".
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub point: GeoPoint,
    pub address: String,
}

impl Location {
    pub const KIND: &'static str = "Point";
}

/// The validated, slug-less fields of a store, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreFields {
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub location: Location,
    pub photo: Option<String>,
    pub author: Uuid,
}

/// A store together with its explicitly joined relations.
#[derive(Debug, Clone)]
pub struct StoreDetail {
    pub store: Store,
    pub author: User,
    pub reviews: Vec<Review>,
}

/// A store returned by the full-text search, with its relevance score.
#[derive(Debug, Clone)]
pub struct ScoredStore {
    pub store: Store,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub store: Uuid,
    pub author: Uuid,
    pub text: String,
    pub rating: i32,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub store: Uuid,
    pub author: Uuid,
    pub text: String,
    pub rating: i32,
}

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub hearts: Vec<Uuid>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// One row of the tag aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

/// One row of the top-stores aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct TopStore {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub photo: Option<String>,
    pub average_rating: f64,
    pub review_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_author_may_edit() {
        let author = Uuid::new_v4();
        let store = Store {
            id: Uuid::new_v4(),
            name: "Wacky Coffee".into(),
            slug: "wacky-coffee".into(),
            description: None,
            tags: vec![],
            created: Utc::now(),
            location: Location {
                point: GeoPoint { lng: 1.0, lat: 2.0 },
                address: "1 Front St".into(),
            },
            photo: None,
            author,
        };

        assert!(store.confirm_owner(author).is_ok());
        assert!(matches!(
            store.confirm_owner(Uuid::new_v4()),
            Err(PortError::Forbidden(_))
        ));
    }
}
