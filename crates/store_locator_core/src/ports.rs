//! crates/store_locator_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or mail.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    NewReview, Review, ScoredStore, Store, StoreFields, TagCount, TopStore, User,
    UserCredentials,
};
use crate::geo::GeoPoint;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, SMTP).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    async fn create_user_with_email(
        &self,
        email: &str,
        name: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    // --- Password Reset ---
    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Finds the user holding `token`, provided it expires after `now`.
    async fn get_user_by_reset_token(&self, token: &str, now: DateTime<Utc>) -> PortResult<User>;

    /// Stores a new password hash and clears any pending reset token.
    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()>;

    // --- Auth Methods ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Hearts ---
    async fn add_heart(&self, user_id: Uuid, store_id: Uuid) -> PortResult<User>;

    async fn remove_heart(&self, user_id: Uuid, store_id: Uuid) -> PortResult<User>;

    // --- Store Management ---
    /// Counts stores whose slug is `base` or a numbered variant of it, ignoring `exclude`.
    async fn count_slug_family(&self, base: &str, exclude: Option<Uuid>) -> PortResult<usize>;

    async fn create_store(&self, fields: &StoreFields, slug: &str) -> PortResult<Store>;

    async fn update_store(
        &self,
        store_id: Uuid,
        fields: &StoreFields,
        slug: &str,
    ) -> PortResult<Store>;

    async fn get_store_by_id(&self, store_id: Uuid) -> PortResult<Store>;

    async fn get_store_by_slug(&self, slug: &str) -> PortResult<Store>;

    /// Newest stores first.
    async fn list_stores(&self, skip: i64, limit: i64) -> PortResult<Vec<Store>>;

    async fn count_stores(&self) -> PortResult<i64>;

    /// Stores carrying `tag`, or every store when `tag` is `None`.
    async fn get_stores_by_tag(&self, tag: Option<&str>) -> PortResult<Vec<Store>>;

    async fn get_stores_by_ids(&self, ids: &[Uuid]) -> PortResult<Vec<Store>>;

    // --- Queries and Aggregations ---
    async fn get_tags_list(&self) -> PortResult<Vec<TagCount>>;

    async fn get_top_stores(&self) -> PortResult<Vec<TopStore>>;

    /// Stores within `max_distance_meters` of `point`, closest first.
    async fn find_stores_near(
        &self,
        point: GeoPoint,
        max_distance_meters: f64,
        limit: i64,
    ) -> PortResult<Vec<Store>>;

    /// Stores matching any of `terms`, most relevant first.
    async fn search_stores(&self, terms: &[String], limit: i64) -> PortResult<Vec<ScoredStore>>;

    // --- Reviews ---
    async fn create_review(&self, review: NewReview) -> PortResult<Review>;

    async fn get_reviews_for_store(&self, store_id: Uuid) -> PortResult<Vec<Review>>;
}

/// A plain-text message for the mail port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait MailService: Send + Sync {
    /// Delivers a single message.
    async fn send(&self, mail: Mail) -> PortResult<()>;
}
