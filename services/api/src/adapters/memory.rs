//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `DatabaseService` port. Selected with
//! `DATABASE_URL=memory://` and used by the integration tests. Aggregations and
//! searches reuse the pure functions from the `core` crate so ordering matches
//! the PostgreSQL adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use store_locator_core::domain::{
    AuthSession, NewReview, Review, ScoredStore, Store, StoreFields, TagCount, TopStore, User,
    UserCredentials,
};
use store_locator_core::geo::GeoPoint;
use store_locator_core::hearts::{self, HeartAction};
use store_locator_core::ports::{DatabaseService, PortError, PortResult};
use store_locator_core::slug::SlugFamily;
use store_locator_core::{aggregate, search};
use tokio::sync::RwLock;
use uuid::Uuid;

struct UserRow {
    user: User,
    hashed_password: String,
    reset: Option<(String, DateTime<Utc>)>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserRow>,
    sessions: HashMap<String, AuthSession>,
    /// Insertion order; listing sorts by `created` on the way out.
    stores: Vec<Store>,
    reviews: Vec<Review>,
}

impl Tables {
    fn user(&self, user_id: Uuid) -> PortResult<&UserRow> {
        self.users
            .get(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    fn user_mut(&mut self, user_id: Uuid) -> PortResult<&mut UserRow> {
        self.users
            .get_mut(&user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    fn store_mut(&mut self, store_id: Uuid) -> PortResult<&mut Store> {
        self.stores
            .iter_mut()
            .find(|s| s.id == store_id)
            .ok_or_else(|| PortError::NotFound(format!("Store {} not found", store_id)))
    }

    fn newest_first(&self, keep: impl Fn(&Store) -> bool) -> Vec<Store> {
        let mut out: Vec<Store> = self.stores.iter().filter(|s| keep(*s)).cloned().collect();
        out.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.id.cmp(&a.id)));
        out
    }

    fn apply_heart(&mut self, user_id: Uuid, store_id: Uuid, action: HeartAction) -> PortResult<User> {
        let row = self.user_mut(user_id)?;
        hearts::apply(&mut row.user.hearts, store_id, action);
        Ok(row.user.clone())
    }
}

/// A `DatabaseService` backed by process memory.
#[derive(Default)]
pub struct MemoryAdapter {
    tables: RwLock<Tables>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DatabaseService for MemoryAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        name: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|row| row.user.email.eq_ignore_ascii_case(email))
        {
            return Err(PortError::Conflict(format!(
                "An account for {} already exists",
                email
            )));
        }

        let user = User {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            hearts: Vec::new(),
        };
        tables.users.insert(
            user.user_id,
            UserRow {
                user: user.clone(),
                hashed_password: hashed_password.to_string(),
                reset: None,
            },
        );
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|row| row.user.email.eq_ignore_ascii_case(email))
            .map(|row| UserCredentials {
                user_id: row.user.user_id,
                email: row.user.email.clone(),
                hashed_password: row.hashed_password.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("No account for {}", email)))
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let tables = self.tables.read().await;
        Ok(tables.user(user_id)?.user.clone())
    }

    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        tables.user_mut(user_id)?.reset = Some((token.to_string(), expires_at));
        Ok(())
    }

    async fn get_user_by_reset_token(&self, token: &str, now: DateTime<Utc>) -> PortResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|row| {
                matches!(&row.reset, Some((t, expires)) if t == token && *expires > now)
            })
            .map(|row| row.user.clone())
            .ok_or_else(|| PortError::NotFound("Password reset is invalid or expired".to_string()))
    }

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let row = tables.user_mut(user_id)?;
        row.hashed_password = hashed_password.to_string();
        row.reset = None;
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let session = AuthSession {
            id: session_id.to_string(),
            user_id,
            expires_at,
        };
        let mut tables = self.tables.write().await;
        tables.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let tables = self.tables.read().await;
        match tables.sessions.get(session_id) {
            Some(session) if session.expires_at > Utc::now() => Ok(session.user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables.write().await.sessions.remove(session_id);
        Ok(())
    }

    async fn add_heart(&self, user_id: Uuid, store_id: Uuid) -> PortResult<User> {
        self.tables
            .write()
            .await
            .apply_heart(user_id, store_id, HeartAction::Add)
    }

    async fn remove_heart(&self, user_id: Uuid, store_id: Uuid) -> PortResult<User> {
        self.tables
            .write()
            .await
            .apply_heart(user_id, store_id, HeartAction::Remove)
    }

    async fn count_slug_family(&self, base: &str, exclude: Option<Uuid>) -> PortResult<usize> {
        let family = SlugFamily::new(base).map_err(|e| PortError::Unexpected(e.to_string()))?;
        let tables = self.tables.read().await;
        Ok(tables
            .stores
            .iter()
            .filter(|s| Some(s.id) != exclude && family.matches(&s.slug))
            .count())
    }

    async fn create_store(&self, fields: &StoreFields, slug: &str) -> PortResult<Store> {
        let store = Store {
            id: Uuid::new_v4(),
            name: fields.name.clone(),
            slug: slug.to_string(),
            description: fields.description.clone(),
            tags: fields.tags.clone(),
            created: Utc::now(),
            location: fields.location.clone(),
            photo: fields.photo.clone(),
            author: fields.author,
        };
        self.tables.write().await.stores.push(store.clone());
        Ok(store)
    }

    async fn update_store(
        &self,
        store_id: Uuid,
        fields: &StoreFields,
        slug: &str,
    ) -> PortResult<Store> {
        let mut tables = self.tables.write().await;
        let store = tables.store_mut(store_id)?;
        store.name = fields.name.clone();
        store.slug = slug.to_string();
        store.description = fields.description.clone();
        store.tags = fields.tags.clone();
        store.location = fields.location.clone();
        store.photo = fields.photo.clone();
        Ok(store.clone())
    }

    async fn get_store_by_id(&self, store_id: Uuid) -> PortResult<Store> {
        let tables = self.tables.read().await;
        tables
            .stores
            .iter()
            .find(|s| s.id == store_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Store {} not found", store_id)))
    }

    async fn get_store_by_slug(&self, slug: &str) -> PortResult<Store> {
        let tables = self.tables.read().await;
        tables
            .stores
            .iter()
            .find(|s| s.slug == slug)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Store {} not found", slug)))
    }

    async fn list_stores(&self, skip: i64, limit: i64) -> PortResult<Vec<Store>> {
        let tables = self.tables.read().await;
        let skip = usize::try_from(skip).unwrap_or_default();
        let limit = usize::try_from(limit).unwrap_or_default();
        Ok(tables
            .newest_first(|_| true)
            .into_iter()
            .skip(skip)
            .take(limit)
            .collect())
    }

    async fn count_stores(&self) -> PortResult<i64> {
        Ok(self.tables.read().await.stores.len() as i64)
    }

    async fn get_stores_by_tag(&self, tag: Option<&str>) -> PortResult<Vec<Store>> {
        let tables = self.tables.read().await;
        Ok(match tag {
            Some(tag) => tables.newest_first(|s| s.tags.iter().any(|t| t == tag)),
            None => tables.newest_first(|_| true),
        })
    }

    async fn get_stores_by_ids(&self, ids: &[Uuid]) -> PortResult<Vec<Store>> {
        let tables = self.tables.read().await;
        Ok(tables.newest_first(|s| ids.contains(&s.id)))
    }

    async fn get_tags_list(&self) -> PortResult<Vec<TagCount>> {
        let tables = self.tables.read().await;
        Ok(aggregate::count_tags(&tables.stores))
    }

    async fn get_top_stores(&self) -> PortResult<Vec<TopStore>> {
        let tables = self.tables.read().await;
        Ok(aggregate::rank_top_stores(&tables.stores, &tables.reviews))
    }

    async fn find_stores_near(
        &self,
        point: GeoPoint,
        max_distance_meters: f64,
        limit: i64,
    ) -> PortResult<Vec<Store>> {
        let tables = self.tables.read().await;
        let mut near: Vec<(f64, &Store)> = tables
            .stores
            .iter()
            .map(|s| (point.distance_meters(&s.location.point), s))
            .filter(|(distance, _)| *distance <= max_distance_meters)
            .collect();
        near.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(near
            .into_iter()
            .take(usize::try_from(limit).unwrap_or_default())
            .map(|(_, s)| s.clone())
            .collect())
    }

    async fn search_stores(&self, terms: &[String], limit: i64) -> PortResult<Vec<ScoredStore>> {
        let tables = self.tables.read().await;
        let mut hits: Vec<ScoredStore> = tables
            .stores
            .iter()
            .map(|s| ScoredStore {
                score: search::relevance(terms, &s.name, s.description.as_deref()),
                store: s.clone(),
            })
            .filter(|hit| hit.score > 0.0)
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.store.id.cmp(&b.store.id))
        });
        hits.truncate(usize::try_from(limit).unwrap_or_default());
        Ok(hits)
    }

    async fn create_review(&self, review: NewReview) -> PortResult<Review> {
        let mut tables = self.tables.write().await;
        if !tables.stores.iter().any(|s| s.id == review.store) {
            return Err(PortError::NotFound(format!("Store {} not found", review.store)));
        }
        let review = Review {
            id: Uuid::new_v4(),
            store: review.store,
            author: review.author,
            text: review.text,
            rating: review.rating,
            created: Utc::now(),
        };
        tables.reviews.push(review.clone());
        Ok(review)
    }

    async fn get_reviews_for_store(&self, store_id: Uuid) -> PortResult<Vec<Review>> {
        let tables = self.tables.read().await;
        let mut reviews: Vec<Review> = tables
            .reviews
            .iter()
            .filter(|r| r.store == store_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(reviews)
    }
}
