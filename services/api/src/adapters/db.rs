//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Geospatial queries rely on the `cube` and `earthdistance` extensions; text
//! search uses the built-in `english` configuration.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use store_locator_core::aggregate::{MIN_REVIEWS_FOR_RANKING, TOP_STORES_LIMIT};
use store_locator_core::domain::{
    Location, NewReview, Review, ScoredStore, Store, StoreFields, TagCount, TopStore, User,
    UserCredentials,
};
use store_locator_core::geo::GeoPoint;
use store_locator_core::ports::{DatabaseService, PortError, PortResult};
use store_locator_core::{search, slug};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn load_user(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT u.user_id, u.email, u.name,
                   COALESCE(
                       array_agg(h.store_id ORDER BY h.created_at) FILTER (WHERE h.store_id IS NOT NULL),
                       '{}'
                   ) AS hearts
            FROM users u
            LEFT JOIN hearts h ON h.user_id = u.user_id
            WHERE u.user_id = $1
            GROUP BY u.user_id
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;
        Ok(record.to_domain())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

const STORE_COLUMNS: &str =
    "id, name, slug, description, tags, created, lng, lat, address, photo, author";

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
    name: String,
    hearts: Vec<Uuid>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
            name: self.name,
            hearts: self.hearts,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}

#[derive(FromRow)]
struct StoreRecord {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    tags: Vec<String>,
    created: DateTime<Utc>,
    lng: f64,
    lat: f64,
    address: String,
    photo: Option<String>,
    author: Uuid,
}
impl StoreRecord {
    fn to_domain(self) -> Store {
        Store {
            id: self.id,
            name: self.name,
            slug: self.slug,
            description: self.description,
            tags: self.tags,
            created: self.created,
            location: Location {
                point: GeoPoint {
                    lng: self.lng,
                    lat: self.lat,
                },
                address: self.address,
            },
            photo: self.photo,
            author: self.author,
        }
    }
}

#[derive(FromRow)]
struct ScoredStoreRecord {
    #[sqlx(flatten)]
    store: StoreRecord,
    score: f64,
}

#[derive(FromRow)]
struct TagRecord {
    tag: String,
    count: i64,
}

#[derive(FromRow)]
struct TopStoreRecord {
    id: Uuid,
    name: String,
    slug: String,
    photo: Option<String>,
    average_rating: f64,
    review_count: i64,
}

#[derive(FromRow)]
struct ReviewRecord {
    id: Uuid,
    store_id: Uuid,
    author_id: Uuid,
    text: String,
    rating: i32,
    created: DateTime<Utc>,
}
impl ReviewRecord {
    fn to_domain(self) -> Review {
        Review {
            id: self.id,
            store: self.store_id,
            author: self.author_id,
            text: self.text,
            rating: self.rating,
            created: self.created,
        }
    }
}

fn stores(records: Vec<StoreRecord>) -> Vec<Store> {
    records.into_iter().map(StoreRecord::to_domain).collect()
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        name: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let user_id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (user_id, email, name, hashed_password) VALUES ($1, $2, $3, $4)")
            .bind(user_id)
            .bind(email)
            .bind(name)
            .bind(hashed_password)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    PortError::Conflict(format!("An account for {} already exists", email))
                }
                other => unexpected(other),
            })?;

        Ok(User {
            user_id,
            email: email.to_string(),
            name: name.to_string(),
            hearts: Vec::new(),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("No account for {}", email)))?;

        Ok(UserCredentials {
            user_id: record.user_id,
            email: record.email,
            hashed_password: record.hashed_password,
        })
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.load_user(user_id).await
    }

    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query(
            "UPDATE users SET reset_password_token = $1, reset_password_expires = $2 WHERE user_id = $3",
        )
        .bind(token)
        .bind(expires_at)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_user_by_reset_token(&self, token: &str, now: DateTime<Utc>) -> PortResult<User> {
        let user_id: Uuid = sqlx::query_scalar(
            "SELECT user_id FROM users WHERE reset_password_token = $1 AND reset_password_expires > $2",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound("Password reset is invalid or expired".to_string()))?;

        self.load_user(user_id).await
    }

    async fn update_password(&self, user_id: Uuid, hashed_password: &str) -> PortResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET hashed_password = $1, reset_password_token = NULL, reset_password_expires = NULL
            WHERE user_id = $2
            "#,
        )
        .bind(hashed_password)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        sqlx::query_scalar("SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn add_heart(&self, user_id: Uuid, store_id: Uuid) -> PortResult<User> {
        sqlx::query("INSERT INTO hearts (user_id, store_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(store_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        self.load_user(user_id).await
    }

    async fn remove_heart(&self, user_id: Uuid, store_id: Uuid) -> PortResult<User> {
        sqlx::query("DELETE FROM hearts WHERE user_id = $1 AND store_id = $2")
            .bind(user_id)
            .bind(store_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        self.load_user(user_id).await
    }

    async fn count_slug_family(&self, base: &str, exclude: Option<Uuid>) -> PortResult<usize> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM stores WHERE slug ~* $1 AND ($2::uuid IS NULL OR id <> $2)",
        )
        .bind(slug::family_pattern(base))
        .bind(exclude)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn create_store(&self, fields: &StoreFields, slug: &str) -> PortResult<Store> {
        let record = sqlx::query_as::<_, StoreRecord>(&format!(
            r#"
            INSERT INTO stores (id, name, slug, description, tags, lng, lat, address, photo, author)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {STORE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&fields.name)
        .bind(slug)
        .bind(&fields.description)
        .bind(&fields.tags)
        .bind(fields.location.point.lng)
        .bind(fields.location.point.lat)
        .bind(&fields.location.address)
        .bind(&fields.photo)
        .bind(fields.author)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn update_store(
        &self,
        store_id: Uuid,
        fields: &StoreFields,
        slug: &str,
    ) -> PortResult<Store> {
        let record = sqlx::query_as::<_, StoreRecord>(&format!(
            r#"
            UPDATE stores
            SET name = $2, slug = $3, description = $4, tags = $5,
                lng = $6, lat = $7, address = $8, photo = $9
            WHERE id = $1
            RETURNING {STORE_COLUMNS}
            "#
        ))
        .bind(store_id)
        .bind(&fields.name)
        .bind(slug)
        .bind(&fields.description)
        .bind(&fields.tags)
        .bind(fields.location.point.lng)
        .bind(fields.location.point.lat)
        .bind(&fields.location.address)
        .bind(&fields.photo)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Store {} not found", store_id)))?;
        Ok(record.to_domain())
    }

    async fn get_store_by_id(&self, store_id: Uuid) -> PortResult<Store> {
        let record = sqlx::query_as::<_, StoreRecord>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"
        ))
        .bind(store_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Store {} not found", store_id)))?;
        Ok(record.to_domain())
    }

    async fn get_store_by_slug(&self, slug: &str) -> PortResult<Store> {
        let record = sqlx::query_as::<_, StoreRecord>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE slug = $1 ORDER BY created ASC LIMIT 1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Store {} not found", slug)))?;
        Ok(record.to_domain())
    }

    async fn list_stores(&self, skip: i64, limit: i64) -> PortResult<Vec<Store>> {
        let records = sqlx::query_as::<_, StoreRecord>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores ORDER BY created DESC, id DESC OFFSET $1 LIMIT $2"
        ))
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(stores(records))
    }

    async fn count_stores(&self) -> PortResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM stores")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn get_stores_by_tag(&self, tag: Option<&str>) -> PortResult<Vec<Store>> {
        let records = sqlx::query_as::<_, StoreRecord>(&format!(
            r#"
            SELECT {STORE_COLUMNS} FROM stores
            WHERE $1::text IS NULL OR $1 = ANY(tags)
            ORDER BY created DESC
            "#
        ))
        .bind(tag)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(stores(records))
    }

    async fn get_stores_by_ids(&self, ids: &[Uuid]) -> PortResult<Vec<Store>> {
        let records = sqlx::query_as::<_, StoreRecord>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = ANY($1) ORDER BY created DESC"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(stores(records))
    }

    async fn get_tags_list(&self) -> PortResult<Vec<TagCount>> {
        let records = sqlx::query_as::<_, TagRecord>(
            r#"
            SELECT tag, COUNT(*) AS count
            FROM stores, unnest(tags) AS tag
            GROUP BY tag
            ORDER BY count DESC, tag ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records
            .into_iter()
            .map(|r| TagCount {
                tag: r.tag,
                count: r.count,
            })
            .collect())
    }

    async fn get_top_stores(&self) -> PortResult<Vec<TopStore>> {
        let records = sqlx::query_as::<_, TopStoreRecord>(
            r#"
            SELECT s.id, s.name, s.slug, s.photo,
                   AVG(r.rating)::float8 AS average_rating,
                   COUNT(r.id) AS review_count
            FROM stores s
            JOIN reviews r ON r.store_id = s.id
            GROUP BY s.id
            HAVING COUNT(r.id) >= $1
            ORDER BY average_rating DESC, s.id ASC
            LIMIT $2
            "#,
        )
        .bind(MIN_REVIEWS_FOR_RANKING as i64)
        .bind(TOP_STORES_LIMIT as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records
            .into_iter()
            .map(|r| TopStore {
                id: r.id,
                name: r.name,
                slug: r.slug,
                photo: r.photo,
                average_rating: r.average_rating,
                review_count: r.review_count,
            })
            .collect())
    }

    async fn find_stores_near(
        &self,
        point: GeoPoint,
        max_distance_meters: f64,
        limit: i64,
    ) -> PortResult<Vec<Store>> {
        let records = sqlx::query_as::<_, StoreRecord>(&format!(
            r#"
            SELECT {STORE_COLUMNS} FROM stores
            WHERE earth_box(ll_to_earth($2, $1), $3) @> ll_to_earth(lat, lng)
              AND earth_distance(ll_to_earth($2, $1), ll_to_earth(lat, lng)) <= $3
            ORDER BY earth_distance(ll_to_earth($2, $1), ll_to_earth(lat, lng)) ASC
            LIMIT $4
            "#
        ))
        .bind(point.lng)
        .bind(point.lat)
        .bind(max_distance_meters)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(stores(records))
    }

    async fn search_stores(&self, terms: &[String], limit: i64) -> PortResult<Vec<ScoredStore>> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let records = sqlx::query_as::<_, ScoredStoreRecord>(&format!(
            r#"
            SELECT {STORE_COLUMNS},
                   ts_rank(to_tsvector('english', name || ' ' || coalesce(description, '')), query)::float8 AS score
            FROM stores, to_tsquery('english', $1) AS query
            WHERE to_tsvector('english', name || ' ' || coalesce(description, '')) @@ query
            ORDER BY score DESC, id ASC
            LIMIT $2
            "#
        ))
        .bind(search::ts_query(terms))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records
            .into_iter()
            .map(|r| ScoredStore {
                store: r.store.to_domain(),
                score: r.score,
            })
            .collect())
    }

    async fn create_review(&self, review: NewReview) -> PortResult<Review> {
        let record = sqlx::query_as::<_, ReviewRecord>(
            r#"
            INSERT INTO reviews (id, store_id, author_id, text, rating)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, store_id, author_id, text, rating, created
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(review.store)
        .bind(review.author)
        .bind(&review.text)
        .bind(review.rating)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_reviews_for_store(&self, store_id: Uuid) -> PortResult<Vec<Review>> {
        let records = sqlx::query_as::<_, ReviewRecord>(
            r#"
            SELECT id, store_id, author_id, text, rating, created
            FROM reviews WHERE store_id = $1 ORDER BY created DESC
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(ReviewRecord::to_domain).collect())
    }
}
