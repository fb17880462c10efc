//! services/api/src/web/stores.rs
//!
//! Store pages: listing, create/edit, detail, tags, top stores and reviews.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use store_locator_core::domain::StoreDetail;
use store_locator_core::listing::{resolve_page, PageOutcome, PageRequest};
use store_locator_core::ports::{DatabaseService, PortResult};
use store_locator_core::slug;
use store_locator_core::validation::{validate_review, StoreDraft};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;
use crate::web::views::{
    store_views, AuthorView, ReviewView, StoreView, TagCountView, TopStoreView,
};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema, Default)]
pub struct LocationInput {
    pub coordinates: Option<Vec<f64>>,
    pub address: Option<String>,
}

/// Store fields as submitted by the add/edit form.
#[derive(Deserialize, ToSchema)]
pub struct StoreInput {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub location: LocationInput,
    pub photo: Option<String>,
}

impl StoreInput {
    fn into_draft(self, author: Uuid) -> StoreDraft {
        StoreDraft {
            name: self.name,
            description: self.description,
            tags: self.tags,
            coordinates: self.location.coordinates,
            address: self.location.address,
            photo: self.photo,
            author: Some(author),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct StoreListResponse {
    pub title: String,
    pub stores: Vec<StoreView>,
    pub page: i64,
    pub pages: i64,
    pub count: i64,
}

#[derive(Serialize, ToSchema)]
pub struct StoresResponse {
    pub title: String,
    pub stores: Vec<StoreView>,
}

#[derive(Serialize, ToSchema)]
pub struct StoreDetailResponse {
    pub title: String,
    pub store: StoreView,
    pub author: AuthorView,
    pub reviews: Vec<ReviewView>,
}

impl From<StoreDetail> for StoreDetailResponse {
    fn from(detail: StoreDetail) -> Self {
        Self {
            title: detail.store.name.clone(),
            store: detail.store.into(),
            author: detail.author.into(),
            reviews: detail.reviews.into_iter().map(ReviewView::from).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct TagPageResponse {
    pub title: String,
    pub tag: Option<String>,
    pub tags: Vec<TagCountView>,
    pub stores: Vec<StoreView>,
}

#[derive(Serialize, ToSchema)]
pub struct TopStoresResponse {
    pub title: String,
    pub stores: Vec<TopStoreView>,
}

#[derive(Deserialize, ToSchema)]
pub struct ReviewInput {
    pub text: String,
    pub rating: i32,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Derives the slug for `name`, numbering it past any existing stores in the same family.
///
/// `editing` is left out of the count so a store never collides with itself.
pub async fn assign_slug(
    db: &dyn DatabaseService,
    name: &str,
    editing: Option<Uuid>,
) -> PortResult<String> {
    let base = slug::slugify(name);
    let matches = db.count_slug_family(&base, editing).await?;
    Ok(slug::disambiguate(&base, matches))
}

async fn store_page(state: &AppState, page: Option<i64>) -> Result<Response, ApiError> {
    let request = PageRequest::new(page);
    let (stores, count) = tokio::try_join!(
        state.db.list_stores(request.skip(), request.limit()),
        state.db.count_stores()
    )?;

    match resolve_page(request, stores.len(), count) {
        PageOutcome::RedirectTo { page: last } => {
            info!(requested = request.page, redirected_to = last, "Page out of range");
            Ok(Redirect::to(&format!(
                "/stores/page/{}?info=page_not_found&requested={}",
                last, request.page
            ))
            .into_response())
        }
        PageOutcome::Show { page, pages } => Ok(Json(StoreListResponse {
            title: "Stores".to_string(),
            stores: store_views(stores),
            page,
            pages,
            count,
        })
        .into_response()),
    }
}

async fn tag_page(state: &AppState, tag: Option<String>) -> Result<Json<TagPageResponse>, ApiError> {
    let (tags, stores) = tokio::try_join!(
        state.db.get_tags_list(),
        state.db.get_stores_by_tag(tag.as_deref())
    )?;

    Ok(Json(TagPageResponse {
        title: "Tags".to_string(),
        tag,
        tags: tags.into_iter().map(TagCountView::from).collect(),
        stores: store_views(stores),
    }))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /stores - First page of stores, newest first
#[utoipa::path(
    get,
    path = "/stores",
    responses((status = 200, description = "First page of stores", body = StoreListResponse))
)]
pub async fn list_stores_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    store_page(&state, None).await
}

/// GET /stores/page/{page} - A page of stores; past-the-end pages redirect to the last one
#[utoipa::path(
    get,
    path = "/stores/page/{page}",
    params(("page" = i64, Path, description = "1-based page number")),
    responses(
        (status = 200, description = "Page of stores", body = StoreListResponse),
        (status = 303, description = "Page out of range, redirected to the last page")
    )
)]
pub async fn stores_page_handler(
    State(state): State<Arc<AppState>>,
    Path(page): Path<i64>,
) -> Result<Response, ApiError> {
    store_page(&state, Some(page)).await
}

/// POST /add - Create a store owned by the current user
#[utoipa::path(
    post,
    path = "/add",
    request_body = StoreInput,
    responses(
        (status = 201, description = "Store created", body = StoreView),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn create_store_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(input): Json<StoreInput>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = input.into_draft(user_id).validate()?;
    let slug = assign_slug(state.db.as_ref(), &fields.name, None).await?;
    let store = state.db.create_store(&fields, &slug).await?;

    info!(store_id = %store.id, slug = %store.slug, "Successfully created {}", store.name);
    let location = format!("/store/{}", store.slug);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(StoreView::from(store)),
    ))
}

/// GET /stores/{id}/edit - Load a store for editing (owner only)
#[utoipa::path(
    get,
    path = "/stores/{id}/edit",
    params(("id" = Uuid, Path, description = "Store id")),
    responses(
        (status = 200, description = "Store to edit", body = StoreView),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such store")
    )
)]
pub async fn edit_store_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(store_id): Path<Uuid>,
) -> Result<Json<StoreView>, ApiError> {
    let store = state.db.get_store_by_id(store_id).await?;
    store.confirm_owner(user_id)?;
    Ok(Json(store.into()))
}

/// POST /add/{id} - Update a store (owner only)
#[utoipa::path(
    post,
    path = "/add/{id}",
    params(("id" = Uuid, Path, description = "Store id")),
    request_body = StoreInput,
    responses(
        (status = 200, description = "Store updated", body = StoreView),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such store")
    )
)]
pub async fn update_store_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(store_id): Path<Uuid>,
    Json(input): Json<StoreInput>,
) -> Result<Json<StoreView>, ApiError> {
    let existing = state.db.get_store_by_id(store_id).await?;
    existing.confirm_owner(user_id)?;

    // The author never changes on edit, and an edit without a new photo keeps the old one.
    let mut fields = input.into_draft(existing.author).validate()?;
    fields.photo = fields.photo.or(existing.photo);

    let slug = if slug::slugify(&fields.name) == slug::slugify(&existing.name) {
        existing.slug
    } else {
        assign_slug(state.db.as_ref(), &fields.name, Some(store_id)).await?
    };

    let store = state.db.update_store(store_id, &fields, &slug).await?;
    info!(store_id = %store.id, slug = %store.slug, "Successfully updated {}", store.name);
    Ok(Json(store.into()))
}

/// GET /store/{slug} - A store with its author and reviews
#[utoipa::path(
    get,
    path = "/store/{slug}",
    params(("slug" = String, Path, description = "Store slug")),
    responses(
        (status = 200, description = "Store detail", body = StoreDetailResponse),
        (status = 404, description = "No such store")
    )
)]
pub async fn store_by_slug_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<StoreDetailResponse>, ApiError> {
    let store = state.db.get_store_by_slug(&slug).await?;
    let (author, reviews) = tokio::try_join!(
        state.db.get_user_by_id(store.author),
        state.db.get_reviews_for_store(store.id)
    )?;

    Ok(Json(StoreDetail { store, author, reviews }.into()))
}

/// GET /tags - Every tag with its count, and every store
#[utoipa::path(
    get,
    path = "/tags",
    responses((status = 200, description = "Tag counts and stores", body = TagPageResponse))
)]
pub async fn tags_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TagPageResponse>, ApiError> {
    tag_page(&state, None).await
}

/// GET /tags/{tag} - Every tag with its count, and the stores carrying `tag`
#[utoipa::path(
    get,
    path = "/tags/{tag}",
    params(("tag" = String, Path, description = "Tag to filter by")),
    responses((status = 200, description = "Tag counts and matching stores", body = TagPageResponse))
)]
pub async fn stores_by_tag_handler(
    State(state): State<Arc<AppState>>,
    Path(tag): Path<String>,
) -> Result<Json<TagPageResponse>, ApiError> {
    tag_page(&state, Some(tag)).await
}

/// GET /top - The best-rated stores
#[utoipa::path(
    get,
    path = "/top",
    responses((status = 200, description = "Top stores", body = TopStoresResponse))
)]
pub async fn top_stores_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TopStoresResponse>, ApiError> {
    let stores = state.db.get_top_stores().await?;
    Ok(Json(TopStoresResponse {
        title: "Top Stores".to_string(),
        stores: stores.into_iter().map(TopStoreView::from).collect(),
    }))
}

/// GET /hearts - Stores the current user has hearted
#[utoipa::path(
    get,
    path = "/hearts",
    responses(
        (status = 200, description = "Hearted stores", body = StoresResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn hearted_stores_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<StoresResponse>, ApiError> {
    let user = state.db.get_user_by_id(user_id).await?;
    let stores = state.db.get_stores_by_ids(&user.hearts).await?;
    Ok(Json(StoresResponse {
        title: "Hearted Stores".to_string(),
        stores: store_views(stores),
    }))
}

/// POST /reviews/{id} - Review a store
#[utoipa::path(
    post,
    path = "/reviews/{id}",
    params(("id" = Uuid, Path, description = "Store id")),
    request_body = ReviewInput,
    responses(
        (status = 201, description = "Review saved", body = ReviewView),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "No such store")
    )
)]
pub async fn add_review_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(store_id): Path<Uuid>,
    Json(input): Json<ReviewInput>,
) -> Result<impl IntoResponse, ApiError> {
    let review = validate_review(store_id, user_id, &input.text, input.rating)?;
    state.db.get_store_by_id(store_id).await?;

    let review = state.db.create_review(review).await?;
    info!(store_id = %store_id, rating = review.rating, "Review saved");
    Ok((StatusCode::CREATED, Json(ReviewView::from(review))))
}
