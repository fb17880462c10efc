//! services/api/src/web/api.rs
//!
//! JSON endpoints used by the browser scripts: type-ahead search, the map's
//! nearby-stores query and the heart toggle.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use store_locator_core::geo::{near_limit, GeoPoint, MAX_NEAR_DISTANCE_METERS};
use store_locator_core::hearts::{toggle_action, HeartAction};
use store_locator_core::search::{self, SEARCH_LIMIT};
use tracing::{debug, info};
use utoipa::IntoParams;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::AppState;
use crate::web::views::{NearStoreView, SearchResultView, UserView};

#[derive(Deserialize, IntoParams)]
pub struct SearchParams {
    /// Free-text query matched against store names and descriptions.
    pub q: Option<String>,
}

/// Coordinates arrive as raw strings so bad input maps to a 400 with a field message.
#[derive(Deserialize, IntoParams)]
pub struct NearParams {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/search?q= - Top text matches by relevance
#[utoipa::path(
    get,
    path = "/api/search",
    params(SearchParams),
    responses((status = 200, description = "Matching stores, best first", body = [SearchResultView]))
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchResultView>>, ApiError> {
    let terms = search::terms(params.q.as_deref().unwrap_or_default());
    if terms.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let hits = state.db.search_stores(&terms, SEARCH_LIMIT).await?;
    debug!(terms = ?terms, hits = hits.len(), "Store search");
    Ok(Json(hits.into_iter().map(SearchResultView::from).collect()))
}

/// GET /api/stores/near?lat=&lng= - Stores within 10 km, nearest first
#[utoipa::path(
    get,
    path = "/api/stores/near",
    params(NearParams),
    responses(
        (status = 200, description = "Nearby stores, nearest first", body = [NearStoreView]),
        (status = 400, description = "Missing or invalid coordinates")
    )
)]
pub async fn stores_near_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NearParams>,
) -> Result<Json<Vec<NearStoreView>>, ApiError> {
    let (Some(lng), Some(lat)) = (params.lng.as_deref(), params.lat.as_deref()) else {
        return Err(ApiError::BadRequest(
            "Both lat and lng are required".to_string(),
        ));
    };
    let point = GeoPoint::parse(lng, lat)?;

    let stores = state
        .db
        .find_stores_near(point, MAX_NEAR_DISTANCE_METERS, near_limit(params.limit))
        .await?;
    Ok(Json(stores.into_iter().map(NearStoreView::from).collect()))
}

/// POST /api/stores/{id}/heart - Heart or un-heart a store
#[utoipa::path(
    post,
    path = "/api/stores/{id}/heart",
    params(("id" = Uuid, Path, description = "Store id")),
    responses(
        (status = 200, description = "The user with updated hearts", body = UserView),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "No such store")
    )
)]
pub async fn heart_store_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(store_id): Path<Uuid>,
) -> Result<Json<UserView>, ApiError> {
    let (user, _store) = tokio::try_join!(
        state.db.get_user_by_id(user_id),
        state.db.get_store_by_id(store_id)
    )?;

    let action = toggle_action(&user.hearts, store_id);
    let user = match action {
        HeartAction::Add => state.db.add_heart(user_id, store_id).await?,
        HeartAction::Remove => state.db.remove_heart(user_id, store_id).await?,
    };

    info!(user_id = %user_id, store_id = %store_id, action = ?action, "Heart toggled");
    Ok(Json(user.into()))
}
