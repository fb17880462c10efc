pub mod api;
pub mod auth;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod stores;
pub mod views;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use middleware::require_auth;
pub use rest::ApiDoc;
pub use state::AppState;

/// Builds the full application router: public pages, session-protected
/// routes, and the Swagger UI.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(stores::list_stores_handler))
        .route("/stores", get(stores::list_stores_handler))
        .route("/stores/page/{page}", get(stores::stores_page_handler))
        .route("/store/{slug}", get(stores::store_by_slug_handler))
        .route("/tags", get(stores::tags_handler))
        .route("/tags/{tag}", get(stores::stores_by_tag_handler))
        .route("/top", get(stores::top_stores_handler))
        .route("/api/search", get(api::search_handler))
        .route("/api/stores/near", get(api::stores_near_handler))
        .route("/register", post(auth::signup_handler))
        .route("/login", post(auth::login_handler))
        .route("/logout", get(auth::logout_handler))
        .route("/account/forgot", post(auth::forgot_handler))
        .route(
            "/account/reset/{token}",
            get(auth::reset_form_handler).post(auth::reset_password_handler),
        );

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/add", post(stores::create_store_handler))
        .route("/add/{id}", post(stores::update_store_handler))
        .route("/stores/{id}/edit", get(stores::edit_store_handler))
        .route("/hearts", get(stores::hearted_stores_handler))
        .route("/reviews/{id}", post(stores::add_review_handler))
        .route("/api/stores/{id}/heart", post(api::heart_store_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
