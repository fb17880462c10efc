//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use utoipa::OpenApi;

use crate::web::{api, auth, stores, views};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        stores::list_stores_handler,
        stores::stores_page_handler,
        stores::create_store_handler,
        stores::edit_store_handler,
        stores::update_store_handler,
        stores::store_by_slug_handler,
        stores::tags_handler,
        stores::stores_by_tag_handler,
        stores::top_stores_handler,
        stores::hearted_stores_handler,
        stores::add_review_handler,
        api::search_handler,
        api::stores_near_handler,
        api::heart_store_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::forgot_handler,
        auth::reset_form_handler,
        auth::reset_password_handler,
    ),
    components(
        schemas(
            stores::StoreInput,
            stores::LocationInput,
            stores::ReviewInput,
            stores::StoreListResponse,
            stores::StoresResponse,
            stores::StoreDetailResponse,
            stores::TagPageResponse,
            stores::TopStoresResponse,
            views::StoreView,
            views::LocationView,
            views::NearStoreView,
            views::SearchResultView,
            views::UserView,
            views::AuthorView,
            views::ReviewView,
            views::TagCountView,
            views::TopStoreView,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            auth::ForgotRequest,
            auth::ResetRequest,
            auth::ResetPageResponse,
        )
    ),
    tags(
        (name = "Store Locator API", description = "Store listings, reviews, hearts, search and accounts.")
    )
)]
pub struct ApiDoc;
