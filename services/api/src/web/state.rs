//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use store_locator_core::ports::{DatabaseService, MailService};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub mail: Arc<dyn MailService>,
    pub config: Arc<Config>,
}
