//! Server module for the JSON-RPC API.
//!
//! This module provides:
//! - JSON-RPC 2.0 server implementation over stdio
//! - Method handlers and routing
//! - Token authentication of incoming requests
//! - Shared application state management

mod api;
mod handlers;

pub use api::*;
pub use handlers::*;

use std::sync::Arc;

use crate::auth::TokenValidator;
use crate::config::Config;
use crate::flow::FlowService;
use crate::storage::SqliteStorage;

/// Application state shared across handlers.
///
/// Contains the storage backend, the token validator consulted before
/// any method dispatch, and the flow service that enforces branching
/// rules on writes.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// SQLite storage backend.
    pub storage: SqliteStorage,
    /// Bearer token validator.
    pub auth: TokenValidator,
    /// Question flow service.
    pub flows: FlowService,
}

impl AppState {
    /// Create new application state
    pub fn new(config: Config, storage: SqliteStorage) -> Self {
        let auth = TokenValidator::new(&config.auth);
        let flows = FlowService::new(storage.clone());

        Self {
            config,
            storage,
            auth,
            flows,
        }
    }
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;
