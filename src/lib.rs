//! # Surveyflow
//!
//! A branching-survey authoring service. Surveys are built from ordered
//! questions and answers; question flows connect them into a branching
//! graph that decides which question a respondent sees next.
//!
//! ## Features
//!
//! - **Surveys, Questions, Answers**: Ordered building blocks with full CRUD
//! - **Question Flows**: `any-answer` and `specific-answer` branching edges
//! - **Flow Validation**: Ownership, self-loop, and duplicate rules checked
//!   in a fixed order before any write
//! - **Routing**: Most-specific-wins resolution of the next question for a
//!   chosen answer
//! - **Token-gated API**: JSON-RPC 2.0 over stdio, authenticated per request
//!
//! ## Architecture
//!
//! ```text
//! API Client → JSON-RPC Server (stdio) → FlowService (validation)
//!                       ↓
//!         SQLite (surveys, questions, answers, flows)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use surveyflow::{ApiServer, AppState, Config};
//! use surveyflow::storage::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let storage = SqliteStorage::new(&config.database).await?;
//!     let state = Arc::new(AppState::new(config, storage));
//!     let server = ApiServer::new(state);
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Token authentication for API requests.
pub mod auth;
/// Configuration management for the service.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Question flow validation, write operations, and routing.
pub mod flow;
/// JSON-RPC server implementation and request handling.
pub mod server;
/// SQLite storage layer for persistence.
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use server::{ApiServer, AppState, SharedState};
