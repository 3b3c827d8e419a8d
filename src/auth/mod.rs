//! Bearer-token authentication for the access surface.
//!
//! Every data operation requires a recognized caller token, carried in
//! the `auth` field of the request envelope (the HTTP gateway in front
//! of this service copies it out of the `Authorization` header).
//! Requests failing the check are rejected before any handler or
//! storage code runs.

use std::collections::HashSet;

use crate::config::AuthConfig;
use crate::error::{ApiError, ApiResult};

/// Validates request credentials against the configured token set.
#[derive(Debug, Clone)]
pub struct TokenValidator {
    tokens: HashSet<String>,
}

impl TokenValidator {
    /// Build a validator from the configured tokens
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            tokens: config.tokens.iter().cloned().collect(),
        }
    }

    /// Check a caller credential.
    ///
    /// Missing and unrecognized tokens get the same rejection; the
    /// response never reveals which case it was.
    pub fn authenticate(&self, token: Option<&str>) -> ApiResult<()> {
        match token {
            Some(t) if self.tokens.contains(t) => Ok(()),
            _ => Err(ApiError::Unauthenticated),
        }
    }
}
