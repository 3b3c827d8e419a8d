//! Question-flow graph logic.
//!
//! This module owns everything about the edges between questions:
//! - [`validator`]: integrity rules a candidate edge must pass
//! - [`FlowService`]: validated CRUD over stored edges
//! - [`routing`]: resolving which question an answer leads to
//!
//! The validator is pure and synchronous; the service resolves request
//! ids against storage, feeds the validator, and persists only candidates
//! that pass.

pub mod routing;
pub mod validator;

mod service;

pub use service::*;
pub use validator::{AnswerBinding, FlowCandidate};
