//! Error types for rejected session inputs.

use thiserror::Error;

use crate::model::Points;

/// Input a session refused in its current state.
///
/// These are never fatal; the session is left untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("{action} is not allowed while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    #[error("enter an order amount greater than zero")]
    AmountRequired,

    #[error("order amount earns {0} points")]
    NoPoints(Points),
}
