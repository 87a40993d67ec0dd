//! Reward configuration and points calculation.
//!
//! The resolver projects an arbitrary seller profile onto a [`RewardScheme`];
//! the calculator turns a scheme and an order amount into points.

mod calculator;
pub use calculator::calculate_points;

mod resolver;
pub use resolver::{ConfigWarning, FALLBACK_DEFAULT_POINTS, ResolvedScheme, resolve_scheme};

pub use crate::model::{RewardScheme, RewardType, SlabRule};
