use crate::Amount;
use crate::model::{Points, RewardScheme, RewardType};

/// Compute the points one transaction earns under `scheme`.
///
/// - `Default` / `Flat`: the configured value, amount ignored
/// - `Percentage`: `floor(amount * percentage / 100)`
/// - `Slab`: points of the first rule (in order) containing the amount, else 0
///
/// A missing amount earns 0 for amount-based schemes. This is a preview only;
/// the backend recomputes the authoritative value.
pub fn calculate_points(scheme: &RewardScheme, order_amount: Option<Amount>) -> Points {
    match scheme.reward_type {
        RewardType::Default => scheme.default_points,
        RewardType::Flat => scheme.flat_points,
        RewardType::Percentage => order_amount
            .map(|amount| amount.percent_floor(scheme.percentage_value))
            .unwrap_or(0),
        RewardType::Slab => order_amount
            .and_then(|amount| scheme.slab_rules.iter().find(|rule| rule.contains(amount)))
            .map(|rule| rule.points)
            .unwrap_or(0),
    }
}
