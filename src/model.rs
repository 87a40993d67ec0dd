//! Core domain types for the scan & award workflow.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Amount;

/// Customer identifier as issued by the backend.
pub type CustomerId = String;

/// Reward points. Signed so that backend payloads never fail to decode.
pub type Points = i64;

/// How a seller rewards customers per scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardType {
    /// Flat points per scan, taken from the seller's default.
    #[default]
    Default,
    /// Explicit flat value, distinct from the default.
    Flat,
    /// Percent of the order amount.
    Percentage,
    /// Tiered order-amount ranges.
    Slab,
}

impl RewardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardType::Default => "default",
            RewardType::Flat => "flat",
            RewardType::Percentage => "percentage",
            RewardType::Slab => "slab",
        }
    }

    /// Parse a reward type name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "default" => Some(RewardType::Default),
            "flat" => Some(RewardType::Flat),
            "percentage" | "percent" => Some(RewardType::Percentage),
            "slab" => Some(RewardType::Slab),
            _ => None,
        }
    }
}

impl fmt::Display for RewardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One order-amount range, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlabRule {
    pub min: Amount,
    pub max: Amount,
    pub points: Points,
}

impl SlabRule {
    pub fn contains(&self, amount: Amount) -> bool {
        self.min <= amount && amount <= self.max
    }
}

/// Normalized reward configuration of a seller.
///
/// Only the value field matching `reward_type` is authoritative; the
/// others are carried along untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewardScheme {
    pub reward_type: RewardType,
    pub default_points: Points,
    pub flat_points: Points,
    pub percentage_value: Amount,
    pub slab_rules: Vec<SlabRule>,
}

impl RewardScheme {
    pub fn default_points(points: Points) -> Self {
        Self {
            reward_type: RewardType::Default,
            default_points: points,
            ..Self::default()
        }
    }

    pub fn flat(points: Points) -> Self {
        Self {
            reward_type: RewardType::Flat,
            flat_points: points,
            ..Self::default()
        }
    }

    pub fn percentage(percent: Amount) -> Self {
        Self {
            reward_type: RewardType::Percentage,
            percentage_value: percent,
            ..Self::default()
        }
    }

    pub fn slab(rules: Vec<SlabRule>) -> Self {
        Self {
            reward_type: RewardType::Slab,
            slab_rules: rules,
            ..Self::default()
        }
    }

    /// Whether the seller must enter an order amount before awarding.
    pub fn requires_amount(&self) -> bool {
        matches!(
            self.reward_type,
            RewardType::Percentage | RewardType::Slab
        )
    }
}

/// Outcome of validating a scanned code against the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of the points-award request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AwardResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub points_awarded: Points,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a redemption request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RedemptionResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub points_redeemed: Points,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `POST /validateCustomerQR`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidateQrRequest {
    pub qr_data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
}

/// Body of `POST /awardPointsToCustomer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AwardPointsRequest {
    pub customer_id: CustomerId,
    pub points: Points,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_amount: Option<Amount>,
    pub reward_type: RewardType,
}

/// Body of `POST /processRedemption`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessRedemptionRequest {
    pub redemption_id: String,
}
