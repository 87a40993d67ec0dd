use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::Amount;
use crate::model::{Points, RewardScheme, RewardType, SlabRule};

/// Points per scan used when a seller has no usable default configured.
pub const FALLBACK_DEFAULT_POINTS: Points = 10;

/// A default the resolver had to apply because the profile was incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigWarning {
    #[error("reward type not configured, using default points")]
    MissingRewardType,
    #[error("unknown reward type '{0}', using default points")]
    UnknownRewardType(String),
    #[error("{field} not configured, using {fallback}")]
    MissingValue { field: &'static str, fallback: String },
    #[error("{field} has unusable value {raw}, using {fallback}")]
    UnparsableValue {
        field: &'static str,
        raw: String,
        fallback: String,
    },
    #[error("percentage {0} outside 0..=100, clamped")]
    PercentageOutOfRange(Amount),
    #[error("slab rule #{index} ignored: {reason}")]
    InvalidSlabRule { index: usize, reason: &'static str },
    #[error("slab scheme has no usable rules, every order earns 0 points")]
    NoSlabRules,
}

/// Result of resolving a seller profile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedScheme {
    pub scheme: RewardScheme,
    /// Defaults applied to the fields that matter for `scheme.reward_type`.
    pub warnings: Vec<ConfigWarning>,
}

impl ResolvedScheme {
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Project a seller profile of arbitrary shape onto a [`RewardScheme`].
///
/// Never fails: missing or malformed data degrades to defaults, each of which
/// is reported as a [`ConfigWarning`] and logged.
pub fn resolve_scheme(profile: &Value) -> ResolvedScheme {
    let empty = Map::new();
    let settings = reward_settings(profile).unwrap_or(&empty);
    let mut warnings = Vec::new();

    let reward_type = match lookup(settings, "reward_type", "rewardType")
        .or_else(|| lookup(settings, "type", "type"))
    {
        None => {
            warnings.push(ConfigWarning::MissingRewardType);
            RewardType::Default
        }
        Some(Value::String(name)) => RewardType::parse(name).unwrap_or_else(|| {
            warnings.push(ConfigWarning::UnknownRewardType(name.clone()));
            RewardType::Default
        }),
        Some(other) => {
            warnings.push(ConfigWarning::UnknownRewardType(other.to_string()));
            RewardType::Default
        }
    };

    let mut field_warnings = Vec::new();
    let default_points = read_points(
        settings,
        ("default_points", "defaultPoints"),
        FALLBACK_DEFAULT_POINTS,
        &mut field_warnings,
    );
    let default_warnings = std::mem::take(&mut field_warnings);

    let flat_points = read_points(settings, ("flat_points", "flatPoints"), 0, &mut field_warnings);
    let flat_warnings = std::mem::take(&mut field_warnings);

    let percentage_value = read_percentage(settings, &mut field_warnings);
    let percentage_warnings = std::mem::take(&mut field_warnings);

    let slab_rules = read_slab_rules(settings, &mut field_warnings);
    let slab_warnings = std::mem::take(&mut field_warnings);

    // only the authoritative field is worth reporting
    warnings.extend(match reward_type {
        RewardType::Default => default_warnings,
        RewardType::Flat => flat_warnings,
        RewardType::Percentage => percentage_warnings,
        RewardType::Slab => slab_warnings,
    });

    for warning in &warnings {
        warn!(reward_type = %reward_type, "incomplete reward configuration: {warning}");
    }

    ResolvedScheme {
        scheme: RewardScheme {
            reward_type,
            default_points,
            flat_points,
            percentage_value,
            slab_rules,
        },
        warnings,
    }
}

/// Reward settings live under `rewards` (or `reward_config`) or at the root.
fn reward_settings(profile: &Value) -> Option<&Map<String, Value>> {
    let root = profile.as_object()?;
    ["rewards", "reward_config", "rewardConfig"]
        .iter()
        .find_map(|key| root.get(*key).and_then(Value::as_object))
        .or(Some(root))
}

/// Look a key up in snake_case, then camelCase. `null` counts as missing.
fn lookup<'a>(settings: &'a Map<String, Value>, snake: &str, camel: &str) -> Option<&'a Value> {
    settings
        .get(snake)
        .or_else(|| settings.get(camel))
        .filter(|value| !value.is_null())
}

fn read_points(
    settings: &Map<String, Value>,
    (snake, camel): (&'static str, &str),
    fallback: Points,
    warnings: &mut Vec<ConfigWarning>,
) -> Points {
    match lookup(settings, snake, camel) {
        None => {
            warnings.push(ConfigWarning::MissingValue {
                field: snake,
                fallback: fallback.to_string(),
            });
            fallback
        }
        Some(value) => match Amount::from_json(value) {
            Some(amount) => amount.whole_part(),
            None => {
                warnings.push(ConfigWarning::UnparsableValue {
                    field: snake,
                    raw: value.to_string(),
                    fallback: fallback.to_string(),
                });
                fallback
            }
        },
    }
}

fn read_percentage(settings: &Map<String, Value>, warnings: &mut Vec<ConfigWarning>) -> Amount {
    const FIELD: &str = "percentage_value";
    let hundred = Amount::from_whole(100);

    let Some(value) = lookup(settings, FIELD, "percentageValue") else {
        warnings.push(ConfigWarning::MissingValue {
            field: FIELD,
            fallback: "0".to_string(),
        });
        return Amount::ZERO;
    };
    let Some(percent) = Amount::from_json(value) else {
        warnings.push(ConfigWarning::UnparsableValue {
            field: FIELD,
            raw: value.to_string(),
            fallback: "0".to_string(),
        });
        return Amount::ZERO;
    };

    if percent < Amount::ZERO {
        warnings.push(ConfigWarning::PercentageOutOfRange(percent));
        Amount::ZERO
    } else if percent > hundred {
        warnings.push(ConfigWarning::PercentageOutOfRange(percent));
        hundred
    } else {
        percent
    }
}

fn read_slab_rules(settings: &Map<String, Value>, warnings: &mut Vec<ConfigWarning>) -> Vec<SlabRule> {
    let rules: Vec<SlabRule> = match lookup(settings, "slab_rules", "slabRules") {
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match parse_slab_rule(entry) {
                Ok(rule) => Some(rule),
                Err(reason) => {
                    warnings.push(ConfigWarning::InvalidSlabRule { index, reason });
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    };

    if rules.is_empty() {
        warnings.push(ConfigWarning::NoSlabRules);
    }
    rules
}

fn parse_slab_rule(entry: &Value) -> Result<SlabRule, &'static str> {
    let rule = entry.as_object().ok_or("not an object")?;
    let min = rule.get("min").and_then(Amount::from_json).ok_or("invalid min")?;
    let max = rule.get("max").and_then(Amount::from_json).ok_or("invalid max")?;
    let points = rule
        .get("points")
        .and_then(Amount::from_json)
        .ok_or("invalid points")?
        .whole_part();
    if min > max {
        return Err("min greater than max");
    }
    Ok(SlabRule { min, max, points })
}
