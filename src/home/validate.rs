use std::ops::RangeInclusive;

use thiserror::Error;

use super::models::{FanMode, OperatingMode, ThermostatUpdate};

/// Allowed cool set points, degrees Fahrenheit.
pub const COOL_SET_POINT_RANGE: RangeInclusive<i32> = 30..=100;
/// Allowed heat set points, degrees Fahrenheit.
pub const HEAT_SET_POINT_RANGE: RangeInclusive<i32> = 30..=100;

/// A validated partial update. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThermostatChanges {
    pub name: Option<String>,
    pub mode: Option<OperatingMode>,
    pub cool_set_point: Option<i32>,
    pub heat_set_point: Option<i32>,
    pub fan: Option<FanMode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Non-Writable Field")]
    NonWritableField,

    #[error("Invalid Operating Mode")]
    InvalidOperatingMode(String),

    #[error("Invalid Fan Mode")]
    InvalidFanMode(String),

    #[error("Invalid Cool Set Point")]
    InvalidCoolSetPoint(i32),

    #[error("Invalid Heat Set Point")]
    InvalidHeatSetPoint(i32),
}

impl ValidationError {
    /// Human-readable explanation returned alongside the short message.
    pub fn description(&self) -> String {
        match self {
            Self::NonWritableField => "The field 'currentTemp' is not a writable field. You must set \
                 the cool or heat set point (coolSetPoint/heatSetPoint) instead."
                .to_owned(),
            Self::InvalidOperatingMode(_) => "The operating mode provided is not valid. Valid \
                 choices are: 'cool', 'heat', or 'off'."
                .to_owned(),
            Self::InvalidFanMode(_) => {
                "The fan mode provided is not valid. Valid choices are: 'auto' or 'on'.".to_owned()
            }
            Self::InvalidCoolSetPoint(_) => out_of_range("cool", &COOL_SET_POINT_RANGE),
            Self::InvalidHeatSetPoint(_) => out_of_range("heat", &HEAT_SET_POINT_RANGE),
        }
    }
}

fn out_of_range(kind: &str, range: &RangeInclusive<i32>) -> String {
    format!(
        "The {kind} set point provided is not within the allowed range. It must be between {} \
         and {} degrees Fahrenheit.",
        range.start(),
        range.end()
    )
}

/// Checks `update` field by field and stops at the first violation:
///
/// 1. `currentTemp` must be unset; it is derived from the set points.
/// 2. `mode` must be one of `heat`, `cool`, `off`.
/// 3. `fan` must be one of `auto`, `on`.
/// 4. `coolSetPoint` must lie in [`COOL_SET_POINT_RANGE`].
/// 5. `heatSetPoint` must lie in [`HEAT_SET_POINT_RANGE`].
///
/// Omitted keys, empty strings and zeros are unset: they are not checked and
/// come back as `None`. On success the enum fields come back parsed.
pub fn validate(update: ThermostatUpdate) -> Result<ThermostatChanges, ValidationError> {
    if update.current_temp.is_some_and(|t| t != 0) {
        return Err(ValidationError::NonWritableField);
    }

    let mode = non_empty(update.mode)
        .map(|m| m.parse::<OperatingMode>().map_err(|_| ValidationError::InvalidOperatingMode(m)))
        .transpose()?;

    let fan = non_empty(update.fan)
        .map(|f| f.parse::<FanMode>().map_err(|_| ValidationError::InvalidFanMode(f)))
        .transpose()?;

    let cool_set_point = non_zero(update.cool_set_point);
    if let Some(cool) = cool_set_point {
        if !COOL_SET_POINT_RANGE.contains(&cool) {
            return Err(ValidationError::InvalidCoolSetPoint(cool));
        }
    }

    let heat_set_point = non_zero(update.heat_set_point);
    if let Some(heat) = heat_set_point {
        if !HEAT_SET_POINT_RANGE.contains(&heat) {
            return Err(ValidationError::InvalidHeatSetPoint(heat));
        }
    }

    Ok(ThermostatChanges {
        name: non_empty(update.name),
        mode,
        cool_set_point,
        heat_set_point,
        fan,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn non_zero(value: Option<i32>) -> Option<i32> {
    value.filter(|&n| n != 0)
}
