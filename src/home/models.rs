use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    Heat,
    Cool,
    Off,
}

impl FromStr for OperatingMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heat" => Ok(Self::Heat),
            "cool" => Ok(Self::Cool),
            "off" => Ok(Self::Off),
            other => Err(UnknownVariant(other.to_owned())),
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperatingMode::Heat => "heat",
            OperatingMode::Cool => "cool",
            OperatingMode::Off => "off",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FanMode {
    Auto,
    On,
}

impl FromStr for FanMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "on" => Ok(Self::On),
            other => Err(UnknownVariant(other.to_owned())),
        }
    }
}

impl fmt::Display for FanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FanMode::Auto => "auto",
            FanMode::On => "on",
        })
    }
}

/// Returned when a string names no variant of a thermostat enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant: {0:?}")]
pub struct UnknownVariant(pub String);

/// A single thermostat as stored in the home and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Thermostat {
    pub id: u32,
    pub name: String,
    /// Degrees Fahrenheit. Becomes the midpoint of the two set points
    /// whenever either is changed through the API.
    pub current_temp: i32,
    /// The current temperature before the last change to it, 0 until the
    /// first change.
    pub previous_temp: i32,
    pub mode: OperatingMode,
    pub cool_set_point: i32,
    pub heat_set_point: i32,
    pub fan: FanMode,
    pub last_changed: DateTime<Utc>,
}

/// Requested thermostat settings, as sent by clients on create and update.
///
/// Omitted keys, empty strings and zeros all mean "leave unchanged" on
/// update and "use the default" on create. Enum-valued fields are plain
/// strings here so that an unknown value is reported as a validation error
/// rather than a JSON error.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatUpdate {
    pub name: Option<String>,
    /// Read-only. Present only so that attempts to write it can be rejected.
    pub current_temp: Option<i32>,
    /// One of `heat`, `cool`, `off`.
    pub mode: Option<String>,
    /// Degrees Fahrenheit, 30 to 100.
    pub cool_set_point: Option<i32>,
    /// Degrees Fahrenheit, 30 to 100.
    pub heat_set_point: Option<i32>,
    /// One of `auto`, `on`.
    pub fan: Option<String>,
}

/// Readable properties exposed at `/v1/thermostats/{id}/{field}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermostatField {
    Name,
    CurrentTemp,
    Mode,
    CoolSetPoint,
    HeatSetPoint,
    Fan,
}

impl FromStr for ThermostatField {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "currentTemp" => Ok(Self::CurrentTemp),
            "mode" => Ok(Self::Mode),
            "coolSetPoint" => Ok(Self::CoolSetPoint),
            "heatSetPoint" => Ok(Self::HeatSetPoint),
            "fan" => Ok(Self::Fan),
            other => Err(UnknownVariant(other.to_owned())),
        }
    }
}

impl Thermostat {
    /// Reads `field` as a bare JSON value. Empty strings and zero numbers
    /// count as unset and yield `None`.
    pub fn field(&self, field: ThermostatField) -> Option<Value> {
        match field {
            ThermostatField::Name => non_empty(&self.name).map(Value::from),
            ThermostatField::CurrentTemp => non_zero(self.current_temp).map(Value::from),
            ThermostatField::Mode => Some(Value::from(self.mode.to_string())),
            ThermostatField::CoolSetPoint => non_zero(self.cool_set_point).map(Value::from),
            ThermostatField::HeatSetPoint => non_zero(self.heat_set_point).map(Value::from),
            ThermostatField::Fan => Some(Value::from(self.fan.to_string())),
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

fn non_zero(n: i32) -> Option<i32> {
    (n != 0).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thermostat() -> Thermostat {
        Thermostat {
            id: 7,
            name: "Attic".to_owned(),
            current_temp: 70,
            previous_temp: 0,
            mode: OperatingMode::Heat,
            cool_set_point: 72,
            heat_set_point: 68,
            fan: FanMode::Auto,
            last_changed: Utc::now(),
        }
    }

    #[test]
    fn serializes_with_camel_case_keys_and_lowercase_enums() {
        let json = serde_json::to_value(thermostat()).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["currentTemp"], 70);
        assert_eq!(json["previousTemp"], 0);
        assert_eq!(json["mode"], "heat");
        assert_eq!(json["coolSetPoint"], 72);
        assert_eq!(json["heatSetPoint"], 68);
        assert_eq!(json["fan"], "auto");
        assert!(json["lastChanged"].is_string());
    }

    #[test]
    fn enums_parse_only_known_values() {
        assert_eq!("cool".parse::<OperatingMode>().unwrap(), OperatingMode::Cool);
        assert_eq!("on".parse::<FanMode>().unwrap(), FanMode::On);
        assert!("on".parse::<OperatingMode>().is_err());
        assert!("off".parse::<FanMode>().is_err());
        assert!("Heat".parse::<OperatingMode>().is_err());
    }

    #[test]
    fn field_names_match_json_keys() {
        assert_eq!("currentTemp".parse::<ThermostatField>().unwrap(), ThermostatField::CurrentTemp);
        assert_eq!("fan".parse::<ThermostatField>().unwrap(), ThermostatField::Fan);
        assert!("previousTemp".parse::<ThermostatField>().is_err());
        assert!("id".parse::<ThermostatField>().is_err());
    }

    #[test]
    fn field_reads_bare_values() {
        let t = thermostat();
        assert_eq!(t.field(ThermostatField::Name), Some(Value::from("Attic")));
        assert_eq!(t.field(ThermostatField::CurrentTemp), Some(Value::from(70)));
        assert_eq!(t.field(ThermostatField::Mode), Some(Value::from("heat")));
        assert_eq!(t.field(ThermostatField::Fan), Some(Value::from("auto")));
    }

    #[test]
    fn field_treats_empty_and_zero_as_unset() {
        let mut t = thermostat();
        t.name.clear();
        t.current_temp = 0;
        assert_eq!(t.field(ThermostatField::Name), None);
        assert_eq!(t.field(ThermostatField::CurrentTemp), None);
    }
}
