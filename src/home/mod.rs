pub mod models;
pub mod store;
pub mod validate;

pub use models::{FanMode, OperatingMode, Thermostat, ThermostatField, ThermostatUpdate};
pub use store::{StoreError, ThermostatStore};
pub use validate::{validate, ThermostatChanges, ValidationError};
