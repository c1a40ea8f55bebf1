use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{
    models::{FanMode, OperatingMode, Thermostat},
    validate::ThermostatChanges,
};

/// Set point used on creation when the request leaves one out.
pub const DEFAULT_SET_POINT: i32 = 71;
pub const DEFAULT_MODE: OperatingMode = OperatingMode::Off;
pub const DEFAULT_FAN: FanMode = FanMode::Auto;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("No thermostat found for id: {0}")]
    NotFound(u32),
}

/// Every thermostat in the home, keyed by id.
///
/// Cheap to clone; clones share the same map. A single `tokio::sync::Mutex`
/// guards the whole map and is held only for the duration of one map
/// operation, never across request parsing or serialisation.
#[derive(Clone, Default)]
pub struct ThermostatStore {
    inner: Arc<Mutex<BTreeMap<u32, Thermostat>>>,
}

impl ThermostatStore {
    /// An empty home. The first created thermostat gets id 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// The home as it looks at process start: a downstairs and an upstairs unit.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let seed = [
            Thermostat {
                id: 1,
                name: "Downstairs Thermostat".to_owned(),
                current_temp: 71,
                previous_temp: 0,
                mode: OperatingMode::Heat,
                cool_set_point: 68,
                heat_set_point: 72,
                fan: FanMode::Auto,
                last_changed: now,
            },
            Thermostat {
                id: 2,
                name: "Upstairs Thermostat".to_owned(),
                current_temp: 72,
                previous_temp: 0,
                mode: OperatingMode::Cool,
                cool_set_point: 69,
                heat_set_point: 73,
                fan: FanMode::On,
                last_changed: now,
            },
        ];

        Self {
            inner: Arc::new(Mutex::new(seed.into_iter().map(|t| (t.id, t)).collect())),
        }
    }

    /// Return a snapshot of every thermostat, in ascending id order.
    pub async fn list(&self) -> Vec<Thermostat> {
        self.inner.lock().await.values().cloned().collect()
    }

    pub async fn get(&self, id: u32) -> Result<Thermostat, StoreError> {
        self.inner
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    /// Merge `changes` onto the thermostat with `id` and return the result.
    ///
    /// The current record is re-read under the lock, so concurrent updates to
    /// the same id apply one after the other; the last one wins field by field.
    /// A fresh record replaces the old one rather than being edited in place.
    pub async fn update(
        &self,
        id: u32,
        changes: &ThermostatChanges,
    ) -> Result<Thermostat, StoreError> {
        let mut map = self.inner.lock().await;
        let target = map.get(&id).ok_or(StoreError::NotFound(id))?;
        let updated = merge(target, changes, Utc::now());

        debug!(
            id,
            current_temp = updated.current_temp,
            previous_temp = updated.previous_temp,
            "Thermostat updated"
        );
        map.insert(id, updated.clone());
        Ok(updated)
    }

    /// Insert a new thermostat built from `changes`, filling defaults for
    /// anything left out, and return its id (one past the highest id in use).
    pub async fn create(&self, changes: &ThermostatChanges) -> u32 {
        let mut map = self.inner.lock().await;
        let id = map.last_key_value().map_or(1, |(max, _)| max + 1);
        let created = build(id, changes, Utc::now());

        info!(id, name = %created.name, "Thermostat created");
        map.insert(id, created);
        id
    }
}

/// Build the successor of `target`: requested fields replace the old ones.
/// Only a set point change moves the current temperature, and `previous_temp`
/// keeps the old current temperature only when it actually changed.
fn merge(target: &Thermostat, changes: &ThermostatChanges, now: DateTime<Utc>) -> Thermostat {
    let cool_set_point = changes.cool_set_point.unwrap_or(target.cool_set_point);
    let heat_set_point = changes.heat_set_point.unwrap_or(target.heat_set_point);

    let set_points_changed = changes.cool_set_point.is_some() || changes.heat_set_point.is_some();
    let temp = midpoint(cool_set_point, heat_set_point);
    let (current_temp, previous_temp) = if set_points_changed && temp != target.current_temp {
        (temp, target.current_temp)
    } else {
        (target.current_temp, target.previous_temp)
    };

    Thermostat {
        id: target.id,
        name: changes.name.clone().unwrap_or_else(|| target.name.clone()),
        current_temp,
        previous_temp,
        mode: changes.mode.unwrap_or(target.mode),
        cool_set_point,
        heat_set_point,
        fan: changes.fan.unwrap_or(target.fan),
        last_changed: advance(target.last_changed, now),
    }
}

fn build(id: u32, changes: &ThermostatChanges, now: DateTime<Utc>) -> Thermostat {
    let cool_set_point = changes.cool_set_point.unwrap_or(DEFAULT_SET_POINT);
    let heat_set_point = changes.heat_set_point.unwrap_or(DEFAULT_SET_POINT);

    Thermostat {
        id,
        name: changes
            .name
            .clone()
            .unwrap_or_else(|| format!("Thermostat #{id}")),
        current_temp: midpoint(cool_set_point, heat_set_point),
        previous_temp: 0,
        mode: changes.mode.unwrap_or(DEFAULT_MODE),
        cool_set_point,
        heat_set_point,
        fan: changes.fan.unwrap_or(DEFAULT_FAN),
        last_changed: now,
    }
}

fn midpoint(cool_set_point: i32, heat_set_point: i32) -> i32 {
    (cool_set_point + heat_set_point) / 2
}

/// The wall clock may repeat or step back; `last_changed` must still move forward.
fn advance(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changes() -> ThermostatChanges {
        ThermostatChanges::default()
    }

    #[tokio::test]
    async fn seeded_store_has_two_thermostats() {
        let store = ThermostatStore::seeded();
        let all = store.list().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Downstairs Thermostat");
        assert_eq!(all[1].name, "Upstairs Thermostat");
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found() {
        let store = ThermostatStore::seeded();
        assert_eq!(store.get(999).await.unwrap_err(), StoreError::NotFound(999));
        assert_eq!(
            StoreError::NotFound(999).to_string(),
            "No thermostat found for id: 999"
        );
    }

    #[tokio::test]
    async fn empty_update_only_advances_last_changed() {
        let store = ThermostatStore::seeded();
        let before = store.get(1).await.unwrap();

        let after = store.update(1, &changes()).await.unwrap();

        assert!(after.last_changed > before.last_changed);
        assert_eq!(
            Thermostat { last_changed: before.last_changed, ..after.clone() },
            before
        );
        assert_eq!(store.get(1).await.unwrap(), after);
    }

    #[tokio::test]
    async fn mode_only_update_leaves_other_fields() {
        let store = ThermostatStore::seeded();
        let before = store.get(1).await.unwrap();

        let after = store
            .update(1, &ThermostatChanges { mode: Some(OperatingMode::Cool), ..changes() })
            .await
            .unwrap();

        assert_eq!(after.mode, OperatingMode::Cool);
        assert_eq!(after.name, before.name);
        assert_eq!(after.cool_set_point, before.cool_set_point);
        assert_eq!(after.heat_set_point, before.heat_set_point);
        assert_eq!(after.fan, before.fan);
    }

    #[tokio::test]
    async fn update_without_set_points_keeps_temperatures() {
        let store = ThermostatStore::seeded();
        // seed 1 sits at 71 although its set points average to 70
        let after = store
            .update(1, &ThermostatChanges { fan: Some(FanMode::On), ..changes() })
            .await
            .unwrap();

        assert_eq!(after.current_temp, 71);
        assert_eq!(after.previous_temp, 0);
    }

    #[tokio::test]
    async fn set_point_change_shifts_previous_temp() {
        let store = ThermostatStore::seeded();
        // seed: current 71, cool 68, heat 72
        let after = store
            .update(
                1,
                &ThermostatChanges { cool_set_point: Some(74), heat_set_point: Some(71), ..changes() },
            )
            .await
            .unwrap();

        assert_eq!(after.current_temp, 72);
        assert_eq!(after.previous_temp, 71);
    }

    #[tokio::test]
    async fn unchanged_temperature_keeps_previous_temp() {
        let store = ThermostatStore::seeded();
        let first = store
            .update(1, &ThermostatChanges { cool_set_point: Some(80), ..changes() })
            .await
            .unwrap();
        assert_eq!(first.current_temp, 76);
        assert_eq!(first.previous_temp, 71);

        // (81 + 71) / 2 == 76, no temperature change
        let second = store
            .update(
                1,
                &ThermostatChanges { cool_set_point: Some(81), heat_set_point: Some(71), ..changes() },
            )
            .await
            .unwrap();
        assert_eq!(second.current_temp, 76);
        assert_eq!(second.previous_temp, 71);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = ThermostatStore::seeded();
        let err = store.update(42, &changes()).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound(42));
        assert_eq!(store.list().await.len(), 2);
    }

    #[tokio::test]
    async fn create_allocates_next_id_and_fills_defaults() {
        let store = ThermostatStore::seeded();
        let id = store.create(&changes()).await;
        assert_eq!(id, 3);

        let t = store.get(3).await.unwrap();
        assert_eq!(t.name, "Thermostat #3");
        assert_eq!(t.mode, OperatingMode::Off);
        assert_eq!(t.cool_set_point, 71);
        assert_eq!(t.heat_set_point, 71);
        assert_eq!(t.fan, FanMode::Auto);
        assert_eq!(t.current_temp, 71);
        assert_eq!(t.previous_temp, 0);
    }

    #[tokio::test]
    async fn create_uses_given_fields() {
        let store = ThermostatStore::seeded();
        let id = store
            .create(&ThermostatChanges {
                name: Some("X".to_owned()),
                mode: Some(OperatingMode::Heat),
                cool_set_point: Some(72),
                heat_set_point: Some(68),
                fan: Some(FanMode::On),
            })
            .await;

        let t = store.get(id).await.unwrap();
        assert_eq!(t.id, 3);
        assert_eq!(t.name, "X");
        assert_eq!(t.mode, OperatingMode::Heat);
        assert_eq!(t.current_temp, 70);
        assert_eq!(t.fan, FanMode::On);
    }

    #[tokio::test]
    async fn ids_are_unique_and_increasing() {
        let store = ThermostatStore::seeded();
        let mut last = 2;
        for _ in 0..5 {
            let id = store.create(&changes()).await;
            assert_eq!(id, last + 1);
            last = id;
        }
        assert_eq!(store.list().await.len(), 7);
    }

    #[tokio::test]
    async fn empty_store_starts_at_one() {
        let store = ThermostatStore::new();
        assert!(store.list().await.is_empty());
        assert_eq!(store.create(&changes()).await, 1);
        assert_eq!(store.create(&changes()).await, 2);
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let store = ThermostatStore::new();
        let clone = store.clone();

        let id = store.create(&changes()).await;

        assert_eq!(clone.get(id).await.unwrap().name, "Thermostat #1");
    }

    #[tokio::test]
    async fn concurrent_creates_never_reuse_an_id() {
        let store = ThermostatStore::seeded();
        let handles: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.create(&ThermostatChanges::default()).await })
            })
            .collect();

        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }
        ids.sort_unstable();
        assert_eq!(ids, (3..23).collect::<Vec<_>>());
    }

    #[test]
    fn advance_is_strictly_monotonic() {
        let t = Utc::now();
        assert!(advance(t, t) > t);
        assert!(advance(t, t - Duration::seconds(5)) > t);
        let later = t + Duration::seconds(1);
        assert_eq!(advance(t, later), later);
    }
}
