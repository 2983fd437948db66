//! The single write path for room state.
//!
//! Both sampled updates and manual overrides go through
//! [`RoomUpdater::record`]: derive the status from the registry's policy,
//! apply atomically, and publish an event only when the update was
//! committed. Stale and duplicate updates produce no event.

use std::sync::Arc;

use chrono::Utc;
use roomwatch_core::event::{RoomUpdateEvent, UpdateSource};
use roomwatch_core::types::Timestamp;
use roomwatch_events::EventBus;
use roomwatch_registry::{ApplyOutcome, OccupancyUpdate, RegistryError, RoomRegistry};

#[derive(Clone)]
pub struct RoomUpdater {
    registry: Arc<RoomRegistry>,
    bus: Arc<EventBus>,
}

impl RoomUpdater {
    pub fn new(registry: Arc<RoomRegistry>, bus: Arc<EventBus>) -> Self {
        Self { registry, bus }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Apply `occupancy` observed at `timestamp` to a room.
    ///
    /// A timestamp ahead of the local clock is clamped to now, so one
    /// future-dated update cannot make every later update stale.
    pub fn record(
        &self,
        room_id: &str,
        occupancy: u32,
        timestamp: Timestamp,
        source: UpdateSource,
    ) -> Result<ApplyOutcome, RegistryError> {
        let now = Utc::now();
        let timestamp = if timestamp > now {
            tracing::debug!(room_id, %timestamp, "Future timestamp clamped to now");
            now
        } else {
            timestamp
        };
        let capacity = self
            .registry
            .get(room_id)
            .map_err(|_| RegistryError::UnknownRoom(room_id.to_string()))?
            .capacity;
        let status = self.registry.policy().derive_status(occupancy, capacity);

        let outcome = self.registry.apply(
            room_id,
            OccupancyUpdate {
                occupancy,
                status,
                timestamp,
            },
        )?;

        if let ApplyOutcome::Applied(room) = &outcome {
            if let Some(event) = RoomUpdateEvent::from_room(room, source) {
                self.bus.publish(event);
            }
        }
        Ok(outcome)
    }

    /// Manual occupancy correction, stamped with the current time.
    ///
    /// Unknown rooms are reported as [`RegistryError::NotFound`] and leave
    /// every room unchanged.
    pub fn set_occupancy(
        &self,
        room_id: &str,
        occupancy: u32,
    ) -> Result<ApplyOutcome, RegistryError> {
        if !self.registry.contains(room_id) {
            return Err(RegistryError::NotFound(room_id.to_string()));
        }
        let outcome = self.record(room_id, occupancy, Utc::now(), UpdateSource::Override)?;
        tracing::info!(
            room_id,
            occupancy,
            status = %outcome.room().status,
            applied = outcome.is_applied(),
            "Occupancy override"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Duration;
    use roomwatch_core::room::{RoomConfig, SamplingMode};
    use roomwatch_core::status::{RoomStatus, StatusPolicy};

    use super::*;

    fn updater_with_capacity(capacity: u32) -> RoomUpdater {
        let config = RoomConfig {
            id: "r".to_string(),
            name: "Room".to_string(),
            capacity,
            occupancy: 0,
            equipment: Vec::new(),
            video_feed: None,
            sampling_mode: SamplingMode::Live,
        };
        let registry = RoomRegistry::new(&[config], StatusPolicy::default()).unwrap();
        RoomUpdater::new(Arc::new(registry), Arc::new(EventBus::default()))
    }

    #[test]
    fn capacity_eight_sequence_derives_expected_statuses() {
        let updater = updater_with_capacity(8);
        let start = Utc::now();
        let statuses: Vec<_> = [0, 3, 6, 8]
            .into_iter()
            .enumerate()
            .map(|(i, occ)| {
                updater
                    .record("r", occ, start + Duration::seconds(i as i64), UpdateSource::Sampled)
                    .unwrap()
                    .room()
                    .status
            })
            .collect();
        assert_eq!(
            statuses,
            vec![
                RoomStatus::Available,
                RoomStatus::Occupied,
                RoomStatus::Occupied,
                RoomStatus::Full
            ]
        );
    }

    #[tokio::test]
    async fn only_applied_updates_are_published() {
        let updater = updater_with_capacity(10);
        let mut rx = updater.bus().subscribe();
        let t1 = Utc::now();
        let t0 = t1 - Duration::seconds(5);

        assert!(updater.record("r", 4, t1, UpdateSource::Sampled).unwrap().is_applied());
        assert_matches!(
            updater.record("r", 4, t1, UpdateSource::Sampled),
            Ok(ApplyOutcome::Duplicate(_))
        );
        assert_matches!(
            updater.record("r", 9, t0, UpdateSource::Sampled),
            Ok(ApplyOutcome::Stale { .. })
        );

        let event = rx.recv().await.unwrap();
        assert_eq!(event.occupancy, 4);
        assert_eq!(event.timestamp, t1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unknown_room_errors_differ_by_path() {
        let updater = updater_with_capacity(4);
        assert_eq!(
            updater.record("ghost", 1, Utc::now(), UpdateSource::Sampled),
            Err(RegistryError::UnknownRoom("ghost".to_string()))
        );
        assert_eq!(
            updater.set_occupancy("ghost", 1),
            Err(RegistryError::NotFound("ghost".to_string()))
        );
    }

    #[test]
    fn future_dated_update_does_not_freeze_room() {
        let updater = updater_with_capacity(10);
        let ahead = Utc::now() + Duration::hours(1);
        assert!(updater.record("r", 9, ahead, UpdateSource::Sampled).unwrap().is_applied());
        assert!(updater.registry().get("r").unwrap().last_update.unwrap() < ahead);

        let outcome = updater.set_occupancy("r", 0).unwrap();
        assert!(outcome.is_applied());
        assert_eq!(outcome.room().occupancy, 0);
    }

    #[test]
    fn override_reruns_status_policy() {
        let updater = updater_with_capacity(10);
        let outcome = updater.set_occupancy("r", 8).unwrap();
        assert_eq!(outcome.room().status, RoomStatus::Full);
        assert_eq!(outcome.room().occupancy, 8);
        assert!(outcome.room().last_update.is_some());
    }
}
