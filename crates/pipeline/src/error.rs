use roomwatch_core::types::RoomId;

/// Errors from sampling control operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SamplingError {
    /// The room is not in the registry, so it has no loop to control.
    #[error("Unknown room: {0}")]
    UnknownRoom(RoomId),

    /// The manager has been shut down and accepts no new loops.
    #[error("Sampling manager is shut down")]
    ShuttingDown,

    /// The loop task panicked or had to be aborted while stopping.
    #[error("Sampling task for room {room_id} failed: {reason}")]
    TaskFailed { room_id: RoomId, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_failed_display() {
        let err = SamplingError::TaskFailed {
            room_id: "room-1".to_string(),
            reason: "aborted after timeout".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Sampling task for room room-1 failed: aborted after timeout"
        );
    }
}
