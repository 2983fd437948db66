use std::time::Duration;

/// Errors from a single detection cycle.
///
/// All of these are recovered by the sampling loop: the cycle is skipped
/// and the next tick tries again.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    /// The request to the detection capability failed (network, DNS, TLS).
    #[error("Detection request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The sample or the capability's response could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The capability answered with a non-2xx status.
    #[error("Detection capability error ({status}): {body}")]
    Capability { status: u16, body: String },

    /// No sample could be acquired for this cycle.
    #[error("Sample capture failed: {0}")]
    Capture(String),

    /// The capability did not answer in time.
    #[error("Detection timed out after {0:?}")]
    Timeout(Duration),
}
