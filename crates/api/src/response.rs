//! Shared response envelope types for API handlers.
//!
//! Versioned API responses use a `{ "data": ... }` envelope. The
//! compatibility endpoints under `/api` return bare payloads instead, since
//! existing consumers expect that shape.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
