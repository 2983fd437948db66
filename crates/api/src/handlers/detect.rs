//! Request-driven detection endpoint, `POST /api/detect`.
//!
//! Accepts either a multipart form (`roomId` text part, optional `frame`
//! image part) or a JSON body `{ "roomId", "frameData" }` where `frameData`
//! is a base64 data URL as produced by `canvas.toDataURL`. An undecodable
//! frame is a 400. Without an uploaded frame
//! the room's most recently sampled frame is used, falling back to a
//! placeholder. The response keeps the dashboard detection shape and its
//! status is derived from the room's capacity. Nothing is written to the
//! registry.

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use roomwatch_core::detection::DetectionResponse;
use roomwatch_core::types::RoomId;
use roomwatch_detector::{DetectionError, Frame, SampleRef};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Size of the placeholder used when a room has no frame yet.
const PLACEHOLDER_SIZE: (u32, u32) = (640, 480);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectRequest {
    room_id: Option<RoomId>,
    frame_data: Option<String>,
}

struct DetectInput {
    room_id: Option<RoomId>,
    frame: Option<Frame>,
}

/// POST /api/detect
pub async fn detect(
    State(state): State<AppState>,
    request: Request,
) -> AppResult<Json<DetectionResponse>> {
    let input = read_input(&state, request).await?;

    let room = input
        .room_id
        .as_deref()
        .and_then(|id| state.registry().get(id).ok())
        .ok_or_else(|| AppError::BadRequest("Invalid room ID".to_string()))?;

    let frame = match input.frame {
        Some(frame) => frame,
        None => match state.sampling.frames().latest(&room.id) {
            Some(frame) => frame,
            None => {
                let (width, height) = PLACEHOLDER_SIZE;
                Frame::placeholder(width, height, 0)
                    .map_err(|e| AppError::InternalError(e.to_string()))?
            }
        },
    };

    let timeout = state.config.sampling.detect_timeout;
    let sample = tokio::time::timeout(
        timeout,
        state.detector.detect(&room.id, &SampleRef::Frame(frame)),
    )
    .await
    .map_err(|_| DetectionError::Timeout(timeout))??;

    let status = state
        .registry()
        .policy()
        .derive_status(sample.occupancy_count, room.capacity);

    tracing::debug!(
        room_id = %room.id,
        people = sample.occupancy_count,
        status = %status,
        "Detection request served"
    );

    Ok(Json(DetectionResponse::from_sample(&sample, status)))
}

async fn read_input(state: &AppState, request: Request) -> AppResult<DetectInput> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    if !is_multipart {
        let Json(body) = Json::<DetectRequest>::from_request(request, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let frame = body
            .frame_data
            .filter(|data| !data.trim().is_empty())
            .map(|data| Frame::from_data_url(&data))
            .transpose()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        return Ok(DetectInput {
            room_id: body.room_id,
            frame,
        });
    }

    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mut input = DetectInput {
        room_id: None,
        frame: None,
    };
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "roomId" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                input.room_id = Some(text.trim().to_string());
            }
            "frame" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if !bytes.is_empty() {
                    let frame = Frame::from_bytes(bytes.to_vec())
                        .map_err(|e| AppError::BadRequest(e.to_string()))?;
                    input.frame = Some(frame);
                }
            }
            _ => {}
        }
    }
    Ok(input)
}
