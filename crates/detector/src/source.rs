//! Sample acquisition.
//!
//! A [`FrameSource`] produces the [`SampleRef`] for one cycle of one room.
//! Live rooms read frames (from disk or generated placeholders); ambient
//! rooms only need a tick.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::DetectionError;
use crate::sample::{Frame, SampleRef};

/// Width and height of generated placeholder frames.
const PLACEHOLDER_SIZE: (u32, u32) = (64, 48);

/// Brightness levels cycled by placeholder frames so consecutive samples differ.
const PLACEHOLDER_BRIGHTNESS: [u8; 6] = [40, 80, 120, 160, 200, 240];

/// Produces the sample for the next cycle of a room.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn acquire(&self, room_id: &str) -> Result<SampleRef, DetectionError>;
}

/// Advance and return a per-room cursor.
fn next_index(cursors: &Mutex<HashMap<String, u64>>, room_id: &str) -> u64 {
    let mut cursors = cursors
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let cursor = cursors.entry(room_id.to_string()).or_insert(0);
    let current = *cursor;
    *cursor = cursor.wrapping_add(1);
    current
}

// ---------------------------------------------------------------------------
// TickSource
// ---------------------------------------------------------------------------

/// Emits numbered ticks; used by ambient rooms.
#[derive(Default)]
pub struct TickSource {
    cursors: Mutex<HashMap<String, u64>>,
}

impl TickSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FrameSource for TickSource {
    async fn acquire(&self, room_id: &str) -> Result<SampleRef, DetectionError> {
        Ok(SampleRef::Tick {
            sequence: next_index(&self.cursors, room_id),
        })
    }
}

// ---------------------------------------------------------------------------
// PlaceholderFrameSource
// ---------------------------------------------------------------------------

/// Generates small grey PNG frames of cycling brightness.
#[derive(Default)]
pub struct PlaceholderFrameSource {
    cursors: Mutex<HashMap<String, u64>>,
}

impl PlaceholderFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn frame_for(&self, room_id: &str) -> Result<Frame, DetectionError> {
        let idx = next_index(&self.cursors, room_id) as usize % PLACEHOLDER_BRIGHTNESS.len();
        let (w, h) = PLACEHOLDER_SIZE;
        Frame::placeholder(w, h, PLACEHOLDER_BRIGHTNESS[idx])
    }
}

#[async_trait]
impl FrameSource for PlaceholderFrameSource {
    async fn acquire(&self, room_id: &str) -> Result<SampleRef, DetectionError> {
        self.frame_for(room_id).map(SampleRef::Frame)
    }
}

// ---------------------------------------------------------------------------
// DirectoryFrameSource
// ---------------------------------------------------------------------------

/// Cycles through the image files in `<root>/<room_id>/`, like a looping
/// video. Rooms without footage fall back to placeholder frames.
pub struct DirectoryFrameSource {
    root: PathBuf,
    cursors: Mutex<HashMap<String, u64>>,
    fallback: PlaceholderFrameSource,
}

impl DirectoryFrameSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cursors: Mutex::new(HashMap::new()),
            fallback: PlaceholderFrameSource::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sorted image files for a room. A missing directory yields no files.
    async fn room_files(&self, room_id: &str) -> Result<Vec<PathBuf>, DetectionError> {
        let dir = self.root.join(room_id);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DetectionError::Capture(format!("{}: {e}", dir.display()))),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DetectionError::Capture(e.to_string()))?
        {
            let path = entry.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
                .unwrap_or(false);
            if is_image {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl FrameSource for DirectoryFrameSource {
    async fn acquire(&self, room_id: &str) -> Result<SampleRef, DetectionError> {
        let files = self.room_files(room_id).await?;
        if files.is_empty() {
            return self.fallback.acquire(room_id).await;
        }

        let idx = next_index(&self.cursors, room_id) as usize % files.len();
        let path = &files[idx];
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DetectionError::Capture(format!("{}: {e}", path.display())))?;
        Frame::from_bytes(bytes).map(SampleRef::Frame)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
