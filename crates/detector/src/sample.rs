//! Sample references handed from a frame source to a detector.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, ImageReader, Rgb, RgbImage};

use crate::error::DetectionError;

/// An encoded still image (PNG or JPEG).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

impl Frame {
    /// Wrap encoded image bytes, guessing the content type from the header.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DetectionError> {
        if bytes.is_empty() {
            return Err(DetectionError::Decode("frame is empty".to_string()));
        }
        let content_type = match image::guess_format(&bytes) {
            Ok(ImageFormat::Png) => "image/png",
            Ok(ImageFormat::Jpeg) => "image/jpeg",
            Ok(other) => {
                return Err(DetectionError::Decode(format!(
                    "unsupported frame format {other:?}"
                )))
            }
            Err(e) => return Err(DetectionError::Decode(e.to_string())),
        };
        Ok(Self {
            bytes,
            content_type,
        })
    }

    /// Parse a `data:image/...;base64,` URL or bare base64 text, as sent by
    /// browser clients from `canvas.toDataURL`.
    pub fn from_data_url(data: &str) -> Result<Self, DetectionError> {
        let data = data.trim();
        let encoded = match data.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(',').ok_or_else(|| {
                    DetectionError::Decode("data URL has no payload".to_string())
                })?;
                if !header.ends_with(";base64") {
                    return Err(DetectionError::Decode(
                        "data URL is not base64 encoded".to_string(),
                    ));
                }
                payload
            }
            None => data,
        };
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| DetectionError::Decode(format!("invalid base64 frame: {e}")))?;
        Self::from_bytes(bytes)
    }

    /// Encode as a `data:<content-type>;base64,` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, STANDARD.encode(&self.bytes))
    }

    /// Read the image dimensions from the header without decoding pixels.
    pub fn dimensions(&self) -> Result<(u32, u32), DetectionError> {
        ImageReader::new(Cursor::new(&self.bytes))
            .with_guessed_format()
            .map_err(|e| DetectionError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| DetectionError::Decode(e.to_string()))
    }

    /// A uniform grey PNG, used when no real footage is available.
    pub fn placeholder(width: u32, height: u32, brightness: u8) -> Result<Self, DetectionError> {
        let img = RgbImage::from_pixel(width, height, Rgb([brightness, brightness, brightness]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| DetectionError::Capture(e.to_string()))?;
        Ok(Self {
            bytes: buf.into_inner(),
            content_type: "image/png",
        })
    }
}

/// Opaque reference to the current observation for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleRef {
    /// A captured video frame.
    Frame(Frame),
    /// A bare simulation tick with no image attached.
    Tick { sequence: u64 },
}

impl SampleRef {
    pub fn frame(&self) -> Option<&Frame> {
        match self {
            Self::Frame(frame) => Some(frame),
            Self::Tick { .. } => None,
        }
    }
}
