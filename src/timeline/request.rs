use serde::Deserialize;

use crate::foundation::error::{SlidecastError, SlidecastResult};

/// Seconds a slide stays on screen when the request gives no duration.
pub const DEFAULT_SLIDE_SECS: f64 = 3.0;
/// Output frame rate used when the request gives none.
pub const DEFAULT_FPS: u32 = 24;
/// Video codec handed to ffmpeg when the request gives none.
pub const DEFAULT_CODEC: &str = "libx264";

/// Body of `POST /render` as it arrives on the wire.
///
/// `images` entries come in two shapes, a bare reference string or an object
/// with `url` and an optional `duration`; they stay as raw JSON values here
/// and are canonicalized by [`RenderRequest::resolve_segments`] so parse
/// errors can name the offending entry.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RenderRequest {
    /// Ordered image references; output order is array order.
    #[serde(default)]
    pub images: Vec<serde_json::Value>,
    /// Optional background audio reference.
    #[serde(default)]
    pub audio: Option<String>,
    /// Output frame rate, defaulting to [`DEFAULT_FPS`].
    #[serde(default)]
    pub fps: Option<u32>,
    /// Output codec, defaulting to [`DEFAULT_CODEC`].
    #[serde(default)]
    pub codec: Option<String>,
}

/// One `images` entry after shape-checking, before defaults are applied.
#[derive(Clone, Debug, PartialEq)]
pub enum SegmentSpec {
    /// Bare string reference; shown for the default duration.
    SimpleReference(String),
    /// Object form carrying an explicit duration in seconds.
    TimedReference {
        /// Image reference.
        url: String,
        /// Seconds on screen.
        duration_secs: f64,
    },
}

/// Canonical image segment: a reference plus a concrete duration.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageSegment {
    /// URL or local path of the still image.
    pub source: String,
    /// Seconds the slide stays on screen.
    pub duration_secs: f64,
}

impl SegmentSpec {
    /// Parse one `images` entry. `index` is the entry's position in the
    /// array and appears in every error message.
    pub fn from_value(index: usize, value: &serde_json::Value) -> SlidecastResult<Self> {
        match value {
            serde_json::Value::String(s) => {
                let url = require_reference(index, s)?;
                Ok(Self::SimpleReference(url))
            }
            serde_json::Value::Object(map) => {
                let url = map.get("url").and_then(|v| v.as_str()).ok_or_else(|| {
                    SlidecastError::validation(format!(
                        "images[{index}] object must carry a string 'url'"
                    ))
                })?;
                let url = require_reference(index, url)?;

                match map.get("duration") {
                    None | Some(serde_json::Value::Null) => Ok(Self::SimpleReference(url)),
                    Some(v) => {
                        let duration_secs = v.as_f64().ok_or_else(|| {
                            SlidecastError::validation(format!(
                                "images[{index}].duration must be a number of seconds"
                            ))
                        })?;
                        if !duration_secs.is_finite() || duration_secs <= 0.0 {
                            return Err(SlidecastError::validation(format!(
                                "images[{index}].duration must be a positive number of seconds"
                            )));
                        }
                        Ok(Self::TimedReference { url, duration_secs })
                    }
                }
            }
            _ => Err(SlidecastError::validation(format!(
                "images[{index}] must be a reference string or an object with 'url'"
            ))),
        }
    }

    /// Collapse into the canonical segment, applying the default duration.
    pub fn into_segment(self) -> ImageSegment {
        match self {
            Self::SimpleReference(url) => ImageSegment {
                source: url,
                duration_secs: DEFAULT_SLIDE_SECS,
            },
            Self::TimedReference { url, duration_secs } => ImageSegment {
                source: url,
                duration_secs,
            },
        }
    }
}

impl RenderRequest {
    /// Canonicalize `images` into segments, rejecting the whole request on
    /// the first malformed entry. Runs before any fetch.
    pub fn resolve_segments(&self) -> SlidecastResult<Vec<ImageSegment>> {
        if self.images.is_empty() {
            return Err(SlidecastError::validation(
                "request must carry a non-empty 'images' array",
            ));
        }
        self.images
            .iter()
            .enumerate()
            .map(|(index, value)| {
                SegmentSpec::from_value(index, value).map(SegmentSpec::into_segment)
            })
            .collect()
    }

    /// Frame rate to render at, applying the default.
    pub fn resolve_fps(&self) -> SlidecastResult<u32> {
        match self.fps {
            None => Ok(DEFAULT_FPS),
            Some(0) => Err(SlidecastError::validation("fps must be a positive integer")),
            Some(fps) => Ok(fps),
        }
    }

    /// Codec to encode with, applying the default.
    pub fn resolve_codec(&self) -> SlidecastResult<String> {
        match self.codec.as_deref() {
            None => Ok(DEFAULT_CODEC.to_string()),
            Some(c) if c.trim().is_empty() => {
                Err(SlidecastError::validation("codec must be non-empty"))
            }
            Some(c) => Ok(c.trim().to_string()),
        }
    }
}

fn require_reference(index: usize, url: &str) -> SlidecastResult<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(SlidecastError::validation(format!(
            "images[{index}] reference must be non-empty"
        )));
    }
    Ok(url.to_string())
}
