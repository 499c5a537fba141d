use std::sync::Arc;

/// Cross-fade width joining adjacent slides, in seconds.
pub const CROSSFADE_SECS: f64 = 0.5;
/// Gain applied to the audio overlay so it sits under the slideshow.
pub const AUDIO_ATTENUATION: f32 = 0.4;

/// Output canvas in pixels. Both dimensions are even so the encoder can
/// subsample to yuv420p.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Bytes in one RGBA8 frame of this canvas.
    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// One prepared slide: a canvas-sized premultiplied RGBA8 frame plus its
/// window on the timeline.
#[derive(Clone, Debug)]
pub struct Slide {
    /// Original reference, kept for logs and error context.
    pub source: String,
    /// Seconds this slide stays on screen.
    pub duration_secs: f64,
    /// Absolute start offset in seconds. Adjacent slides overlap by the
    /// timeline's cross-fade width.
    pub start_secs: f64,
    /// Canvas-sized premultiplied RGBA8 pixels, source centered over opaque
    /// black.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl Slide {
    /// Exclusive end of this slide's window in seconds.
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }
}

/// Background audio prepared for muxing: attenuated, resampled, and sized to
/// exactly the timeline duration (excess dropped, shortfall left silent).
#[derive(Clone, Debug)]
pub struct AudioOverlay {
    /// Original reference.
    pub source: String,
    /// Samples per second.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    /// Interleaved samples covering the whole timeline.
    pub interleaved_f32: Vec<f32>,
}

/// A fully decoded render plan for one request.
///
/// Slides are ordered by start time, the first always at zero. The timeline
/// owns all pixel and sample data; it is dropped as soon as the encode
/// finishes or fails.
#[derive(Clone, Debug)]
pub struct Timeline {
    /// Slides in output order with resolved start times.
    pub slides: Vec<Slide>,
    /// Output canvas covering every slide.
    pub canvas: Canvas,
    /// Cross-fade width between adjacent slides; zero when there is only one
    /// slide.
    pub crossfade_secs: f64,
    /// Optional prepared background audio.
    pub audio: Option<AudioOverlay>,
}

impl Timeline {
    /// Total output duration in seconds: the sum of slide durations minus
    /// one cross-fade per adjacent pair, never below zero.
    pub fn total_duration_secs(&self) -> f64 {
        let sum: f64 = self.slides.iter().map(|s| s.duration_secs).sum();
        let overlaps = self.slides.len().saturating_sub(1) as f64;
        (sum - self.crossfade_secs * overlaps).max(0.0)
    }
}
