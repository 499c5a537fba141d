use std::path::{Path, PathBuf};

use crate::assets::decode::{TempFileGuard, scratch_path};
use crate::foundation::error::SlidecastResult;
use crate::render::compose::FrameComposer;
use crate::render::encode::{AudioInputConfig, EncodeConfig, FfmpegEncoder, write_f32le_file};
use crate::timeline::model::Timeline;
use crate::timeline::request::{DEFAULT_CODEC, DEFAULT_FPS};

/// Options for one render, resolved from the request before any fetch.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Output frame rate.
    pub fps: u32,
    /// Video codec handed to ffmpeg.
    pub codec: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            codec: DEFAULT_CODEC.to_string(),
        }
    }
}

/// A finished artifact sitting in the output directory.
#[derive(Clone, Debug)]
pub struct RenderedArtifact {
    /// Bare file name, `video_<id>.mp4`.
    pub file_name: String,
    /// Full path inside the output directory.
    pub path: PathBuf,
    /// Output duration in seconds.
    pub duration_secs: f64,
}

/// Mint a fresh artifact name: `video_` plus eight lowercase hex characters.
pub fn artifact_file_name() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("video_{}.mp4", &id[..8])
}

/// Encode `timeline` into a freshly named MP4 under `output_dir`.
///
/// Names never repeat, so concurrent renders cannot clobber each other's
/// output. On failure any partial file is removed before the error returns;
/// callers never observe a half-encoded artifact.
#[tracing::instrument(skip_all, fields(slides = timeline.slides.len(), fps = opts.fps))]
pub fn render(
    timeline: &Timeline,
    opts: &RenderOptions,
    output_dir: &Path,
) -> SlidecastResult<RenderedArtifact> {
    let file_name = artifact_file_name();
    let path = output_dir.join(&file_name);
    render_to_path(timeline, opts, &path)?;

    let artifact = RenderedArtifact {
        file_name,
        path,
        duration_secs: timeline.total_duration_secs(),
    };
    tracing::info!(
        file = %artifact.file_name,
        duration_secs = artifact.duration_secs,
        "artifact encoded"
    );
    Ok(artifact)
}

/// Encode `timeline` to exactly `out_path`, removing the file on failure.
pub fn render_to_path(
    timeline: &Timeline,
    opts: &RenderOptions,
    out_path: &Path,
) -> SlidecastResult<()> {
    match encode_timeline(timeline, opts, out_path) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = std::fs::remove_file(out_path);
            Err(e)
        }
    }
}

fn encode_timeline(
    timeline: &Timeline,
    opts: &RenderOptions,
    out_path: &Path,
) -> SlidecastResult<()> {
    let mut composer = FrameComposer::new(timeline, opts.fps)?;

    // The overlay is spooled to a scratch file that lives until the encode
    // is over; the guard removes it afterwards either way.
    let (audio, _mix_guard) = match timeline.audio.as_ref() {
        Some(overlay) if !overlay.interleaved_f32.is_empty() => {
            let guard = TempFileGuard::new(scratch_path("mix", "f32le"));
            write_f32le_file(&overlay.interleaved_f32, guard.path())?;
            let cfg = AudioInputConfig {
                path: guard.path().to_path_buf(),
                sample_rate: overlay.sample_rate,
                channels: overlay.channels,
            };
            (Some(cfg), Some(guard))
        }
        _ => (None, None),
    };

    let mut encoder = FfmpegEncoder::spawn(EncodeConfig {
        width: timeline.canvas.width,
        height: timeline.canvas.height,
        fps: opts.fps,
        codec: opts.codec.clone(),
        out_path: out_path.to_path_buf(),
        audio,
    })?;

    for idx in 0..composer.frame_count() {
        let frame = composer.compose_frame(idx)?;
        encoder.encode_frame(frame)?;
    }
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_have_the_published_shape() {
        let name = artifact_file_name();
        assert_eq!(name.len(), "video_".len() + 8 + ".mp4".len());
        assert!(name.starts_with("video_"));
        assert!(name.ends_with(".mp4"));
        let id = &name["video_".len()..name.len() - ".mp4".len()];
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn artifact_names_do_not_repeat() {
        assert_ne!(artifact_file_name(), artifact_file_name());
    }

    #[test]
    fn default_options_match_the_wire_defaults() {
        let opts = RenderOptions::default();
        assert_eq!(opts.fps, 24);
        assert_eq!(opts.codec, "libx264");
    }
}
