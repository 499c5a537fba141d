use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{SlidecastError, SlidecastResult};

/// Sample rate every audio overlay is resampled to before muxing.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// A decoded still image, premultiplied and ready for compositing.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 pixels, row-major.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Decoded audio as interleaved `f32` PCM.
#[derive(Clone, Debug)]
pub struct AudioPcm {
    /// Samples per second.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    /// Interleaved samples, `channels` values per frame.
    pub interleaved_f32: Vec<f32>,
}

/// Decode `bytes` as a still image and premultiply it.
///
/// `source` is only used in error messages so callers see which reference was
/// broken.
pub fn decode_image(source: &str, bytes: &[u8]) -> SlidecastResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| SlidecastError::decode(format!("image '{source}' is not decodable: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Decode `bytes` as audio into interleaved stereo `f32` PCM at `sample_rate`.
///
/// The bytes are spooled to a scratch file and handed to the system `ffmpeg`,
/// which sniffs the container format and does the resampling. `source` is only
/// used in error messages.
pub fn decode_audio_f32_stereo(
    source: &str,
    bytes: &[u8],
    sample_rate: u32,
) -> SlidecastResult<AudioPcm> {
    let scratch = TempFileGuard::new(scratch_path("audio_src", "bin"));
    // Scratch file rather than a stdin pipe: seekable containers (m4a and
    // friends) cannot be demuxed from a pipe.
    std::fs::write(scratch.path(), bytes)
        .with_context(|| format!("spool audio bytes for '{source}'"))?;

    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(scratch.path())
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .context("run ffmpeg for audio decode")?;

    if !out.status.success() {
        return Err(SlidecastError::decode(format!(
            "audio '{}' is not decodable: {}",
            source,
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    if !out.stdout.len().is_multiple_of(4) {
        return Err(anyhow::anyhow!(
            "decoded audio byte length {} is not aligned to f32 samples",
            out.stdout.len()
        )
        .into());
    }
    let mut pcm = Vec::<f32>::with_capacity(out.stdout.len() / 4);
    for chunk in out.stdout.chunks_exact(4) {
        pcm.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32: pcm,
    })
}

/// Build a unique path under the system temp dir for short-lived scratch
/// files.
pub(crate) fn scratch_path(tag: &str, ext: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    std::env::temp_dir().join(format!(
        "slidecast_{tag}_{}_{}.{ext}",
        std::process::id(),
        nanos
    ))
}

/// Removes the wrapped file on drop. Used for decode and mux scratch files so
/// failures cannot leave them behind.
pub(crate) struct TempFileGuard {
    path: PathBuf,
}

impl TempFileGuard {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}
