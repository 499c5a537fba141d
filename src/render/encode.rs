use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use anyhow::Context;

use crate::foundation::error::{SlidecastError, SlidecastResult};

/// Raw f32le side input muxed in next to the video stream.
#[derive(Clone, Debug)]
pub struct AudioInputConfig {
    /// Path to interleaved little-endian f32 samples.
    pub path: PathBuf,
    /// Samples per second.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

/// Settings for one ffmpeg encode.
#[derive(Clone, Debug)]
pub struct EncodeConfig {
    /// Frame width in pixels; must be even for yuv420p.
    pub width: u32,
    /// Frame height in pixels; must be even for yuv420p.
    pub height: u32,
    /// Frames per second.
    pub fps: u32,
    /// Video codec identifier handed to `-c:v`.
    pub codec: String,
    /// Output MP4 path.
    pub out_path: PathBuf,
    /// Optional audio side input.
    pub audio: Option<AudioInputConfig>,
}

impl EncodeConfig {
    /// Check the settings before spawning anything.
    pub fn validate(&self) -> SlidecastResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SlidecastError::encode(
                "encode width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(SlidecastError::encode(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.fps == 0 {
            return Err(SlidecastError::encode("encode fps must be non-zero"));
        }
        if self.codec.trim().is_empty() {
            return Err(SlidecastError::encode("encode codec must be non-empty"));
        }
        if let Some(audio) = self.audio.as_ref() {
            if audio.sample_rate == 0 {
                return Err(SlidecastError::encode(
                    "audio sample_rate must be non-zero when audio is enabled",
                ));
            }
            if audio.channels == 0 {
                return Err(SlidecastError::encode(
                    "audio channels must be non-zero when audio is enabled",
                ));
            }
        }
        Ok(())
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Streams raw premultiplied RGBA8 frames into a spawned system `ffmpeg`.
///
/// The system binary is used rather than linked FFmpeg libraries to avoid
/// native dev header/lib requirements. Frames are flattened over opaque black
/// before hitting stdin, since ffmpeg does not understand premultiplied
/// alpha.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: Vec<u8>,
}

impl FfmpegEncoder {
    /// Validate `cfg` and spawn the encoding subprocess.
    pub fn spawn(cfg: EncodeConfig) -> SlidecastResult<Self> {
        cfg.validate()?;

        if !is_ffmpeg_on_path() {
            return Err(SlidecastError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
        ]);

        if let Some(audio) = cfg.audio.as_ref() {
            cmd.args([
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate.to_string(),
                "-ac",
                &audio.channels.to_string(),
                "-i",
            ])
            .arg(&audio.path);
            cmd.args(["-c:v", &cfg.codec, "-pix_fmt", "yuv420p"]);
            // `-shortest` caps the mux at the video track; the overlay is
            // already sized to it, so this only guards against rounding.
            cmd.args(["-c:a", "aac", "-shortest"]);
        } else {
            cmd.args(["-an", "-c:v", &cfg.codec, "-pix_fmt", "yuv420p"]);
        }
        cmd.args(["-threads", "4", "-movflags", "+faststart"])
            .arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            SlidecastError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SlidecastError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| SlidecastError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        // Drained on a thread so a chatty ffmpeg cannot deadlock against our
        // frame writes.
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        Ok(Self {
            scratch: vec![0u8; (cfg.width * cfg.height * 4) as usize],
            cfg,
            child: Some(child),
            stdin: Some(stdin),
            stderr_drain: Some(stderr_drain),
        })
    }

    /// Flatten one premultiplied RGBA8 frame and write it to ffmpeg.
    pub fn encode_frame(&mut self, rgba8_premul: &[u8]) -> SlidecastResult<()> {
        if rgba8_premul.len() != self.scratch.len() {
            return Err(SlidecastError::encode(format!(
                "frame size mismatch: got {} bytes, expected {}x{}x4",
                rgba8_premul.len(),
                self.cfg.width,
                self.cfg.height
            )));
        }

        flatten_premul_over_black(&mut self.scratch, rgba8_premul)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(SlidecastError::encode("ffmpeg encoder is already finalized"));
        };
        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            SlidecastError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    /// Close stdin, wait for ffmpeg, and surface its stderr on failure.
    pub fn finish(mut self) -> SlidecastResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| SlidecastError::encode("ffmpeg encoder already finished"))?;

        let status = child.wait().map_err(|e| {
            SlidecastError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| SlidecastError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| SlidecastError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(SlidecastError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        // Finished encoders already took the child; anything left here is an
        // abandoned encode.
        if let Some(mut child) = self.child.take() {
            drop(self.stdin.take());
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Serialize samples as little-endian f32 to `path`.
pub fn write_f32le_file(samples: &[f32], path: &Path) -> SlidecastResult<()> {
    use std::io::Write as _;
    let file = std::fs::File::create(path)
        .with_context(|| format!("create audio scratch file '{}'", path.display()))?;
    let mut writer = std::io::BufWriter::new(file);
    for sample in samples {
        writer
            .write_all(&sample.to_le_bytes())
            .context("write audio scratch samples")?;
    }
    writer.flush().context("flush audio scratch file")?;
    Ok(())
}

fn flatten_premul_over_black(dst: &mut [u8], src_premul: &[u8]) -> SlidecastResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(SlidecastError::encode(
            "flatten_premul_over_black expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        // Premultiplied rgb over black is the rgb itself.
        d[0] = s[0];
        d[1] = s[1];
        d[2] = s[2];
        d[3] = 255;
    }
    Ok(())
}
