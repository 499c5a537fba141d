use crate::foundation::error::{SlidecastError, SlidecastResult};
use crate::timeline::model::Timeline;

/// Streams the frames of a timeline one at a time.
///
/// Each frame starts from the most recent slide to have begun and folds in
/// every later slide whose window has opened, weighted by its fade-in
/// progress. Composition reuses one scratch buffer, so rendering does not
/// allocate per frame.
pub struct FrameComposer<'a> {
    timeline: &'a Timeline,
    fps: u32,
    frame_count: u64,
    scratch: Vec<u8>,
}

impl<'a> FrameComposer<'a> {
    /// Prepare a composer for `timeline` at `fps` frames per second.
    pub fn new(timeline: &'a Timeline, fps: u32) -> SlidecastResult<Self> {
        if fps == 0 {
            return Err(SlidecastError::validation("fps must be a positive integer"));
        }
        if timeline.slides.is_empty() {
            return Err(SlidecastError::validation(
                "timeline must contain at least one slide",
            ));
        }
        let frame_count = (timeline.total_duration_secs() * f64::from(fps))
            .round()
            .max(1.0) as u64;
        Ok(Self {
            scratch: vec![0u8; timeline.canvas.frame_bytes()],
            timeline,
            fps,
            frame_count,
        })
    }

    /// Frames the timeline spans at the configured rate, at least one.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Compose frame `idx` and return the premultiplied RGBA8 canvas.
    pub fn compose_frame(&mut self, idx: u64) -> SlidecastResult<&[u8]> {
        if idx >= self.frame_count {
            return Err(SlidecastError::encode(format!(
                "frame index {idx} is past the timeline end ({} frames)",
                self.frame_count
            )));
        }
        let timeline = self.timeline;
        let t = idx as f64 / f64::from(self.fps);
        let fade = timeline.crossfade_secs;

        let mut wrote_base = false;
        for slide in &timeline.slides {
            if slide.start_secs > t {
                break;
            }
            if !wrote_base {
                self.scratch.copy_from_slice(&slide.rgba8_premul);
                wrote_base = true;
                continue;
            }
            let alpha = if fade > 0.0 {
                ((t - slide.start_secs) / fade).clamp(0.0, 1.0) as f32
            } else {
                1.0
            };
            if alpha >= 1.0 {
                // Fully faded in; it owns the frame from here on.
                self.scratch.copy_from_slice(&slide.rgba8_premul);
            } else if alpha > 0.0 {
                crossfade_in_place(&mut self.scratch, &slide.rgba8_premul, alpha)?;
            }
        }
        if !wrote_base {
            // Slides are ordered and the first starts at zero, so every valid
            // t has a base.
            return Err(SlidecastError::encode(format!("no slide covers t={t:.3}s")));
        }
        Ok(&self.scratch)
    }
}

/// Blend `dst` toward `src` by `t` in premultiplied space.
fn crossfade_in_place(dst: &mut [u8], src: &[u8], t: f32) -> SlidecastResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(SlidecastError::encode(
            "crossfade_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = crossfade_px([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], t);
        d.copy_from_slice(&out);
    }
    Ok(())
}

fn crossfade_px(a: [u8; 4], b: [u8; 4], t: f32) -> [u8; 4] {
    let t = t.clamp(0.0, 1.0);
    let tt = ((t * 255.0).round() as i32).clamp(0, 255) as u16;
    let it = 255u16 - tt;

    let mut out = [0u8; 4];
    for i in 0..4 {
        let av = mul_div255(u16::from(a[i]), it);
        let bv = mul_div255(u16::from(b[i]), tt);
        out[i] = av.saturating_add(bv);
    }
    out
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
