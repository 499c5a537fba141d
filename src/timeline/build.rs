use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::decode::{
    AudioPcm, DecodedImage, MIX_SAMPLE_RATE, decode_audio_f32_stereo, decode_image,
};
use crate::assets::fetch::SourceFetcher;
use crate::foundation::error::SlidecastResult;
use crate::timeline::model::{
    AUDIO_ATTENUATION, AudioOverlay, CROSSFADE_SECS, Canvas, Slide, Timeline,
};
use crate::timeline::request::RenderRequest;

/// Resolve, fetch, and decode a request into a render-ready [`Timeline`].
///
/// Validation runs first, so a malformed request never triggers a fetch.
/// Fetching and decoding happen in request order and stop at the first
/// failure; placement onto the shared canvas is parallelized.
#[tracing::instrument(skip_all)]
pub fn build_timeline(
    request: &RenderRequest,
    fetcher: &SourceFetcher,
) -> SlidecastResult<Timeline> {
    let segments = request.resolve_segments()?;

    let mut images = Vec::with_capacity(segments.len());
    for segment in &segments {
        let bytes = fetcher.fetch(&segment.source)?;
        let image = decode_image(&segment.source, &bytes)?;
        tracing::debug!(
            source = %segment.source,
            width = image.width,
            height = image.height,
            "decoded slide image"
        );
        images.push(image);
    }

    let canvas = canvas_covering(&images);
    let placed: Vec<Arc<Vec<u8>>> = images
        .par_iter()
        .map(|image| Arc::new(place_centered(canvas, image)))
        .collect();

    let crossfade_secs = if segments.len() > 1 {
        CROSSFADE_SECS
    } else {
        0.0
    };
    let mut slides = Vec::with_capacity(segments.len());
    let mut sum_before = 0.0f64;
    for (index, (segment, rgba8_premul)) in segments.iter().zip(placed).enumerate() {
        // Each fade pulls the slide half a second into its predecessor.
        let start_secs = (sum_before - crossfade_secs * index as f64).max(0.0);
        slides.push(Slide {
            source: segment.source.clone(),
            duration_secs: segment.duration_secs,
            start_secs,
            rgba8_premul,
        });
        sum_before += segment.duration_secs;
    }

    let mut timeline = Timeline {
        slides,
        canvas,
        crossfade_secs,
        audio: None,
    };

    if let Some(source) = request.audio.as_deref().map(str::trim)
        && !source.is_empty()
    {
        let total_secs = timeline.total_duration_secs();
        let bytes = fetcher.fetch(source)?;
        let pcm = decode_audio_f32_stereo(source, &bytes, MIX_SAMPLE_RATE)?;
        timeline.audio = Some(fit_overlay(source, pcm, total_secs));
    }

    tracing::info!(
        slides = timeline.slides.len(),
        width = timeline.canvas.width,
        height = timeline.canvas.height,
        duration_secs = timeline.total_duration_secs(),
        has_audio = timeline.audio.is_some(),
        "timeline ready"
    );
    Ok(timeline)
}

/// Smallest even-dimensioned canvas containing every image.
fn canvas_covering(images: &[DecodedImage]) -> Canvas {
    let mut width = 0;
    let mut height = 0;
    for image in images {
        width = width.max(image.width);
        height = height.max(image.height);
    }
    Canvas {
        width: round_up_even(width),
        height: round_up_even(height),
    }
}

fn round_up_even(v: u32) -> u32 {
    v + (v & 1)
}

/// Composite `image` centered over an opaque black canvas frame.
fn place_centered(canvas: Canvas, image: &DecodedImage) -> Vec<u8> {
    let mut out = vec![0u8; canvas.frame_bytes()];
    for px in out.chunks_exact_mut(4) {
        px[3] = 255;
    }

    let x0 = ((canvas.width - image.width) / 2) as usize;
    let y0 = ((canvas.height - image.height) / 2) as usize;
    let canvas_stride = canvas.width as usize * 4;
    let image_stride = image.width as usize * 4;

    for row in 0..image.height as usize {
        let src = &image.rgba8_premul[row * image_stride..(row + 1) * image_stride];
        let dst_off = (y0 + row) * canvas_stride + x0 * 4;
        let dst = &mut out[dst_off..dst_off + image_stride];
        dst.copy_from_slice(src);
        // Premultiplied source over opaque black keeps the premultiplied rgb
        // and lands on full alpha.
        for px in dst.chunks_exact_mut(4) {
            px[3] = 255;
        }
    }
    out
}

/// Attenuate the decoded PCM and size it to exactly `total_secs`: excess
/// samples are dropped, any shortfall stays silent.
fn fit_overlay(source: &str, pcm: AudioPcm, total_secs: f64) -> AudioOverlay {
    let frames = (total_secs * f64::from(pcm.sample_rate)).round().max(0.0) as usize;
    let mut interleaved_f32 = vec![0.0f32; frames * usize::from(pcm.channels)];
    for (dst, src) in interleaved_f32.iter_mut().zip(pcm.interleaved_f32.iter()) {
        *dst = *src * AUDIO_ATTENUATION;
    }
    AudioOverlay {
        source: source.to_string(),
        sample_rate: pcm.sample_rate,
        channels: pcm.channels,
        interleaved_f32,
    }
}
