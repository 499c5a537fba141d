//! slidecast turns a list of still images, plus optional background audio,
//! into an MP4 slideshow behind one HTTP endpoint.
//!
//! The pipeline is strictly staged:
//!
//! - Validate: the wire request is canonicalized before anything is fetched
//! - Fetch and decode: every reference becomes premultiplied RGBA8 pixels or
//!   stereo f32 PCM
//! - Build: slides get absolute windows on the timeline, adjacent pairs
//!   overlapped by a fixed half-second cross-fade
//! - Render: frames stream into the system `ffmpeg`, which muxes the MP4
//!
//! [`server::RenderService`] exposes the pipeline over HTTP; the `slidecast`
//! binary wraps it in a CLI.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub mod assets;
pub mod config;
pub mod render;
pub mod server;
pub mod timeline;

pub use crate::config::{DEFAULT_FETCH_TIMEOUT, ServiceConfig};
pub use crate::foundation::error::{SlidecastError, SlidecastResult};

pub use crate::assets::decode::{AudioPcm, DecodedImage, MIX_SAMPLE_RATE};
pub use crate::assets::fetch::SourceFetcher;
pub use crate::render::compose::FrameComposer;
pub use crate::render::encode::{AudioInputConfig, EncodeConfig, FfmpegEncoder, is_ffmpeg_on_path};
pub use crate::render::executor::{
    RenderOptions, RenderedArtifact, artifact_file_name, render, render_to_path,
};
pub use crate::server::{RenderService, STATIC_PREFIX};
pub use crate::timeline::build::build_timeline;
pub use crate::timeline::model::{
    AUDIO_ATTENUATION, AudioOverlay, CROSSFADE_SECS, Canvas, Slide, Timeline,
};
pub use crate::timeline::request::{
    DEFAULT_CODEC, DEFAULT_FPS, DEFAULT_SLIDE_SECS, ImageSegment, RenderRequest, SegmentSpec,
};
