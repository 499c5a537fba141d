//! Turning a prepared timeline into an MP4 on disk.
//!
//! Frames are composed on the CPU one at a time and streamed into a spawned
//! system `ffmpeg` over stdin; audio, when present, rides along as a raw
//! f32le side input. Nothing here touches the network.

/// Per-frame compositing with cross-fades.
pub mod compose;
/// ffmpeg subprocess encoding.
pub mod encode;
/// Render entry points and artifact naming.
pub mod executor;
