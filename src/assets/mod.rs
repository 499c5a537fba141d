//! Fetching and decoding of the raw inputs behind a render request.
//!
//! Sources arrive as opaque reference strings (remote URLs or local paths);
//! this module turns them into bytes, then into premultiplied RGBA8 images or
//! interleaved stereo PCM.

/// Image and audio decoding.
pub mod decode;
/// Reference-to-bytes resolution.
pub mod fetch;
