//! From wire request to a fully decoded render plan.
//!
//! A [`RenderRequest`](request::RenderRequest) is resolved into canonical
//! segments, every reference is fetched and decoded, and the result is a
//! [`Timeline`](model::Timeline): canvas-sized slides with absolute start
//! times, overlapped by a fixed-width cross-fade, plus an optional prepared
//! audio overlay.

/// Timeline assembly from a resolved request.
pub mod build;
/// Prepared timeline model.
pub mod model;
/// Wire request and segment canonicalization.
pub mod request;
