//! Shared foundation types used across the crate.

/// Error taxonomy and result alias.
pub mod error;
