//! HTTP front-end for the render pipeline.
//!
//! | Method | Path                | Purpose                                  |
//! |--------|---------------------|------------------------------------------|
//! | POST   | `/render`           | Build and encode a slideshow             |
//! | GET    | `/static/<name>`    | Serve a finished artifact                |
//! | GET    | `/health`           | Liveness probe                           |
//!
//! Every response carries permissive CORS headers so browser front-ends can
//! call the service directly.

mod api;

pub use api::RenderService;

/// URL prefix artifacts are published under.
pub const STATIC_PREFIX: &str = "/static/";
