//! Request handling on top of rouille.
//!
//! # Purpose
//!
//! Wires HTTP requests into the build/render pipeline. `POST /render` runs
//! synchronously: the response arrives when the artifact is fully encoded,
//! and a JSON error with the mapped status code arrives otherwise.
//!
//! # Thread safety
//!
//! rouille dispatches each request on its own thread. [`RenderService`] holds
//! only immutable configuration and a shareable HTTP client, and every render
//! works on request-local state with a collision-free output name, so
//! handlers need no locking.

use rouille::{Request, Response};
use serde::Serialize;

use crate::assets::fetch::SourceFetcher;
use crate::config::ServiceConfig;
use crate::foundation::error::SlidecastResult;
use crate::render::executor::{self, RenderOptions, RenderedArtifact};
use crate::server::STATIC_PREFIX;
use crate::timeline::build::build_timeline;
use crate::timeline::request::RenderRequest;

/// Success payload for `POST /render`.
#[derive(Serialize)]
struct RenderResponse {
    url: String,
}

/// Error payload shared by every failing route.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Payload for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// The HTTP service: routing, CORS, and the render entry point.
pub struct RenderService {
    config: ServiceConfig,
    fetcher: SourceFetcher,
}

impl RenderService {
    /// Build the service, creating the output directory if needed.
    pub fn new(config: ServiceConfig) -> SlidecastResult<Self> {
        config.ensure_output_dir()?;
        let fetcher = SourceFetcher::new(config.fetch_timeout)?;
        Ok(Self { config, fetcher })
    }

    /// Run the blocking server loop on `addr`. Never returns.
    pub fn run(self, addr: &str) -> ! {
        tracing::info!(
            %addr,
            output_dir = %self.config.output_dir.display(),
            "render service listening"
        );
        rouille::start_server(addr, move |request| self.handle(request))
    }

    /// Route one request. Exposed so tests can drive the service without a
    /// socket.
    pub fn handle(&self, request: &Request) -> Response {
        // Preflight
        if request.method() == "OPTIONS" {
            return Response::empty_204()
                .with_additional_header("Access-Control-Allow-Origin", "*")
                .with_additional_header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
                .with_additional_header("Access-Control-Allow-Headers", "Content-Type");
        }

        // Artifact names ride inside the path, which router! does not
        // capture well.
        let path = request.url();
        if request.method() == "GET"
            && let Some(name) = path.strip_prefix(STATIC_PREFIX)
        {
            return self
                .serve_artifact(name)
                .with_additional_header("Access-Control-Allow-Origin", "*");
        }

        let response = rouille::router!(request,
            (POST) ["/render"] => {
                self.handle_render(request)
            },
            (GET) ["/health"] => {
                Response::json(&HealthResponse { status: "ok" })
            },
            _ => {
                Response::json(&ErrorResponse {
                    error: "not found".to_string(),
                })
                .with_status_code(404)
            }
        );

        response.with_additional_header("Access-Control-Allow-Origin", "*")
    }

    fn handle_render(&self, request: &Request) -> Response {
        let body = match rouille::input::json_input::<RenderRequest>(request) {
            Ok(body) => body,
            Err(e) => {
                return Response::json(&ErrorResponse {
                    error: format!("invalid JSON body: {e}"),
                })
                .with_status_code(400);
            }
        };

        match self.render_request(&body) {
            Ok(artifact) => Response::json(&RenderResponse {
                url: format!("{STATIC_PREFIX}{}", artifact.file_name),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "render request failed");
                Response::json(&ErrorResponse {
                    error: e.to_string(),
                })
                .with_status_code(e.http_status())
            }
        }
    }

    fn render_request(&self, body: &RenderRequest) -> SlidecastResult<RenderedArtifact> {
        // Resolve the knobs up front so a bad fps or codec fails before any
        // fetch.
        let opts = RenderOptions {
            fps: body.resolve_fps()?,
            codec: body.resolve_codec()?,
        };
        let timeline = build_timeline(body, &self.fetcher)?;
        executor::render(&timeline, &opts, &self.config.output_dir)
    }

    fn serve_artifact(&self, name: &str) -> Response {
        // The output directory is flat; anything that could walk elsewhere is
        // a plain 404.
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Response::empty_404();
        }
        let path = self.config.output_dir.join(name);
        match std::fs::File::open(&path) {
            Ok(file) => {
                let content_type = if name.ends_with(".mp4") {
                    "video/mp4"
                } else {
                    "application/octet-stream"
                };
                Response::from_file(content_type, file)
            }
            Err(_) => Response::empty_404(),
        }
    }
}
