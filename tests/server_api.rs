use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rouille::{Request, Response};
use slidecast::{RenderService, ServiceConfig, is_ffmpeg_on_path};

fn temp_root(tag: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!(
        "slidecast_api_{tag}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&root).unwrap();
    root
}

fn service(root: &Path) -> RenderService {
    RenderService::new(ServiceConfig {
        output_dir: root.join("out"),
        fetch_timeout: Duration::from_secs(2),
    })
    .unwrap()
}

fn json_post(url: &str, body: serde_json::Value) -> Request {
    Request::fake_http(
        "POST",
        url,
        vec![("Content-Type".to_string(), "application/json".to_string())],
        serde_json::to_vec(&body).unwrap(),
    )
}

fn body_bytes(response: Response) -> Vec<u8> {
    let (mut reader, _) = response.data.into_reader_and_size();
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).unwrap();
    bytes
}

fn body_string(response: Response) -> String {
    String::from_utf8(body_bytes(response)).unwrap()
}

fn header_value(response: &Response, name: &str) -> Option<String> {
    response
        .headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.to_string())
}

#[test]
fn preflight_requests_get_cors_headers_and_no_body() {
    let root = temp_root("preflight");
    let svc = service(&root);

    let response = svc.handle(&Request::fake_http("OPTIONS", "/render", vec![], vec![]));
    assert_eq!(response.status_code, 204);
    assert_eq!(
        header_value(&response, "Access-Control-Allow-Origin").as_deref(),
        Some("*")
    );
    assert_eq!(
        header_value(&response, "Access-Control-Allow-Methods").as_deref(),
        Some("GET, POST, OPTIONS")
    );
    assert_eq!(
        header_value(&response, "Access-Control-Allow-Headers").as_deref(),
        Some("Content-Type")
    );

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn health_endpoint_answers_with_cors() {
    let root = temp_root("health");
    let svc = service(&root);

    let response = svc.handle(&Request::fake_http("GET", "/health", vec![], vec![]));
    assert_eq!(response.status_code, 200);
    assert_eq!(
        header_value(&response, "Access-Control-Allow-Origin").as_deref(),
        Some("*")
    );
    assert!(body_string(response).contains("ok"));

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn malformed_json_bodies_are_rejected() {
    let root = temp_root("bad_json");
    let svc = service(&root);

    let request = Request::fake_http(
        "POST",
        "/render",
        vec![("Content-Type".to_string(), "application/json".to_string())],
        b"{images: oops".to_vec(),
    );
    let response = svc.handle(&request);
    assert_eq!(response.status_code, 400);
    assert!(body_string(response).contains("invalid JSON body"));

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn validation_failures_name_the_offending_entry() {
    let root = temp_root("bad_entry");
    let svc = service(&root);

    let response = svc.handle(&json_post(
        "/render",
        serde_json::json!({ "images": ["a.png", 42] }),
    ));
    assert_eq!(response.status_code, 400);
    assert!(body_string(response).contains("images[1]"));

    let response = svc.handle(&json_post("/render", serde_json::json!({ "images": [] })));
    assert_eq!(response.status_code, 400);
    assert!(body_string(response).contains("non-empty"));

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn unknown_routes_return_not_found() {
    let root = temp_root("not_found");
    let svc = service(&root);

    let response = svc.handle(&Request::fake_http("GET", "/nope", vec![], vec![]));
    assert_eq!(response.status_code, 404);
    assert!(body_string(response).contains("not found"));

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn static_paths_cannot_walk_out_of_the_output_dir() {
    let root = temp_root("traversal");
    let svc = service(&root);

    for url in [
        "/static/",
        "/static/../Cargo.toml",
        "/static/nested/video_00000000.mp4",
    ] {
        let response = svc.handle(&Request::fake_http("GET", url, vec![], vec![]));
        assert_eq!(response.status_code, 404, "expected 404 for {url}");
    }

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn finished_artifacts_are_served_as_video() {
    let root = temp_root("serve");
    let svc = service(&root);

    let payload = b"not really an mp4, close enough for transport".to_vec();
    std::fs::write(root.join("out").join("video_0123abcd.mp4"), &payload).unwrap();

    let response = svc.handle(&Request::fake_http(
        "GET",
        "/static/video_0123abcd.mp4",
        vec![],
        vec![],
    ));
    assert_eq!(response.status_code, 200);
    assert_eq!(
        header_value(&response, "Content-Type").as_deref(),
        Some("video/mp4")
    );
    assert_eq!(body_bytes(response), payload);

    let missing = svc.handle(&Request::fake_http(
        "GET",
        "/static/video_ffffffff.mp4",
        vec![],
        vec![],
    ));
    assert_eq!(missing.status_code, 404);

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn render_endpoint_mints_a_servable_artifact() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let root = temp_root("end_to_end");
    let svc = service(&root);

    let png = root.join("slide.png");
    image::RgbaImage::from_pixel(32, 32, image::Rgba([30, 120, 210, 255]))
        .save_with_format(&png, image::ImageFormat::Png)
        .unwrap();

    let response = svc.handle(&json_post(
        "/render",
        serde_json::json!({
            "images": [{ "url": png.to_string_lossy(), "duration": 0.5 }],
            "fps": 12,
        }),
    ));
    assert_eq!(response.status_code, 200);
    let body: serde_json::Value = serde_json::from_str(&body_string(response)).unwrap();
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("/static/video_"));
    assert!(url.ends_with(".mp4"));

    let served = svc.handle(&Request::fake_http("GET", url, vec![], vec![]));
    assert_eq!(served.status_code, 200);
    assert!(!body_bytes(served).is_empty());

    std::fs::remove_dir_all(&root).unwrap();
}
