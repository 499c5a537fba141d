use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use slidecast::{
    MIX_SAMPLE_RATE, RenderOptions, RenderRequest, SourceFetcher, build_timeline, render,
};

fn ffmpeg_tools_available() -> bool {
    let ffmpeg_ok = Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    let ffprobe_ok = Command::new("ffprobe")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    ffmpeg_ok && ffprobe_ok
}

fn temp_root(tag: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!(
        "slidecast_{tag}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&root).unwrap();
    root
}

fn write_png(root: &Path, name: &str, width: u32, height: u32, rgba: [u8; 4]) -> String {
    let path = root.join(name);
    image::RgbaImage::from_pixel(width, height, image::Rgba(rgba))
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();
    path.to_string_lossy().to_string()
}

fn synth_tone(root: &Path, name: &str, secs: f64) -> String {
    let path = root.join(name);
    let status = Command::new("ffmpeg")
        .args([
            "-v",
            "error",
            "-y",
            "-f",
            "lavfi",
            "-i",
            "sine=frequency=220:sample_rate=48000",
            "-t",
            &secs.to_string(),
            "-c:a",
            "pcm_s16le",
        ])
        .arg(&path)
        .status()
        .unwrap();
    assert!(status.success(), "ffmpeg failed creating {name}");
    path.to_string_lossy().to_string()
}

fn ffprobe_duration(path: &Path) -> f64 {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
        .unwrap();
    assert!(out.status.success());
    String::from_utf8_lossy(&out.stdout).trim().parse().unwrap()
}

fn ffprobe_has_audio(path: &Path) -> bool {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "a",
            "-show_entries",
            "stream=codec_type",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
        .unwrap();
    out.status.success() && String::from_utf8_lossy(&out.stdout).contains("audio")
}

fn request(body: serde_json::Value) -> RenderRequest {
    serde_json::from_value(body).unwrap()
}

#[test]
fn crossfaded_slideshow_encodes_with_the_expected_duration() {
    if !ffmpeg_tools_available() {
        return;
    }
    let root = temp_root("render_fade");
    let a = write_png(&root, "a.png", 64, 48, [200, 40, 40, 255]);
    let b = write_png(&root, "b.png", 64, 48, [40, 40, 200, 255]);

    let req = request(serde_json::json!({
        "images": [a, { "url": b, "duration": 2.0 }],
    }));
    let fetcher = SourceFetcher::new(Duration::from_secs(2)).unwrap();
    let timeline = build_timeline(&req, &fetcher).unwrap();
    // 3.0 + 2.0 with 0.5 of overlap
    assert!((timeline.total_duration_secs() - 4.5).abs() < 1e-9);

    let out_dir = root.join("out");
    std::fs::create_dir_all(&out_dir).unwrap();
    let artifact = render(&timeline, &RenderOptions::default(), &out_dir).unwrap();

    assert!(artifact.path.exists());
    assert!(artifact.file_name.starts_with("video_"));
    assert!(artifact.file_name.ends_with(".mp4"));
    assert!(!ffprobe_has_audio(&artifact.path));
    let probed = ffprobe_duration(&artifact.path);
    assert!((probed - 4.5).abs() < 0.2, "probed duration {probed}");

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn short_audio_is_muxed_without_stretching_the_video() {
    if !ffmpeg_tools_available() {
        return;
    }
    let root = temp_root("render_audio_pad");
    let a = write_png(&root, "a.png", 64, 64, [90, 160, 40, 255]);
    let tone = synth_tone(&root, "tone.wav", 1.0);

    let req = request(serde_json::json!({ "images": [a], "audio": tone }));
    let fetcher = SourceFetcher::new(Duration::from_secs(2)).unwrap();
    let timeline = build_timeline(&req, &fetcher).unwrap();

    // the overlay covers the full three seconds, mostly as silence
    let overlay = timeline.audio.as_ref().unwrap();
    assert_eq!(
        overlay.interleaved_f32.len(),
        3 * MIX_SAMPLE_RATE as usize * 2
    );

    let out_dir = root.join("out");
    std::fs::create_dir_all(&out_dir).unwrap();
    let artifact = render(&timeline, &RenderOptions::default(), &out_dir).unwrap();

    assert!(ffprobe_has_audio(&artifact.path));
    let probed = ffprobe_duration(&artifact.path);
    assert!((probed - 3.0).abs() < 0.25, "probed duration {probed}");

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn long_audio_is_truncated_to_the_video() {
    if !ffmpeg_tools_available() {
        return;
    }
    let root = temp_root("render_audio_cut");
    let a = write_png(&root, "a.png", 64, 64, [160, 40, 160, 255]);
    let tone = synth_tone(&root, "tone.wav", 4.0);

    let req = request(serde_json::json!({
        "images": [{ "url": a, "duration": 1.5 }],
        "audio": tone,
    }));
    let fetcher = SourceFetcher::new(Duration::from_secs(2)).unwrap();
    let timeline = build_timeline(&req, &fetcher).unwrap();
    assert!((timeline.total_duration_secs() - 1.5).abs() < 1e-9);

    let out_dir = root.join("out");
    std::fs::create_dir_all(&out_dir).unwrap();
    let artifact = render(&timeline, &RenderOptions::default(), &out_dir).unwrap();

    assert!(ffprobe_has_audio(&artifact.path));
    let probed = ffprobe_duration(&artifact.path);
    assert!((probed - 1.5).abs() < 0.25, "probed duration {probed}");

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn failed_encodes_leave_nothing_behind() {
    if !ffmpeg_tools_available() {
        return;
    }
    let root = temp_root("render_bad_codec");
    let a = write_png(&root, "a.png", 64, 64, [20, 20, 20, 255]);

    let req = request(serde_json::json!({ "images": [a] }));
    let fetcher = SourceFetcher::new(Duration::from_secs(2)).unwrap();
    let timeline = build_timeline(&req, &fetcher).unwrap();

    let out_dir = root.join("out");
    std::fs::create_dir_all(&out_dir).unwrap();
    let opts = RenderOptions {
        fps: 24,
        codec: "definitely-not-a-codec".to_string(),
    };
    let err = render(&timeline, &opts, &out_dir).unwrap_err();
    assert_eq!(err.http_status(), 500);
    assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 0);

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn repeated_renders_mint_distinct_artifacts() {
    if !ffmpeg_tools_available() {
        return;
    }
    let root = temp_root("render_distinct");
    let a = write_png(&root, "a.png", 32, 32, [250, 250, 20, 255]);

    let req = request(serde_json::json!({ "images": [{ "url": a, "duration": 0.5 }] }));
    let fetcher = SourceFetcher::new(Duration::from_secs(2)).unwrap();
    let timeline = build_timeline(&req, &fetcher).unwrap();

    let out_dir = root.join("out");
    std::fs::create_dir_all(&out_dir).unwrap();
    let first = render(&timeline, &RenderOptions::default(), &out_dir).unwrap();
    let second = render(&timeline, &RenderOptions::default(), &out_dir).unwrap();

    assert_ne!(first.file_name, second.file_name);
    assert!(first.path.exists());
    assert!(second.path.exists());

    std::fs::remove_dir_all(&root).unwrap();
}
