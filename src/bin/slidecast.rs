use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "slidecast", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP render service.
    Serve(ServeArgs),
    /// Render one request JSON straight to a file (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Directory artifacts are written to and served from; defaults to the
    /// system temp dir.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Seconds before a remote fetch is abandoned.
    #[arg(long, default_value_t = 20)]
    fetch_timeout_secs: u64,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input request JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Seconds before a remote fetch is abandoned.
    #[arg(long, default_value_t = 20)]
    fetch_timeout_secs: u64,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Serve(args) => cmd_serve(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = slidecast::ServiceConfig {
        output_dir: args.output_dir.unwrap_or_else(std::env::temp_dir),
        fetch_timeout: Duration::from_secs(args.fetch_timeout_secs),
    };
    let service = slidecast::server::RenderService::new(config)?;
    service.run(&format!("{}:{}", args.host, args.port))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let body = std::fs::read_to_string(&args.in_path)
        .with_context(|| format!("read request '{}'", args.in_path.display()))?;
    let request: slidecast::RenderRequest = serde_json::from_str(&body)
        .with_context(|| format!("parse request '{}'", args.in_path.display()))?;

    let opts = slidecast::RenderOptions {
        fps: request.resolve_fps()?,
        codec: request.resolve_codec()?,
    };
    let fetcher = slidecast::SourceFetcher::new(Duration::from_secs(args.fetch_timeout_secs))?;
    let timeline = slidecast::build_timeline(&request, &fetcher)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    slidecast::render_to_path(&timeline, &opts, &args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
