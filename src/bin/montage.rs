use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Parser, Debug)]
#[command(name = "montage", version, about = "Turn still images and a soundtrack into a video")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single timeline instant as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Source image path or http(s) URL, in display order. Repeatable.
    #[arg(long = "image")]
    images: Vec<String>,

    /// Audio track.
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Output video path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Load the request from JSON; other flags override its fields.
    #[arg(long)]
    job: Option<PathBuf>,

    /// Seconds per image, including the crossfade overlap.
    #[arg(long)]
    duration_per_image: Option<f64>,

    /// Accepted for compatibility; the crossfade is fixed at 0.8 s.
    #[arg(long)]
    transition_duration: Option<f64>,

    #[command(flatten)]
    shape: ShapeArgs,

    /// Output frames per second.
    #[arg(long)]
    fps: Option<u32>,

    /// Seed for motion effect selection.
    #[arg(long)]
    seed: Option<u64>,

    /// Abort the job after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Parent directory for per-job scratch space.
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Fetch and decode images one at a time.
    #[arg(long, default_value_t = false)]
    sequential: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Source image path or http(s) URL, in display order. Repeatable.
    #[arg(long = "image", required = true)]
    images: Vec<String>,

    /// Timeline instant in seconds.
    #[arg(long)]
    at: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Seconds per image, including the crossfade overlap.
    #[arg(long)]
    duration_per_image: Option<f64>,

    #[command(flatten)]
    shape: ShapeArgs,

    /// Seed for motion effect selection.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(clap::Args, Debug)]
struct ShapeArgs {
    /// Output width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels.
    #[arg(long)]
    height: Option<u32>,
}

impl ShapeArgs {
    fn apply(&self, output: &mut montage::OutputSpec) {
        if let Some(w) = self.width {
            output.canvas.width = w;
        }
        if let Some(h) = self.height {
            output.canvas.height = h;
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("MONTAGE_LOG")
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut request = match &args.job {
        Some(path) => montage::GenerateRequest::from_json_path(path)?,
        None => {
            let audio = args.audio.clone().context("--audio is required without --job")?;
            let out = args.out.clone().context("--out is required without --job")?;
            montage::GenerateRequest::new(Vec::<String>::new(), audio, out)
        }
    };
    if !args.images.is_empty() {
        request.images = args.images.iter().map(|s| s.as_str().into()).collect();
    }
    if let Some(audio) = args.audio {
        request.audio_path = audio;
    }
    if let Some(out) = args.out {
        request.output_path = out;
    }
    if let Some(d) = args.duration_per_image {
        request.duration_per_image = d;
    }
    if let Some(td) = args.transition_duration {
        request.transition_duration = td;
    }
    args.shape.apply(&mut request.output);
    if let Some(fps) = args.fps {
        request.output.fps = montage::Fps::integer(fps)?;
    }
    if args.seed.is_some() {
        request.seed = args.seed;
    }

    let mut config = montage::PipelineConfig {
        job_timeout: args.timeout_secs.map(Duration::from_secs),
        parallel_fetch: !args.sequential,
        ..montage::PipelineConfig::default()
    };
    if let Some(dir) = args.scratch_dir {
        config.scratch_root = dir;
    }

    let report = montage::generate(&request, &config)
        .with_context(|| format!("render '{}'", request.output_path.display()))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    eprintln!("wrote {}", report.output_path.display());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut request = montage::GenerateRequest::new(
        args.images.iter().map(String::as_str),
        PathBuf::new(),
        args.out.clone(),
    );
    if let Some(d) = args.duration_per_image {
        request.duration_per_image = d;
    }
    args.shape.apply(&mut request.output);
    request.seed = args.seed;

    let frame = montage::preview_frame(&request, &montage::PipelineConfig::default(), args.at)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
