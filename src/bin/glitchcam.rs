use std::ops::ControlFlow;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use glitchcam::{
    Extent, PipelineSession, Preset, Scheduler, TestPatternSource, TickInputs, TickParams, export,
};

#[derive(Parser, Debug)]
#[command(name = "glitchcam", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline over the built-in test pattern and save one snapshot.
    Frame(FrameArgs),
    /// Run the pipeline and save a numbered PNG per tick.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Warm-up ticks before the snapshot (lets feedback trails build up).
    #[arg(long, default_value_t = 30)]
    ticks: u32,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Output directory for frame_NNNN.png files.
    #[arg(long)]
    out_dir: PathBuf,

    /// Number of ticks to render.
    #[arg(long, default_value_t = 90)]
    ticks: u32,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Parser, Debug)]
struct PipelineArgs {
    /// Stock look to start from.
    #[arg(long, value_enum, default_value_t = PresetChoice::Mall)]
    preset: PresetChoice,

    /// Parameter snapshot as JSON, overriding the preset entirely.
    #[arg(long)]
    params_json: Option<String>,

    /// RNG seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// Viewport width in device pixels.
    #[arg(long, default_value_t = 1080)]
    viewport_width: u32,

    /// Viewport height in device pixels.
    #[arg(long, default_value_t = 1920)]
    viewport_height: u32,

    /// Synthetic source width (0x0 exercises the unreported-camera path).
    #[arg(long, default_value_t = 1280)]
    source_width: u32,

    /// Synthetic source height.
    #[arg(long, default_value_t = 720)]
    source_height: u32,

    /// Fire the bend burst on the first tick.
    #[arg(long)]
    bend: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PresetChoice {
    Mall,
    Buffer,
    Neon,
    Digi,
}

impl PresetChoice {
    fn preset(self) -> Preset {
        match self {
            PresetChoice::Mall => Preset::Mall,
            PresetChoice::Buffer => Preset::Buffer,
            PresetChoice::Neon => Preset::Neon,
            PresetChoice::Digi => Preset::Digi,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn build_params(args: &PipelineArgs) -> anyhow::Result<TickParams> {
    let params = match &args.params_json {
        Some(json) => {
            serde_json::from_str::<TickParams>(json).context("parse --params-json snapshot")?
        }
        None => args.preset.preset().params(),
    };
    params.validate()?;
    Ok(params)
}

fn build_scheduler(args: &PipelineArgs) -> Scheduler {
    let session = match args.seed {
        Some(seed) => PipelineSession::with_seed(seed),
        None => PipelineSession::new(),
    };
    Scheduler::new(session)
}

fn build_source(args: &PipelineArgs) -> anyhow::Result<TestPatternSource> {
    if args.source_width == 0 || args.source_height == 0 {
        return Ok(TestPatternSource::unreported());
    }
    Ok(TestPatternSource::new(Extent::new(
        args.source_width,
        args.source_height,
    ))?)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let params = build_params(&args.pipeline)?;
    let viewport = Extent::new(args.pipeline.viewport_width, args.pipeline.viewport_height);
    let mut source = build_source(&args.pipeline)?;
    let mut scheduler = build_scheduler(&args.pipeline);
    if args.pipeline.bend {
        scheduler.session_mut().trigger_bend();
    }

    let total = args.ticks.max(1);
    let mut remaining = total;
    scheduler.run(
        &mut source,
        || TickInputs { viewport, params },
        |_| {
            remaining -= 1;
            if remaining == 0 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        },
    )?;

    export::save_png(scheduler.session().frame(), &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let params = build_params(&args.pipeline)?;
    let viewport = Extent::new(args.pipeline.viewport_width, args.pipeline.viewport_height);
    let mut source = build_source(&args.pipeline)?;
    let mut scheduler = build_scheduler(&args.pipeline);
    if args.pipeline.bend {
        scheduler.session_mut().trigger_bend();
    }

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let total = args.ticks.max(1);
    let mut index = 0u32;
    let mut failure = None;
    scheduler.run(
        &mut source,
        || TickInputs { viewport, params },
        |session| {
            let path = args.out_dir.join(format!("frame_{index:04}.png"));
            if let Err(err) = export::save_png(session.frame(), &path) {
                failure = Some(err);
                return ControlFlow::Break(());
            }
            index += 1;
            if index >= total {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        },
    )?;
    if let Some(err) = failure {
        return Err(err.into());
    }

    eprintln!("wrote {index} frames to {}", args.out_dir.display());
    Ok(())
}
