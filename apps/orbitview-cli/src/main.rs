use clap::{Parser, Subcommand};
use orbitview_app::{ApplicationContext, CancellationToken, FixedRatePacer, FrameLoop, SceneConfig};
use orbitview_common::Viewport;
use orbitview_render::Renderer;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orbitview-cli", about = "Headless tools for the orbitview scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and the effective scene configuration
    Info,
    /// Initialize the scene and print one rendered frame
    Inspect {
        #[arg(long, default_value = "800")]
        width: u32,
        #[arg(long, default_value = "600")]
        height: u32,
    },
    /// Show surface size and camera aspect before and after a resize
    Resize {
        #[arg(long, default_value = "1920")]
        width: u32,
        #[arg(long, default_value = "1080")]
        height: u32,
    },
    /// Run the frame loop headlessly for a fixed time
    Run {
        /// Seconds before the loop is cancelled
        #[arg(short, long, default_value = "1.0")]
        seconds: f64,
        /// Target frames per second
        #[arg(long, default_value = "60")]
        fps: u32,
        #[arg(long, default_value = "800")]
        width: u32,
        #[arg(long, default_value = "600")]
        height: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("orbitview-cli v{}", env!("CARGO_PKG_VERSION"));
            print!("{}", config.to_yaml_string()?);
        }
        Commands::Inspect { width, height } => {
            let mut ctx = ApplicationContext::headless(Viewport::new(width, height), &config)?;
            print!("{}", ctx.render_frame()?);
        }
        Commands::Resize { width, height } => {
            let mut ctx = ApplicationContext::headless(Viewport::new(800, 600), &config)?;
            println!(
                "before: surface={} aspect={:.4}",
                ctx.renderer().size(),
                ctx.camera().aspect
            );
            ctx.on_resize(width, height);
            println!(
                "after:  surface={} aspect={:.4}",
                ctx.renderer().size(),
                ctx.camera().aspect
            );
        }
        Commands::Run {
            seconds,
            fps,
            width,
            height,
        } => {
            if !seconds.is_finite() || seconds < 0.0 {
                anyhow::bail!("--seconds must be a non-negative number, got {seconds}");
            }
            let mut ctx = ApplicationContext::headless(Viewport::new(width, height), &config)?;
            let token = CancellationToken::new();
            let timer = {
                let token = token.clone();
                let duration = Duration::from_secs_f64(seconds);
                std::thread::spawn(move || {
                    std::thread::sleep(duration);
                    token.cancel();
                })
            };

            tracing::info!(seconds, fps, viewport = %ctx.viewport(), "running headless frame loop");
            let mut frame_loop = FrameLoop::new(token);
            let frames = frame_loop.run(&mut ctx, &mut FixedRatePacer::new(fps))?;
            timer
                .join()
                .map_err(|_| anyhow::anyhow!("timer thread panicked"))?;
            println!("rendered {frames} frames in {seconds:.2}s at target {fps} fps");
        }
    }

    Ok(())
}
