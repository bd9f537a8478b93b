use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dyngeo::prelude::{GeomCfg, Viewport};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

mod scene;

#[derive(Parser)]
#[command(name = "dyngeo-cli")]
#[command(about = "Replay dynamic-geometry scenes and report configuration")]
struct Cmd {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Build a JSON scene, replay its drag steps and write the trace
    Run {
        #[arg(long)]
        scene: PathBuf,
        /// Trace destination; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the crate version and default configuration as JSON
    Report,
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let level = if cmd.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    SubscriberBuilder::default()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    match cmd.action {
        Action::Run { scene, out } => run(&scene, out.as_deref()),
        Action::Report => report(),
    }
}

fn run(scene_path: &Path, out: Option<&Path>) -> Result<()> {
    tracing::info!(scene = %scene_path.display(), "run");
    let scene = scene::load(scene_path)?;
    let trace = scene::run(&scene)?;
    let bytes = serde_json::to_vec_pretty(&trace)?;
    match out {
        Some(out_path) => {
            if let Some(parent) = out_path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
            }
            std::fs::write(out_path, bytes).with_context(|| format!("writing {}", out_path.display()))?;
            tracing::info!(out = %out_path.display(), "trace written");
        }
        None => println!("{}", String::from_utf8_lossy(&bytes)),
    }
    Ok(())
}

fn report() -> Result<()> {
    let rev = option_env!("GIT_COMMIT").unwrap_or("unknown");
    let cfg = GeomCfg::default();
    let vp = Viewport::default();
    let obj = serde_json::json!({
        "version": dyngeo::VERSION,
        "code_rev": rev,
        "cfg": {
            "eps": cfg.eps,
            "max_iter": cfg.max_iter,
            "sample_spacing": cfg.sample_spacing,
            "min_samples": cfg.min_samples,
            "max_samples": cfg.max_samples,
        },
        "viewport": {
            "origin_x": vp.origin_x,
            "origin_y": vp.origin_y,
            "unit_x": vp.unit_x,
            "unit_y": vp.unit_y,
        },
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
