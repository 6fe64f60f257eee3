use anyhow::Context;
use clap::Parser;
use colidecore::prelude::CancelToken;
use colidecore::template::TemplateSpec;
use generator::scenario::{build_grid, ScenarioKind};
use log::{info, warn};
use std::fs;
use std::path::PathBuf;
use std::thread;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Runs the Colide detectors over a synthetic grid")]
struct Args {
    /// Load a workflow config from YAML; the remaining flags are ignored
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = ScenarioKind::Speckle)]
    scenario: ScenarioKind,
    #[arg(long, default_value_t = 64)]
    nx: usize,
    #[arg(long, default_value_t = 48)]
    ny: usize,
    /// Template length in grid cells
    #[arg(long, default_value_t = 5.0)]
    length: f32,
    /// Template width in grid cells
    #[arg(long, default_value_t = 3.0)]
    width: f32,
    #[arg(long, default_value_t = 4)]
    threads: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Write the JSON report here instead of stdout
    #[arg(long)]
    report: Option<PathBuf>,
}

/// Cancels `token` on Ctrl+C so a long pass stops at the next row.
fn spawn_interrupt_listener(token: CancelToken) -> anyhow::Result<()> {
    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating runtime for signal handling")?;
    thread::Builder::new()
        .name("colide-interrupt".into())
        .spawn(move || {
            runtime.block_on(async {
                match signal::ctrl_c().await {
                    Ok(()) => {
                        warn!("interrupt received, cancelling remaining rows");
                        token.cancel();
                    }
                    Err(err) => warn!("cannot listen for Ctrl+C: {}", err),
                }
            });
        })
        .context("spawning interrupt listener")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(
            args.scenario,
            args.nx,
            args.ny,
            TemplateSpec::new(args.length, args.width),
            args.threads,
            args.seed,
        )
    };

    let input = build_grid(&workflow_config.scenario).context("building scenario grid")?;
    let runner = Runner::new(workflow_config.clone());
    spawn_interrupt_listener(runner.cancel_token())?;

    info!(
        "scoring {:?} scenario {}x{} with {} thread(s)",
        workflow_config.scenario.kind,
        input.nx(),
        input.ny(),
        workflow_config.threads
    );
    let result = runner.execute(&input)?;
    let report = serde_json::to_string_pretty(&result).context("serializing report")?;

    match args.report {
        Some(report_path) => {
            if let Some(parent) = report_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&report_path, report)
                .with_context(|| format!("writing report {}", report_path.display()))?;
            info!("report written to {}", report_path.display());
        }
        None => println!("{}", report),
    }

    Ok(())
}
