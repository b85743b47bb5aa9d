use anyhow::Context;
use bridge::model::BridgeModel;
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod bridge;
mod generator;
mod vision;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Synthetic-camera driver for the dart scoring core")]
struct Args {
    /// Score the whole synthetic scene once and print a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value_t = 90)]
    frames: u64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Let the circle finder recalibrate the board every frame
    #[arg(long, default_value_t = false)]
    auto_calibrate: bool,
    /// Stream the scene and serve the HTTP bridge until Ctrl+C
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.frames, args.seed, args.auto_calibrate)
    };

    let runner = Runner::new(workflow_config.clone());

    if args.offline {
        let result = runner.execute().context("running offline scene")?;
        let (throws, total) = result
            .final_score
            .as_ref()
            .map(|score| (score.throws.len(), score.total_score))
            .unwrap_or((0, 0));

        println!(
            "Offline run -> frames {}, failed {}, darts {}, total {}",
            result.frames_processed, result.frames_failed, throws, total
        );
        if let Some(score) = result.final_score.as_ref() {
            for throw in &score.throws {
                println!(
                    "  {:>5} at ({:.1}, {:.1}) confidence {:.2}",
                    throw.section.label, throw.x, throw.y, throw.confidence
                );
            }
        }

        let report = format!(
            "frames={} failed={} darts={} total={} changes={:?} calibration={:?}\n",
            result.frames_processed,
            result.frames_failed,
            throws,
            total,
            result.score_changes,
            result.calibration
        );
        let report_path = PathBuf::from("tools/data/offline_scores.log");
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(report_path)?;
        file.write_all(report.as_bytes())?;
    }

    if args.serve {
        let session = Arc::new(runner.build_session()?);
        let model = Arc::new(RwLock::new(BridgeModel::default()));
        println!(
            "HTTP bridge on {} (Ctrl+C to stop)...",
            workflow_config.bind
        );
        let runtime = TokioBuilder::new_multi_thread()
            .enable_all()
            .build()
            .context("creating runtime for the HTTP bridge")?;
        runtime.block_on(async {
            let shutdown = async {
                if let Err(err) = signal::ctrl_c().await {
                    log::warn!("awaiting Ctrl+C failed: {}", err);
                }
            };
            bridge::http::serve(
                session,
                model,
                workflow_config.bind,
                workflow_config.tick(),
                shutdown,
            )
            .await
        })?;
    }

    Ok(())
}
