use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use seqflow::builder::{Pipeline, PipelineBuilder};
use seqflow::config::PipelineConfig;
use seqflow::error::Error;
use seqflow::executor::{submit_stage, Executor, JobHandle, LocalExecutor};
use seqflow::recipes::ConcatRecipe;
use seqflow::{slog, Result};

/// Seqflow - three-tier batch pipeline orchestrator
#[derive(Parser, Debug)]
#[command(name = "seqflow")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    SEQFLOW_DEBUG=1     Enable debug logging (alternative to --debug)")]
pub struct Cli {
    /// Enable debug logging (writes to ~/.seqflow/seqflow.log)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Build the pipeline and print its stages, units, and dependencies
    Plan {
        /// Path to the pipeline TOML configuration
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Build the pipeline and execute it on the local host
    Submit {
        /// Path to the pipeline TOML configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Submit only the named stage, assuming upstream stages are complete
        #[arg(long)]
        stage: Option<String>,
    },

    /// Write each work unit's JSON descriptor for out-of-process execution
    Describe {
        /// Path to the pipeline TOML configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Directory the descriptor files are written to
        #[arg(short, long)]
        out: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    seqflow::log::init_with_debug(cli.debug);

    if let Err(err) = run(cli) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Plan { config } => {
            let pipeline = build_pipeline(&config)?;
            print_plan(&pipeline);
            Ok(())
        }
        Command::Submit { config, stage } => {
            let pipeline = build_pipeline(&config)?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(submit(&pipeline, stage.as_deref()))
        }
        Command::Describe { config, out } => {
            let pipeline = build_pipeline(&config)?;
            describe(&pipeline, &out)
        }
    }
}

fn build_pipeline(config_path: &Path) -> Result<Pipeline> {
    let config = PipelineConfig::load(config_path)?;
    let recipe = ConcatRecipe;
    PipelineBuilder::new(&config, &recipe).build()
}

fn print_plan(pipeline: &Pipeline) {
    for stage in pipeline.stages() {
        println!(
            "stage {} ({} thread(s), {} MiB)",
            stage.name,
            stage.threads(),
            stage.memory_mb()
        );
        for unit in stage.units() {
            let action = if unit.submit { "run" } else { "skip" };
            println!("  {} [{}] ({} task(s))", unit.name, action, unit.tasks.len());
            for dependency in &unit.dependencies {
                println!("    <- {}", dependency);
            }
        }
    }
}

async fn submit(pipeline: &Pipeline, stage_filter: Option<&str>) -> Result<()> {
    if let Some(name) = stage_filter {
        if pipeline.stage(name).is_none() {
            let known: Vec<&str> = pipeline.stages().iter().map(|s| s.name.as_str()).collect();
            return Err(Error::Config(format!(
                "unknown stage {} (known stages: {})",
                name,
                known.join(", ")
            )));
        }
    }

    let executor = LocalExecutor::new();
    let mut handles: HashMap<String, JobHandle> = HashMap::new();
    let mut submitted: Vec<(String, JobHandle)> = Vec::new();

    for stage in pipeline.stages() {
        if let Some(name) = stage_filter {
            if stage.name != name {
                continue;
            }
        }
        submit_stage(&executor, stage, &mut handles).await?;
        for unit in stage.units() {
            submitted.push((unit.name.clone(), handles[&unit.name]));
        }
    }

    let mut first_failure: Option<Error> = None;
    for (name, handle) in submitted {
        match executor.wait(handle).await {
            Ok(_) => println!("{}: ok", name),
            Err(err) => {
                println!("{}: {}", name, err);
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
        }
    }

    match first_failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn describe(pipeline: &Pipeline, out: &Path) -> Result<()> {
    std::fs::create_dir_all(out)?;
    let mut written = 0usize;
    for unit in pipeline.units() {
        let path = out.join(format!("{}.json", unit.name));
        std::fs::write(&path, unit.to_descriptor_json()?)?;
        slog!("wrote descriptor {}", path.display());
        written += 1;
    }
    println!("wrote {} descriptor(s) to {}", written, out.display());
    Ok(())
}
