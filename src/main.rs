use anyhow::Result;
use clap::Parser;
use juris_generator::app::Pipeline;
use juris_generator::models::{Config, GenerationJob, PipelineResponse};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "juris-generator")]
#[command(about = "Generate and publish study media (text, covers, narration)")]
struct CliArgs {
    /// Path to a JSON job file: one job object, or an array of jobs.
    #[arg(value_name = "JOB_FILE")]
    job_file: PathBuf,

    /// Maximum jobs dispatched concurrently.
    #[arg(long, default_value_t = 3)]
    fan_out: usize,

    /// Delay between dispatch waves, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,

    /// Write the JSON response here instead of stdout.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

fn parse_jobs(raw: &str) -> juris_generator::Result<Vec<GenerationJob>> {
    if raw.trim_start().starts_with('[') {
        Ok(serde_json::from_str(raw)?)
    } else {
        Ok(vec![serde_json::from_str(raw)?])
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "juris_generator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let raw = std::fs::read_to_string(&args.job_file)?;
    let single = !raw.trim_start().starts_with('[');
    let jobs = parse_jobs(&raw)?;
    info!("Loaded {} job(s) from {}", jobs.len(), args.job_file.display());

    let config = Config::from_env()?;
    let pipeline = match Pipeline::new(config).await {
        Ok(pipeline) => Arc::new(pipeline),
        Err(e) => {
            error!("Failed to initialize pipeline: {}", e);
            std::process::exit(1);
        }
    };

    let results = pipeline
        .run_batch(jobs, args.fan_out, Duration::from_millis(args.delay_ms))
        .await;

    let responses: Vec<PipelineResponse> = results
        .iter()
        .map(|result| match result {
            Ok(artifact) => PipelineResponse::from_artifact(artifact.clone()),
            Err(e) => {
                error!("Job failed: {}", e);
                PipelineResponse::from_error(e)
            }
        })
        .collect();

    let rendered = if single && responses.len() == 1 {
        serde_json::to_string_pretty(&responses[0])?
    } else {
        serde_json::to_string_pretty(&responses)?
    };
    match &args.output {
        Some(path) => std::fs::write(path, &rendered)?,
        None => println!("{}", rendered),
    }

    if responses.iter().any(|r| !r.success) {
        std::process::exit(1);
    }
    Ok(())
}
