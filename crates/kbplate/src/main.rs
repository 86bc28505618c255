use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use kbplate::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about = "Generate keyboard plate cutouts from layout requests", long_about = None)]
struct Args {
    /// Build request JSON files
    #[arg(required = true)]
    requests: Vec<PathBuf>,

    /// Configuration file path (defaults to ~/.kbplate/config.json)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Directory to write exports to
    #[arg(short = 'o', long = "export-dir")]
    export_dir: Option<PathBuf>,

    /// Comma separated export formats, e.g. dxf,svg,json
    #[arg(short = 'f', long = "formats", value_delimiter = ',')]
    formats: Option<Vec<ExportFormat>>,
}

struct Job {
    path: PathBuf,
    id: String,
    request: BuildRequest,
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_job(path: &Path) -> Result<Job> {
    let data = fs::read(path).with_context(|| format!("read request {}", path.display()))?;
    let value: Value = serde_json::from_slice(&data)
        .with_context(|| format!("parse request {}", path.display()))?;
    let id = request_id(&value);
    let request = BuildRequest::from_value(value)
        .with_context(|| format!("deserialize request {}", path.display()))?;
    Ok(Job {
        path: path.to_path_buf(),
        id,
        request,
    })
}

/// Load every request. Unreadable ones become error entries for the report.
fn load_jobs(paths: &[PathBuf]) -> (Vec<Job>, Vec<Value>) {
    let mut jobs = Vec::with_capacity(paths.len());
    let mut failed = Vec::new();
    for path in paths {
        match load_job(path) {
            Ok(job) => jobs.push(job),
            Err(err) => {
                error!("Skipping {}: {err:#}", path.display());
                failed.push(json!({
                    "request": path.display().to_string(),
                    "error": format!("{err:#}"),
                }));
            }
        }
    }
    (jobs, failed)
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => BuilderConfig::default_config_path()?,
    };
    let mut config = BuilderConfig::load_from_path(&config_path)?;
    if let Some(dir) = args.export_dir {
        config.export_dir = dir;
    }
    if let Some(formats) = args.formats {
        config.formats = formats;
    }

    let (jobs, mut report) = load_jobs(&args.requests);
    let mut failures = report.len();
    info!("Building {} plate(s) into {}", jobs.len(), config.export_dir.display());

    // Builds share nothing but the export directory.
    let outcomes: Vec<Result<BuildResult>> = thread::scope(|scope| {
        let handles: Vec<_> = jobs
            .iter()
            .map(|job| {
                let config = &config;
                scope.spawn(move || build(&job.id, &job.request, config))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .map_err(|_| anyhow!("build thread panicked"))
                    .and_then(|built| built.map_err(anyhow::Error::from))
            })
            .collect()
    });

    for (job, outcome) in jobs.iter().zip(outcomes) {
        match outcome {
            Ok(result) => report.push(json!({
                "request": job.path.display().to_string(),
                "id": job.id,
                "result": result,
            })),
            Err(err) => {
                error!("Build of {} failed: {err:#}", job.path.display());
                failures += 1;
                report.push(json!({
                    "request": job.path.display().to_string(),
                    "id": job.id,
                    "error": format!("{err:#}"),
                }));
            }
        }
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialize build report")?
    );
    if failures > 0 {
        bail!("{failures} build(s) failed");
    }
    Ok(())
}
