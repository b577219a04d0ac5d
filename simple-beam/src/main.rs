use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use simple_beam::config::ENV_OUTPUT_DIR;
use simple_beam::{Pipeline, PipelineConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simple_beam=info,fea_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let output_dir = output_dir()?;
    let report = Pipeline::connect(PipelineConfig::from_env(output_dir))?.run()?;

    for (_, records) in &report.extraction.reactions {
        for record in records {
            println!("{}", record);
        }
    }
    for (_, records) in &report.extraction.forces {
        for record in records {
            println!("{}", record);
        }
    }
    for missing in &report.extraction.no_results {
        println!("{}", missing);
    }
    println!("Results written to {}", report.results_path.display());
    Ok(())
}

/// First argument, then the environment, then one prompt
fn output_dir() -> anyhow::Result<PathBuf> {
    if let Some(arg) = std::env::args().nth(1) {
        return Ok(PathBuf::from(arg));
    }
    if let Ok(dir) = std::env::var(ENV_OUTPUT_DIR) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir.trim()));
        }
    }

    print!("Output directory: ");
    io::stdout().flush().context("cannot write the prompt")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("cannot read the output directory")?;
    let dir = line.trim();
    if dir.is_empty() {
        bail!("no output directory given");
    }
    Ok(PathBuf::from(dir))
}
