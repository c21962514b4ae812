//! General purpose file/folder merger CLI.
//!
//! Loads a job configuration, hands it to the runner and reports the
//! outcome. Ctrl-C requests cooperative cancellation; the job stops after
//! the step it is currently in.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use console::style;

use gpfm_core::{CancelToken, Error, Job, JobConfig};

/// Exit code when the job was canceled (SIGINT convention).
const EXIT_CODE_CANCELED: u8 = 130;
/// Exit code for configuration and validation failures.
const EXIT_CODE_CONFIG: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "gpfm", version, about = "General purpose file/folder merger")]
struct Cli {
    /// Configuration file for the job
    #[arg(short = 'c', long, value_name = "FILE")]
    config_file: PathBuf,

    /// Directory in which to store the merged output; overrides the
    /// configuration file. WARNING: the directory is deleted when the job
    /// starts.
    #[arg(short = 'o', long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Disable download progress bars
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {error:#}", style("Error:").red().bold());
            ExitCode::from(exit_code_for(&error))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = JobConfig::load(&cli.config_file).with_context(|| {
        format!(
            "Failed to load configuration from '{}'",
            cli.config_file.display()
        )
    })?;

    if let Some(out_dir) = cli.out_dir {
        config.output = out_dir;
    }

    let cancel = CancelToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Cancellation requested, stopping after the current step");
            signal_token.cancel();
        }
    });

    let mut job = Job::new(config)?.with_progress(!cli.quiet);
    job.run(&cancel).await?;

    println!("{} Job completed", style("Done:").green().bold());
    Ok(())
}

fn exit_code_for(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<Error>() {
        Some(e) if e.is_canceled() => EXIT_CODE_CANCELED,
        Some(e) if e.is_config_error() => EXIT_CODE_CONFIG,
        _ => 1,
    }
}
