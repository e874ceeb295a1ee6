//! mergeapks - merge split APKs into one universal APK

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use mergeapks::{
    ApkMerger, ExternalTools, MergeConfig, MergeError, MergeProgress, SigningConfig, ToolNames,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Merge several APKs of the same application, split by native libraries,
/// locales or screen densities, into one universal APK.
#[derive(Parser, Debug)]
#[command(name = "mergeapks", version, about, long_about = None)]
struct Cli {
    /// APK files to merge; the first one is the base package
    #[arg(value_name = "APK", allow_hyphen_values = true)]
    apks: Vec<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let rendered = e.to_string();
            let reason = rendered.lines().next().unwrap_or_default();
            usage_error(MergeError::Usage(
                reason.trim_start_matches("error: ").to_string(),
            ))
        }
    };
    let work_dir = std::env::current_dir()?;

    let config = MergeConfig::new(&cli.apks, &work_dir);
    if let Err(e) = config.validate() {
        usage_error(e);
    }

    let signing = SigningConfig::discover(&work_dir);
    if signing.is_none() {
        tracing::debug!("Signing disabled");
    }

    let tools = match ExternalTools::locate(&ToolNames::from_env(), signing.is_some()) {
        Ok(tools) => tools,
        Err(e) => {
            eprintln!("{}", e);
            exit_with(e);
        }
    };

    let merger = ApkMerger::new(config.with_signing(signing), tools)
        .with_progress(MergeProgress::new());
    let output = merger.merge()?;

    println!(
        "Merged {} apks into {} ({} bytes{})",
        output.input_count,
        output.result.display(),
        output.size,
        if output.signed { ", signed" } else { "" }
    );
    Ok(())
}

/// Report a bad command line with the usage text, then exit with `-1`
fn usage_error(error: MergeError) -> ! {
    eprintln!("{}", error.to_string().trim_end());
    if Cli::command().print_help().is_ok() {
        println!();
    }
    exit_with(error);
}

fn exit_with(error: MergeError) -> ! {
    std::process::exit(error.exit_code())
}
