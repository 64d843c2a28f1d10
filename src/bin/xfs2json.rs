//! `xfs2json` — convert between MT Framework `XFS` binary containers and
//! their JSON projection, for a single file or a directory of files.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use xfs_codec::convert_path;

/// Convert between XFS binary containers and their JSON projection.
#[derive(Parser, Debug)]
#[command(name = "xfs2json", version, about, long_about = None)]
struct Args {
    /// Path to a file or directory to convert.
    input: PathBuf,

    /// Output file or directory. Defaults to `<input>.json`/`<input>.xfs` for
    /// a single file; must name an existing directory in bulk mode.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if !args.input.exists() {
        eprintln!("error: input path {} does not exist", args.input.display());
        return ExitCode::FAILURE;
    }

    match convert_path(&args.input, args.output.as_deref()) {
        Ok(report) => {
            for (path, err) in &report.failed {
                eprintln!("error converting {}: {}", path.display(), err);
            }
            if report.converted.len() + report.failed.len() > 1 {
                eprintln!("{} converted, {} failed", report.converted.len(), report.failed.len());
            }
            if report.all_succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
