use anyhow::{Context, Result};
use clap::Parser;
use sheetsplit::{inspect, locate, logging, pipeline::Pipeline};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "sheetsplit")]
#[command(about = "Split spreadsheet workbooks into per-sheet Parquet files with a raw archive and a JSON manifest")]
struct Args {
    /// Spreadsheet file, or a directory of spreadsheet files
    input: PathBuf,

    /// Root directory for raw_files/, processed_files/ and the log file
    #[arg(short, long, default_value = ".")]
    base_dir: PathBuf,

    /// Read every produced Parquet file back and log its shape
    #[arg(long)]
    verify: bool,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        // The subscriber may not be installed yet when setup itself failed.
        error!("fatal: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    fs::create_dir_all(&args.base_dir).with_context(|| {
        format!("creating base directory `{}`", args.base_dir.display())
    })?;
    logging::init(&args.base_dir.join("processing.log"))?;
    info!("startup");

    let workbooks = locate::discover_workbooks(&args.input)?;
    info!(count = workbooks.len(), "workbooks discovered");

    let pipeline = Pipeline::new(&args.base_dir)?;
    for workbook in &workbooks {
        let manifest = pipeline.process_workbook(workbook)?;
        if args.verify {
            verify_outputs(&manifest.sheets);
        }
    }

    info!("all done");
    Ok(())
}

/// Read each output back and report its shape, mirroring what a downstream
/// loader would see.
fn verify_outputs(sheets: &[sheetsplit::manifest::SheetEntry]) {
    for entry in sheets {
        match inspect::summarize(Path::new(&entry.output_path)) {
            Ok(summary) => {
                info!(
                    sheet = %entry.sheet_name,
                    rows = summary.rows,
                    columns = ?summary.columns,
                    "verified output"
                );
            }
            Err(e) => {
                error!(sheet = %entry.sheet_name, "read-back failed: {:#}", e);
            }
        }
    }
}
