//! Sheetbook binary
//!
//! Converts the spreadsheet in the working directory into a PDF digest.
//! Every flag is optional; a bare `sheetbook` run uses the defaults.

use std::path::PathBuf;

use clap::Parser;
use sheetbook_core::{convert, ConvertOptions, TocNumbering};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "sheetbook")]
#[command(
    version,
    about = "Turn a spreadsheet of HTML posts into a paginated PDF with a table of contents"
)]
struct Args {
    /// Directory scanned for the .xlsx input and receiving the PDF
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Convert this spreadsheet instead of the first .xlsx found in --dir
    #[arg(long)]
    input: Option<PathBuf>,

    /// Font file used for all text
    #[arg(long, default_value = "SimSun.ttf")]
    font: PathBuf,

    /// Title shown above the table of contents
    #[arg(long, default_value = "Table of Contents")]
    toc_title: String,

    /// TOC page numbers: "resolved" (actual pages) or "section-index"
    #[arg(long, default_value = "resolved")]
    toc_numbering: TocNumbering,
}

impl From<Args> for ConvertOptions {
    fn from(args: Args) -> Self {
        ConvertOptions {
            dir: args.dir,
            input: args.input,
            font: args.font,
            toc_title: args.toc_title,
            numbering: args.toc_numbering,
            ..ConvertOptions::default()
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting sheetbook v{}", env!("CARGO_PKG_VERSION"));

    let options = ConvertOptions::from(args);
    let report = convert(&options)?;

    tracing::info!(
        input = %report.input.display(),
        records = report.records,
        pages = report.pages,
        "Done"
    );
    println!("{}", report.output.display());

    Ok(())
}
