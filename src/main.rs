//! # Cardpress CLI
//!
//! Command-line interface for card rendering and sheet composition.
//!
//! ## Usage
//!
//! ```bash
//! # Render one card to PNG
//! cardpress render --template id_card.json --record ada.json --out card.png
//!
//! # Compose a batch of records into an A4 PDF, proof layout
//! cardpress compose --template id_card.json --records class.json \
//!     --mode proof --footer "Class of 2026" --out sheets.pdf
//!
//! # Production sheets with a watermark image
//! cardpress compose --template id_card.json --records class.json \
//!     --mode production --watermark crest.png --out sheets.pdf
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cardpress::batch::{BatchOptions, CardStatus, compose_batch};
use cardpress::compose::pdf::write_pdf;
use cardpress::error::EngineError;
use cardpress::layout::{LayoutMode, PageSpec};
use cardpress::render::{RenderContext, render_card};
use cardpress::template::{Record, Template, resolve::resolve};

/// Cardpress - card template rendering and print sheet layout
#[derive(Parser, Debug)]
#[command(name = "cardpress")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a single card to a PNG file
    Render {
        /// Template JSON file
        #[arg(long)]
        template: PathBuf,

        /// Record JSON file (flat field map)
        #[arg(long)]
        record: PathBuf,

        /// Output width in pixels
        #[arg(long, default_value = "1011")]
        width: u32,

        /// Output height in pixels
        #[arg(long, default_value = "638")]
        height: u32,

        /// Output PNG path
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },

    /// Compose a batch of records into a multi-page PDF
    Compose {
        /// Template JSON file
        #[arg(long)]
        template: PathBuf,

        /// Records JSON file (array of flat field maps)
        #[arg(long)]
        records: PathBuf,

        /// Layout mode: "proof" or "production"
        #[arg(long, default_value = "production")]
        mode: String,

        /// Working raster density in dots per inch
        #[arg(long, default_value = "300")]
        dpi: f32,

        /// Watermark image (URL or file path), tiled over every page
        #[arg(long)]
        watermark: Option<String>,

        /// Footer caption drawn on every page
        #[arg(long)]
        footer: Option<String>,

        /// Output PDF path
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), EngineError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            template,
            record,
            width,
            height,
            out,
        } => {
            let template = Template::from_json(&std::fs::read_to_string(template)?)?;
            let record: Record = serde_json::from_str(&std::fs::read_to_string(record)?)
                .map_err(|e| EngineError::InvalidInput(format!("record JSON: {e}")))?;

            let ctx = RenderContext::new();
            let resolved = resolve(&template, &record);
            let output = render_card(&resolved, &record, width, height, &ctx).await?;
            for warning in &output.warnings {
                eprintln!("warning: {warning}");
            }
            std::fs::write(&out, output.card.png_bytes()?)?;
            println!("Wrote {}x{} card to {}", width, height, out.display());
        }

        Commands::Compose {
            template,
            records,
            mode,
            dpi,
            watermark,
            footer,
            out,
        } => {
            let template = Template::from_json(&std::fs::read_to_string(template)?)?;
            let records: Vec<Record> = serde_json::from_str(&std::fs::read_to_string(records)?)
                .map_err(|e| EngineError::InvalidInput(format!("records JSON: {e}")))?;
            let mode = match mode.as_str() {
                "proof" => LayoutMode::Proof,
                "production" => LayoutMode::Production,
                other => {
                    return Err(EngineError::InvalidInput(format!(
                        "unknown mode {other:?}, expected \"proof\" or \"production\""
                    )));
                }
            };

            let mut options = BatchOptions::with_page(mode, PageSpec::a4(dpi));
            options.watermark_ref = watermark;
            options.footer_text = footer;

            let ctx = RenderContext::new();
            let result = match compose_batch(&template, &records, &options, &ctx).await {
                Ok(result) => result,
                // Show why every card was skipped before failing.
                Err(EngineError::NoRenderableCards { outcomes }) => {
                    for outcome in &outcomes {
                        if let CardStatus::Skipped(reason) = &outcome.status {
                            println!("  [skip] {}: {}", outcome.label, reason);
                        }
                    }
                    return Err(EngineError::NoRenderableCards { outcomes });
                }
                Err(e) => return Err(e),
            };

            for outcome in &result.report.outcomes {
                match &outcome.status {
                    CardStatus::Rendered => println!("  [ok]   {}", outcome.label),
                    CardStatus::Skipped(reason) => {
                        println!("  [skip] {}: {}", outcome.label, reason)
                    }
                }
                for warning in &outcome.warnings {
                    println!("         warning: {warning}");
                }
            }
            for warning in &result.report.warnings {
                println!("warning: {warning}");
            }

            std::fs::write(&out, write_pdf(&result.document, dpi)?)?;
            println!(
                "Wrote {} page(s), {} of {} cards, to {}",
                result.report.pages,
                result.report.rendered_count(),
                result.report.outcomes.len(),
                out.display()
            );
            if !result.report.success() {
                std::process::exit(2);
            }
        }
    }

    Ok(())
}
