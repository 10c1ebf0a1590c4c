use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use stokes_print::PrintDocument;
use stokes_print::resource::FileResourceCache;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stokes-print")]
#[command(about = "Render a laid-out document to a tagged PDF")]
struct Cli {
    /// Document JSON: render config plus one stacking-context tree per page
    input: PathBuf,

    /// Output PDF path
    #[arg(short, long, default_value = "out.pdf")]
    output: PathBuf,

    /// Page width in CSS pixels
    #[arg(long)]
    page_width: Option<f64>,

    /// Page height in CSS pixels
    #[arg(long)]
    page_height: Option<f64>,

    /// PDF points per CSS pixel
    #[arg(long)]
    scale: Option<f64>,

    /// Page background color, "transparent" for none
    #[arg(long)]
    background: Option<String>,

    /// Fallback when no element family matches
    #[arg(long)]
    default_font: Option<String>,

    /// Base directory for relative resource urls (defaults to the input's directory)
    #[arg(long)]
    resource_dir: Option<PathBuf>,

    /// Log paint steps (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "info",
        1 => "info,stokes_print=debug",
        _ => "debug,stokes_print=trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut document = PrintDocument::load(&cli.input)
        .await
        .with_context(|| format!("Failed to load {}", cli.input.display()))?;

    let config = &mut document.config;
    if let Some(width) = cli.page_width {
        config.page_width = width;
    }
    if let Some(height) = cli.page_height {
        config.page_height = height;
    }
    if let Some(scale) = cli.scale {
        config.scale = scale;
    }
    if let Some(background) = cli.background {
        config.background_color = Some(background);
    }
    if let Some(family) = cli.default_font {
        config.default_font_family = family;
    }
    match cli.resource_dir {
        Some(dir) => config.resource_dir = dir,
        None if config.resource_dir.is_relative() => {
            if let Some(parent) = cli.input.parent() {
                config.resource_dir = parent.join(&config.resource_dir);
            }
        }
        None => {}
    }

    tracing::info!(
        "Rendering {} pages at {}x{}",
        document.pages.len(),
        document.config.page_width,
        document.config.page_height
    );
    let resources = FileResourceCache::new(document.config.resource_dir.clone());
    document
        .write_pdf(&resources, &cli.output)
        .await
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;
    tracing::info!("Wrote {}", cli.output.display());
    Ok(())
}
