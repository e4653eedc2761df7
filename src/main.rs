use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chartsight::{
    report, AnalyzerConfig, ChartAnalyzer, ChartImage, ChartRequest, NarratorConfig,
    OcrConfig, OllamaNarrator, TesseractRecognizer, TimeframeHint,
};

#[derive(Parser)]
#[command(name = "chartsight", version, about = "Trading chart screenshot analyzer")]
struct Cli {
    /// Base URL of the Ollama server used for vision narration.
    #[arg(long, default_value = "http://localhost:11434")]
    ollama_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a single chart screenshot.
    Analyze {
        /// Path to the chart image (PNG or JPEG).
        image: PathBuf,

        /// Force the timeframe label instead of scanning the OCR text.
        #[arg(long)]
        timeframe: Option<String>,
    },
    /// Multi-timeframe analysis over three charts of the same asset.
    Mtf {
        /// Daily (1D) chart screenshot.
        #[arg(long)]
        daily: PathBuf,

        /// 4-hour chart screenshot.
        #[arg(long)]
        h4: PathBuf,

        /// 15-minute chart screenshot.
        #[arg(long)]
        m15: PathBuf,
    },
    /// Verify that the external collaborators (tesseract, Ollama) are
    /// available.
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let narrator_config = NarratorConfig {
        base_url: cli.ollama_url.clone(),
        ..NarratorConfig::default()
    };

    match cli.command {
        Command::Analyze { image, timeframe } => {
            let analyzer = build_analyzer(narrator_config);
            let chart = load_chart(&image)?;
            let hint = timeframe
                .map(TimeframeHint::Forced)
                .unwrap_or(TimeframeHint::Auto);
            let analysis = analyzer
                .analyze(vec![ChartRequest {
                    image: chart,
                    timeframe: hint,
                }])
                .await;
            println!("{}", report::render(&analysis));
        }
        Command::Mtf { daily, h4, m15 } => {
            let analyzer = build_analyzer(narrator_config);
            let analysis = analyzer
                .analyze_multi_timeframe(load_chart(&daily)?, load_chart(&h4)?, load_chart(&m15)?)
                .await;
            println!("{}", report::render(&analysis));
        }
        Command::Check => run_check(narrator_config).await?,
    }

    Ok(())
}

fn build_analyzer(narrator_config: NarratorConfig) -> ChartAnalyzer {
    ChartAnalyzer::new(
        AnalyzerConfig::default(),
        Arc::new(TesseractRecognizer::new(OcrConfig::default())),
        Arc::new(OllamaNarrator::new(narrator_config)),
    )
}

fn load_chart(path: &Path) -> Result<ChartImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    ChartImage::from_bytes(bytes)
}

/// Environment probe: reports what is missing and how to fix it, exit code 1
/// when any collaborator is unavailable.
async fn run_check(narrator_config: NarratorConfig) -> Result<()> {
    println!("Checking external collaborators...");
    let mut all_ok = true;

    let recognizer = TesseractRecognizer::new(OcrConfig::default());
    match recognizer.probe() {
        Ok(banner) => println!("  ok: {banner}"),
        Err(err) => {
            all_ok = false;
            println!("  missing: tesseract ({err:#})");
            println!("    Linux: sudo apt-get install tesseract-ocr");
            println!("    macOS: brew install tesseract");
        }
    }

    let narrator = OllamaNarrator::new(narrator_config);
    match narrator.list_models().await {
        Ok(models) if models.is_empty() => {
            all_ok = false;
            println!("  warning: Ollama is reachable but no models are pulled");
            println!("    run: ollama pull llava:7b");
        }
        Ok(models) => println!("  ok: Ollama models: {}", models.join(", ")),
        Err(err) => {
            all_ok = false;
            println!("  missing: Ollama server ({err:#})");
            println!("    install from ollama.com, then run: ollama pull llava:7b");
        }
    }

    if !all_ok {
        std::process::exit(1);
    }
    println!("All collaborators available.");
    Ok(())
}
