use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mood_cli::{
    load_classifier, load_extractor, print_download_result, print_download_start,
    print_predicted_text, print_server_banner, serve, AnalysisOutcome, AppState,
    EmotionAnalyzer, HandwritingReader, ServerConfig,
};
use mood_core::Error;
use mood_hf::{HfConfig, HfEmotionClassifier, HfTextExtractor, ModelDownloader};

#[derive(Parser)]
#[command(name = "mood-lens")]
#[command(about = "Emotion-based mental health scoring for free text and handwriting", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Text to analyze; prints a JSON report
    text: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Mirror model repositories into the local models directory
    Download {
        /// Model ids (defaults to the configured OCR and emotion models)
        models: Vec<String>,
    },
    /// Read handwritten text from an image
    Extract {
        image: PathBuf,

        /// Number of horizontal strips to read separately
        #[arg(short, long, default_value_t = 1)]
        sections: u32,
    },
    /// Run the HTTP backend
    Serve {
        /// Bind address (defaults to MOOD_LENS_ADDR or 127.0.0.1:5000)
        #[arg(short, long)]
        addr: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match (cli.command, cli.text) {
        (Some(Commands::Download { models }), _) => download(models).await,
        (Some(Commands::Extract { image, sections }), _) => extract(image, sections).await,
        (Some(Commands::Serve { addr }), _) => run_server(addr).await,
        (None, Some(text)) => analyze(&text).await,
        (None, None) => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

/// Analyze one text and print the report (or an error object) as JSON
async fn analyze(text: &str) -> Result<()> {
    let outcome = match HfConfig::from_env() {
        Ok(config) => {
            let classifier = load_classifier(HfEmotionClassifier::new(config)).await;
            let analyzer = EmotionAnalyzer::from_capability(classifier);
            AnalysisOutcome::from(analyzer.analyze(text).await)
        }
        Err(e) => AnalysisOutcome::from(e),
    };

    debug!(error = outcome.is_error(), "analysis finished");
    println!("{}", outcome.to_json());
    Ok(())
}

async fn download(models: Vec<String>) -> Result<()> {
    let downloader = ModelDownloader::from_env()?;
    let models = if models.is_empty() {
        downloader.default_models()
    } else {
        models
    };

    println!("Models directory: {}", downloader.models_dir().display());
    for model_id in &models {
        print_download_start(model_id);
        let result = downloader.download(model_id).await;
        print_download_result(model_id, &result);
    }
    Ok(())
}

async fn extract(image: PathBuf, sections: u32) -> Result<()> {
    let bytes = tokio::fs::read(&image).await?;

    let Some(extractor) = load_extractor(HfTextExtractor::from_env()).await else {
        println!("{} Text extractor is not available", "❌".red());
        return Err(Error::Extractor("text extractor is not available".to_string()).into());
    };

    let text = HandwritingReader::new(sections).read(&extractor, &bytes).await?;
    print_predicted_text(&text);
    Ok(())
}

async fn run_server(addr: Option<String>) -> Result<()> {
    let config = HfConfig::from_env()?;
    let mut server_config = ServerConfig::from_env();
    if let Some(addr) = addr {
        server_config.addr = addr;
    }

    let classifier = load_classifier(HfEmotionClassifier::new(config.clone())).await;
    let extractor = load_extractor(HfTextExtractor::new(config)).await;

    print_server_banner(&server_config.addr, classifier.is_some(), extractor.is_some());

    let state = AppState::new(EmotionAnalyzer::from_capability(classifier), extractor);
    serve(Arc::new(state), &server_config).await?;
    Ok(())
}
