//! Terminal output for the interactive commands

use colored::*;

use mood_core::Result;
use mood_hf::DownloadSummary;

pub fn print_download_start(model_id: &str) {
    println!("{} Downloading {}...", "⬇️".blue(), model_id.bold());
}

/// One status line per model; failures do not stop the remaining downloads
pub fn print_download_result(model_id: &str, result: &Result<DownloadSummary>) {
    match result {
        Ok(summary) => {
            println!(
                "{} {} ready in {} ({} downloaded, {} already present)",
                "✅".green(),
                model_id,
                summary.directory.display(),
                summary.downloaded,
                summary.skipped
            );
        }
        Err(e) => {
            println!("{} Error downloading {}: {}", "❌".red(), model_id, e);
        }
    }
}

pub fn print_predicted_text(text: &str) {
    println!("Predicted text: {}", text);
}

pub fn print_server_banner(addr: &str, classifier_ready: bool, extractor_ready: bool) {
    println!("{} mood-lens backend on {}", "🚀".yellow(), format!("http://{}", addr).bold());
    let status = |ready: bool| if ready { "ready".green() } else { "unavailable".yellow() };
    println!("  {} emotion classifier: {}", "•".blue(), status(classifier_ready));
    println!("  {} text extractor:     {}", "•".blue(), status(extractor_ready));
}
