//! Analysis pipeline, HTTP service and terminal output for Mood Lens

mod analyzer;
mod capability;
mod handwriting;
mod server;
mod ui;


pub use analyzer::{truncate_words, AnalysisOutcome, EmotionAnalyzer, MAX_CLASSIFIER_WORDS};
pub use capability::{load_classifier, load_extractor};
pub use handwriting::{split_into_lines, HandwritingReader, PAGE_SECTIONS};
pub use server::{create_router, serve, AppState, ServerConfig};
pub use ui::{print_download_result, print_download_start, print_predicted_text, print_server_banner};

// Re-export core types
pub use mood_core::{Error, Result};
