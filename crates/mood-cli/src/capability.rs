//! Startup loading of the model-backed capabilities
//!
//! Construction or connection failures are logged and yield `None`; the rest
//! of the program branches on that instead of failing.

use tracing::{info, warn};

use mood_core::{EmotionClassifier, Result, TextExtractor};

/// Connect an emotion classifier, or log why it is unavailable
pub async fn load_classifier<C: EmotionClassifier>(built: Result<C>) -> Option<C> {
    let mut classifier = match built {
        Ok(classifier) => classifier,
        Err(e) => {
            warn!(error = %e, "could not create emotion classifier, scores will use the fallback distribution");
            return None;
        }
    };

    match classifier.connect().await {
        Ok(()) => {
            info!(model = classifier.model_id(), "emotion classifier loaded");
            Some(classifier)
        }
        Err(e) => {
            warn!(error = %e, model = classifier.model_id(), "error loading emotion classifier, scores will use the fallback distribution");
            None
        }
    }
}

/// Connect a text extractor, or log why it is unavailable
pub async fn load_extractor<E: TextExtractor>(built: Result<E>) -> Option<E> {
    let mut extractor = match built {
        Ok(extractor) => extractor,
        Err(e) => {
            warn!(error = %e, "could not create text extractor");
            return None;
        }
    };

    match extractor.connect().await {
        Ok(()) => {
            info!(model = extractor.model_id(), "text extractor loaded");
            Some(extractor)
        }
        Err(e) => {
            warn!(error = %e, model = extractor.model_id(), "error loading text extractor");
            None
        }
    }
}
