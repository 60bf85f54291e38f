//! Model snapshot downloads from the Hugging Face hub
//!
//! Models are mirrored into `{models_dir}/models--{org}--{name}/`, the same
//! directory naming the hub cache uses, so the files can be loaded by other
//! tooling straight from the models directory.

use futures::StreamExt;
use regex::Regex;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use mood_core::{Error, Result};

use crate::client::{api_error, request_error};
use crate::config::HfConfig;

/// Weight formats for frameworks other than PyTorch are not mirrored
const SKIPPED_EXTENSIONS: [&str; 4] = ["h5", "msgpack", "ot", "onnx"];

/// Outcome of mirroring one model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadSummary {
    pub model_id: String,
    pub directory: PathBuf,
    pub downloaded: usize,
    pub skipped: usize,
}

#[derive(Deserialize)]
struct ModelInfo {
    #[serde(default)]
    siblings: Vec<Sibling>,
}

#[derive(Deserialize)]
struct Sibling {
    rfilename: String,
}

/// Downloads model repositories into a local directory
pub struct ModelDownloader {
    config: HfConfig,
    client: Client,
}

fn model_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*/[A-Za-z0-9][A-Za-z0-9_.-]*$")
            .expect("model id pattern is valid")
    })
}

/// Check that a model id has the `org/name` shape and cannot escape the models directory
pub fn validate_model_id(model_id: &str) -> Result<()> {
    if !model_id_pattern().is_match(model_id) || model_id.contains("..") {
        return Err(Error::InvalidInput(format!(
            "Model id '{}' must look like 'organization/name'",
            model_id
        )));
    }
    Ok(())
}

/// `{models_dir}/models--{org}--{name}`
pub fn model_directory(models_dir: &Path, model_id: &str) -> PathBuf {
    models_dir.join(format!("models--{}", model_id.replace('/', "--")))
}

/// Resolve a repository file name to a path below `directory`
fn resolve_repo_file(directory: &Path, file: &str) -> Result<PathBuf> {
    let relative = Path::new(file);
    let safe = !file.is_empty()
        && !file.contains('\\')
        && relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

    if !safe {
        return Err(Error::Download(format!("Refusing unsafe repository file name '{}'", file)));
    }
    Ok(directory.join(relative))
}

fn is_skipped(file: &str) -> bool {
    Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SKIPPED_EXTENSIONS.contains(&ext))
}

impl ModelDownloader {
    pub fn new(config: HfConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn from_env() -> Result<Self> {
        let config = HfConfig::from_env()?;
        Self::new(config)
    }

    /// The models mirrored when no explicit list is given
    pub fn default_models(&self) -> Vec<String> {
        vec![self.config.ocr_model.clone(), self.config.emotion_model.clone()]
    }

    pub fn models_dir(&self) -> &Path {
        &self.config.models_dir
    }

    /// List the files in a model repository
    pub async fn list_files(&self, model_id: &str) -> Result<Vec<String>> {
        validate_model_id(model_id)?;
        let url = self.config.model_info_endpoint(model_id);

        let response = self
            .config
            .authorize(self.client.get(&url))
            .timeout(self.config.timeout())
            .send()
            .await
            .map_err(request_error)?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(Error::Download(format!("Model {} was not found on the hub", model_id)));
            }
            _ => return Err(api_error(response, Error::Download).await),
        }

        let info: ModelInfo = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        Ok(info.siblings.into_iter().map(|sibling| sibling.rfilename).collect())
    }

    /// Mirror every file of `model_id`, skipping files that already exist locally
    pub async fn download(&self, model_id: &str) -> Result<DownloadSummary> {
        let directory = model_directory(&self.config.models_dir, model_id);
        let files = self.list_files(model_id).await?;

        let mut summary = DownloadSummary {
            model_id: model_id.to_string(),
            directory: directory.clone(),
            downloaded: 0,
            skipped: 0,
        };

        for file in files {
            if is_skipped(&file) {
                debug!(model = model_id, file = %file, "skipping non-PyTorch weights");
                continue;
            }

            let dest = resolve_repo_file(&directory, &file)?;
            if fs::try_exists(&dest).await? {
                summary.skipped += 1;
                continue;
            }

            let url = self.config.file_endpoint(model_id, &file);
            self.download_file(&url, &dest).await?;
            info!(model = model_id, file = %file, "downloaded");
            summary.downloaded += 1;
        }

        Ok(summary)
    }

    /// Stream `url` into `dest` through a temporary `.download` file.
    ///
    /// The configured timeout bounds the wait for the response headers and for
    /// each body chunk, not the whole transfer. A failed transfer removes the
    /// temporary file.
    async fn download_file(&self, url: &str, dest: &Path) -> Result<()> {
        let response = timeout(self.config.timeout(), self.config.authorize(self.client.get(url)).send())
            .await
            .map_err(|_| Error::Timeout(format!("No response from {}", url)))?
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(Error::Download(format!(
                "Failed to download {} (status {})",
                url,
                response.status()
            )));
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut temp_name = dest.as_os_str().to_owned();
        temp_name.push(".download");
        let temp_path = PathBuf::from(temp_name);

        if let Err(e) = self.write_body(response, url, &temp_path).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                warn!(file = %temp_path.display(), error = %cleanup, "could not remove partial download");
            }
            return Err(e);
        }

        fs::rename(&temp_path, dest).await?;
        Ok(())
    }

    async fn write_body(&self, response: Response, url: &str, path: &Path) -> Result<()> {
        let mut file = fs::File::create(path).await?;
        let mut stream = response.bytes_stream();

        loop {
            let next = timeout(self.config.timeout(), stream.next())
                .await
                .map_err(|_| Error::Timeout(format!("Download of {} stalled", url)))?;
            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk.map_err(|e| Error::Network(format!("Failed to download {}: {}", url, e)))?;
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        Ok(())
    }
}
