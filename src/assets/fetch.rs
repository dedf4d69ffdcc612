use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::foundation::error::{MontageError, MontageResult};

/// Reference to one source image.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(from = "String")]
pub enum ImageSource {
    /// Remote `http://` or `https://` URL.
    Url(String),
    /// Local filesystem path.
    Path(PathBuf),
}

impl ImageSource {
    /// Classify a caller-provided reference string.
    ///
    /// `file://` prefixes are stripped and treated as local paths.
    pub fn parse(reference: &str) -> Self {
        let trimmed = reference.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Self::Url(trimmed.to_owned());
        }
        match trimmed.strip_prefix("file://") {
            Some(rest) => Self::Path(PathBuf::from(rest)),
            None => Self::Path(PathBuf::from(trimmed)),
        }
    }

    /// Human-readable reference used in logs and errors.
    pub fn display_ref(&self) -> String {
        match self {
            Self::Url(u) => u.clone(),
            Self::Path(p) => p.display().to_string(),
        }
    }
}

impl From<&str> for ImageSource {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for ImageSource {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl serde::Serialize for ImageSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Url(url) => serializer.serialize_str(url),
            // Non-UTF-8 paths are an error, never a lossy rewrite.
            Self::Path(path) => serde::Serialize::serialize(path, serializer),
        }
    }
}

/// Raw encoded bytes of one source image.
#[derive(Clone, Debug)]
pub struct FetchedImage {
    /// Position of this image in the caller's ordered list.
    pub index: usize,
    /// Source reference as given by the caller.
    pub source_ref: String,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

/// Fetches source images, staging remote downloads inside a job scratch directory.
pub struct ImageFetcher {
    client: reqwest::blocking::Client,
    staging_dir: PathBuf,
    max_bytes: u64,
}

impl ImageFetcher {
    /// Upper bound on a single source image's size.
    pub const DEFAULT_MAX_BYTES: u64 = 64 * 1024 * 1024;

    /// Create a fetcher that stages downloads in `staging_dir`.
    pub fn new(staging_dir: impl Into<PathBuf>, timeout: Duration) -> MontageResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MontageError::validation(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            staging_dir: staging_dir.into(),
            max_bytes: Self::DEFAULT_MAX_BYTES,
        })
    }

    /// Override the per-image size limit.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Fetch one image. Failures are per-item [`MontageError::Fetch`] values.
    #[tracing::instrument(skip(self, source), fields(source = %source.display_ref()))]
    pub fn fetch(&self, index: usize, source: &ImageSource) -> MontageResult<FetchedImage> {
        let source_ref = source.display_ref();
        let bytes = match source {
            ImageSource::Url(url) => {
                let staged = self.staging_dir.join(format!("image_{index}.download"));
                self.download_to(url, &staged)?;
                read_local(&staged, self.max_bytes)
                    .map_err(|e| MontageError::fetch(url, format!("staged download: {e}")))?
            }
            ImageSource::Path(path) => read_local(path, self.max_bytes)?,
        };

        if bytes.is_empty() {
            return Err(MontageError::fetch(&source_ref, "source is empty"));
        }
        tracing::debug!(index, bytes = bytes.len(), "fetched image");
        Ok(FetchedImage {
            index,
            source_ref,
            bytes,
        })
    }

    /// Stream the response body for `url` into `staged`, enforcing the size limit.
    fn download_to(&self, url: &str, staged: &Path) -> MontageResult<()> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| MontageError::fetch(url, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MontageError::fetch(url, format!("HTTP {status}")));
        }
        if let Some(len) = response.content_length()
            && len > self.max_bytes
        {
            return Err(MontageError::fetch(
                url,
                format!("response of {len} bytes exceeds limit of {}", self.max_bytes),
            ));
        }

        let mut file = std::fs::File::create(staged).map_err(|e| {
            MontageError::fetch(
                url,
                format!("failed to stage download at '{}': {e}", staged.display()),
            )
        })?;
        let copied = std::io::copy(&mut response.take(self.max_bytes + 1), &mut file);
        drop(file);
        let err = match copied {
            Ok(n) if n <= self.max_bytes => return Ok(()),
            Ok(_) => MontageError::fetch(
                url,
                format!("response exceeds limit of {} bytes", self.max_bytes),
            ),
            Err(e) => MontageError::fetch(url, format!("failed to read response: {e}")),
        };
        let _ = std::fs::remove_file(staged);
        Err(err)
    }
}

fn read_local(path: &Path, max_bytes: u64) -> MontageResult<Vec<u8>> {
    let source_ref = path.display().to_string();
    let meta = std::fs::metadata(path)
        .map_err(|e| MontageError::fetch(&source_ref, format!("cannot stat file: {e}")))?;
    if !meta.is_file() {
        return Err(MontageError::fetch(&source_ref, "not a regular file"));
    }
    if meta.len() > max_bytes {
        return Err(MontageError::fetch(
            &source_ref,
            format!("file of {} bytes exceeds limit of {max_bytes}", meta.len()),
        ));
    }
    std::fs::read(path).map_err(|e| MontageError::fetch(&source_ref, format!("read failed: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fetch.rs"]
mod tests;
