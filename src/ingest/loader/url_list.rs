use std::path::PathBuf;

use futures::{StreamExt, stream, stream::BoxStream};
use tracing::{error, warn};
use url::Url;

use super::CrlUrlLoader;

/// Reads CRL locations from a text file, one URL per line.
#[derive(Debug, Clone)]
pub struct UrlListLoader {
    path: PathBuf,
    source: String,
}

impl UrlListLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            source: path.display().to_string(),
            path,
        }
    }
}

impl CrlUrlLoader for UrlListLoader {
    fn source(&self) -> &str {
        &self.source
    }

    fn crl_urls(&self) -> BoxStream<'static, String> {
        let path = self.path.clone();
        stream::once(async move {
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => parse_url_list(&text),
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Cannot read CRL URL list");
                    Vec::new()
                }
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }
}

/// Blank lines and `#` comments are ignored, invalid URLs are skipped.
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| match Url::parse(line) {
            Ok(_) => Some(line.to_string()),
            Err(e) => {
                warn!(line, error = %e, "Skipping invalid CRL URL");
                None
            }
        })
        .collect()
}
