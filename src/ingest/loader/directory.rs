use std::path::{Path, PathBuf};

use futures::{StreamExt, stream, stream::BoxStream};
use tracing::{debug, error, warn};
use walkdir::WalkDir;

use super::CertificateLoader;
use crate::pki::Certificate;

const EXTENSIONS: [&str; 4] = ["cer", "crt", "der", "pem"];

/// Loads one certificate per file from a directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
    source: String,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            source: root.display().to_string(),
            root,
        }
    }
}

impl CertificateLoader for DirectoryLoader {
    fn source(&self) -> &str {
        &self.source
    }

    fn certificates(&self) -> BoxStream<'static, Certificate> {
        let root = self.root.clone();
        stream::once(async move {
            match tokio::task::spawn_blocking(move || read_directory(&root)).await {
                Ok(certificates) => certificates,
                Err(e) => {
                    error!(error = %e, "Directory scan task failed");
                    Vec::new()
                }
            }
        })
        .flat_map(stream::iter)
        .boxed()
    }
}

fn has_certificate_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn read_directory(root: &Path) -> Vec<Certificate> {
    if !root.is_dir() {
        warn!(path = %root.display(), "Certificate directory does not exist");
        return Vec::new();
    }

    let mut certificates = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !has_certificate_extension(path) {
            continue;
        }

        let parsed = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| Certificate::parse(&bytes).map_err(|e| e.to_string()));
        match parsed {
            Ok(certificate) => {
                debug!(path = %path.display(), serial = %certificate.serial_number, "Loaded certificate");
                certificates.push(certificate);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping certificate file"),
        }
    }
    certificates
}
