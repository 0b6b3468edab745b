//! Ingestion of trust store content: certificates, CRL locations and CRLs.

pub mod fetch;
pub mod loader;
pub mod updater;

use thiserror::Error;

pub use fetch::HttpFetcher;
pub use loader::{CertificateLoader, CrlUrlLoader, DirectoryLoader, UrlListLoader, XmlFeedLoader};
pub use updater::{CertificateUpdater, CrlUpdater, CrlUrlUpdater, DataUpdater, UpdateReport};

use crate::pki::ParseError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {0} timed out")]
    Timeout(String),

    #[error("HTTP error {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Empty response body from {0}")]
    EmptyBody(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
