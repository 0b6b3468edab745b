use std::time::Duration;

use reqwest::Client;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

use super::IngestError;
use crate::pki::Crl;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP client shared by the feed loaders and the CRL updater.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    request_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(request_timeout: Duration) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            request_timeout,
        })
    }

    /// Downloads `url`. Non-2xx answers and empty bodies are errors.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, IngestError> {
        let _ = Url::parse(url)?;

        let response = match timeout(self.request_timeout, self.client.get(url).send()).await {
            Ok(result) => result?,
            Err(_) => return Err(IngestError::Timeout(url.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await?.to_vec();
        if body.is_empty() {
            return Err(IngestError::EmptyBody(url.to_string()));
        }
        debug!(url, len = body.len(), "Downloaded");
        Ok(body)
    }

    /// Downloads and decodes the CRL published at `url`.
    pub async fn fetch_crl(&self, url: &str) -> Result<Crl, IngestError> {
        let body = self.get_bytes(url).await?;
        Ok(Crl::parse(&body, url)?)
    }
}
