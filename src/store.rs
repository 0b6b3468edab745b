//! Storage contracts for certificates, CRLs and CRL locations.

use ::redis::RedisError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use color_eyre::Report;
use futures::{StreamExt, TryStreamExt, stream::BoxStream};
use std::collections::HashSet;
use std::error::Error as StdError;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

use crate::pki::{Certificate, Crl, CrlUrl, path::MAX_PATH_DEPTH};

mod memory;
mod redis;

pub use memory::{MemoryCertificateStore, MemoryCrlStore, MemoryCrlUrlStore};
pub use redis::{RedisCertificateStore, RedisCrlStore, RedisCrlUrlStore};

pub type Result<T> = std::result::Result<T, StoreError>;

/// Upserts in flight at once while draining a certificate stream.
const SAVE_CONCURRENCY: usize = 16;

/// Error type for store operations.
#[derive(Debug)]
pub struct StoreError {
    error: Report,
}

impl StoreError {
    pub fn new<T>(error: T) -> Self
    where
        T: StdError + Send + Sync + 'static,
    {
        Self {
            error: Report::new(error),
        }
    }

    pub fn msg<T>(message: T) -> Self
    where
        T: fmt::Debug + fmt::Display + Send + Sync + 'static,
    {
        Self {
            error: Report::msg(message),
        }
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.error.source()
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl From<RedisError> for StoreError {
    fn from(error: RedisError) -> Self {
        Self {
            error: Report::new(error),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        Self {
            error: Report::new(error),
        }
    }
}

/// Certificates keyed by serial number and indexed by subject key.
#[async_trait]
pub trait CertificateStore: Send + Sync + 'static {
    /// Inserts or replaces the certificate with the same serial number.
    ///
    /// Every field is replaced except `trusted`, which keeps the value it was
    /// given when the serial number was first stored.
    async fn save_certificate(&self, certificate: Certificate) -> Result<()>;

    async fn find_by_subject_key(&self, subject_key: &str) -> Result<Vec<Certificate>>;

    async fn find_by_serial(&self, serial_number: &str) -> Result<Option<Certificate>>;

    /// Removes every certificate flagged trusted.
    async fn delete_all_trusted(&self) -> Result<usize>;

    /// Removes every certificate not flagged trusted.
    async fn delete_all_intermediate(&self) -> Result<usize>;

    async fn count(&self) -> Result<usize>;

    /// Walks issuer links upwards from the certificates whose subject key is
    /// `subject_key`. Every certificate reached is returned once; an unknown
    /// key yields an empty chain.
    async fn get_certificate_chain_for_leaf_key(
        &self,
        subject_key: &str,
    ) -> Result<Vec<Certificate>> {
        let mut chain: Vec<Certificate> = Vec::new();
        let mut serials = HashSet::new();
        let mut visited = HashSet::new();
        let mut pending = vec![subject_key.to_string()];

        for _ in 0..=MAX_PATH_DEPTH {
            let mut next = Vec::new();
            for key in pending.drain(..) {
                if !visited.insert(key.clone()) {
                    continue;
                }
                for certificate in self.find_by_subject_key(&key).await? {
                    if !serials.insert(certificate.serial_number.clone()) {
                        continue;
                    }
                    if !certificate.is_self_signed() {
                        if let Some(parent) = &certificate.issuer_key {
                            next.push(parent.clone());
                        }
                    }
                    chain.push(certificate);
                }
            }
            if next.is_empty() {
                return Ok(chain);
            }
            pending = next;
        }

        warn!(subject_key, "Chain walk stopped at the depth limit");
        Ok(chain)
    }

    /// Drains `certificates` into the store with bounded concurrency and
    /// returns how many were saved. The first store failure aborts the drain.
    async fn save_all_certificates(
        &self,
        certificates: BoxStream<'_, Certificate>,
    ) -> Result<usize> {
        let saved = AtomicUsize::new(0);
        certificates
            .map(Ok)
            .try_for_each_concurrent(SAVE_CONCURRENCY, |certificate| {
                let saved = &saved;
                async move {
                    debug!(serial = %certificate.serial_number, "Saving certificate");
                    self.save_certificate(certificate).await?;
                    saved.fetch_add(1, Ordering::Relaxed);
                    Ok::<_, StoreError>(())
                }
            })
            .await?;
        Ok(saved.into_inner())
    }
}

/// Revocation lists keyed by the URL they were downloaded from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrlStore: Send + Sync + 'static {
    /// Replaces whatever was stored for `crl.url`.
    async fn save_crl(&self, crl: Crl) -> Result<()>;

    /// Every CRL whose issuer key is one of `issuer_keys`.
    async fn get_all_by_issuer_keys(&self, issuer_keys: &[String]) -> Result<Vec<Crl>>;

    async fn get_all_crls(&self) -> Result<Vec<Crl>>;
}

/// Known CRL locations with their download bookkeeping.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrlUrlStore: Send + Sync + 'static {
    /// Registers `url` unless it is already known. Returns whether it was new.
    async fn add_crl_url(&self, url: &str) -> Result<bool>;

    /// Records a successful download. Unknown URLs are left alone.
    async fn update_crl_url(
        &self,
        url: &str,
        last_update: DateTime<Utc>,
        next_update: Option<DateTime<Utc>>,
    ) -> Result<()>;

    async fn get_all_crl_urls(&self) -> Result<Vec<CrlUrl>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Pki;
    use futures::stream;

    fn certificate(der: &[u8], trusted: bool) -> Certificate {
        Certificate::from_der(der).unwrap().with_trusted(trusted)
    }

    #[tokio::test]
    async fn test_chain_walk_follows_issuer_keys() {
        let pki = Pki::new();
        let store = MemoryCertificateStore::default();
        let root = certificate(&pki.root.der, true);
        let intermediate = certificate(&pki.intermediate.der, false);
        let leaf = certificate(&pki.leaf.der, false);
        for cert in [root.clone(), intermediate.clone(), leaf.clone()] {
            store.save_certificate(cert).await.unwrap();
        }

        let chain = store
            .get_certificate_chain_for_leaf_key(leaf.issuer_key.as_deref().unwrap())
            .await
            .unwrap();
        let serials: Vec<_> = chain.iter().map(|c| c.serial_number.as_str()).collect();
        assert_eq!(serials, vec!["20", "10"]);
    }

    #[tokio::test]
    async fn test_self_signed_root_is_its_own_chain() {
        let pki = Pki::new();
        let store = MemoryCertificateStore::default();
        let root = certificate(&pki.root.der, true);
        store.save_certificate(root.clone()).await.unwrap();

        let chain = store
            .get_certificate_chain_for_leaf_key(root.subject_key.as_deref().unwrap())
            .await
            .unwrap();
        assert_eq!(chain, vec![root]);
    }

    #[tokio::test]
    async fn test_unknown_key_yields_empty_chain() {
        let store = MemoryCertificateStore::default();
        let chain = store
            .get_certificate_chain_for_leaf_key("deadbeef")
            .await
            .unwrap();
        assert!(chain.is_empty());
    }

    #[tokio::test]
    async fn test_save_all_counts_and_keeps_first_trust_flag() {
        let pki = Pki::new();
        let store = MemoryCertificateStore::default();
        let first = stream::iter(vec![
            certificate(&pki.root.der, true),
            certificate(&pki.intermediate.der, false),
        ])
        .boxed();
        assert_eq!(store.save_all_certificates(first).await.unwrap(), 2);

        let again = stream::iter(vec![certificate(&pki.root.der, false)]).boxed();
        assert_eq!(store.save_all_certificates(again).await.unwrap(), 1);

        let root = store.find_by_serial("10").await.unwrap().unwrap();
        assert!(root.trusted);
        assert_eq!(store.count().await.unwrap(), 2);
    }
}
