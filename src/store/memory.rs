use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use std::collections::HashSet;
use std::sync::Arc;

use crate::pki::{Certificate, Crl, CrlUrl};
use crate::store::{CertificateStore, CrlStore, CrlUrlStore, Result};

/// An in-memory certificate store.
///
/// Useful for testing and development.
#[derive(Debug, Default, Clone)]
pub struct MemoryCertificateStore {
    certificates: Arc<DashMap<String, Certificate>>,
    by_subject_key: Arc<DashMap<String, HashSet<String>>>,
}

impl MemoryCertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(&self, certificate: &Certificate) {
        if let Some(key) = &certificate.subject_key {
            self.by_subject_key
                .entry(key.clone())
                .or_default()
                .insert(certificate.serial_number.clone());
        }
    }

    fn unindex(&self, certificate: &Certificate) {
        if let Some(key) = &certificate.subject_key {
            if let Some(mut serials) = self.by_subject_key.get_mut(key) {
                serials.remove(&certificate.serial_number);
            }
        }
    }

    fn delete_where(&self, trusted: bool) -> usize {
        let serials: Vec<String> = self
            .certificates
            .iter()
            .filter(|entry| entry.trusted == trusted)
            .map(|entry| entry.key().clone())
            .collect();
        let mut removed = 0;
        for serial in serials {
            if let Some((_, certificate)) = self.certificates.remove(&serial) {
                self.unindex(&certificate);
                removed += 1;
            }
        }
        removed
    }
}

#[async_trait]
impl CertificateStore for MemoryCertificateStore {
    async fn save_certificate(&self, mut certificate: Certificate) -> Result<()> {
        // The index is maintained while the entry is locked, so concurrent
        // upserts of one serial cannot interleave.
        match self.certificates.entry(certificate.serial_number.clone()) {
            Entry::Occupied(mut entry) => {
                certificate.trusted = entry.get().trusted;
                if entry.get().subject_key != certificate.subject_key {
                    self.unindex(entry.get());
                }
                self.index(&certificate);
                entry.insert(certificate);
            }
            Entry::Vacant(entry) => {
                self.index(&certificate);
                entry.insert(certificate);
            }
        }
        Ok(())
    }

    async fn find_by_subject_key(&self, subject_key: &str) -> Result<Vec<Certificate>> {
        let serials: Vec<String> = match self.by_subject_key.get(subject_key) {
            Some(serials) => serials.iter().cloned().collect(),
            None => return Ok(Vec::new()),
        };
        Ok(serials
            .iter()
            .filter_map(|serial| self.certificates.get(serial).map(|c| c.value().clone()))
            .collect())
    }

    async fn find_by_serial(&self, serial_number: &str) -> Result<Option<Certificate>> {
        Ok(self
            .certificates
            .get(serial_number)
            .map(|c| c.value().clone()))
    }

    async fn delete_all_trusted(&self) -> Result<usize> {
        Ok(self.delete_where(true))
    }

    async fn delete_all_intermediate(&self) -> Result<usize> {
        Ok(self.delete_where(false))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.certificates.len())
    }
}

/// An in-memory CRL store keyed by download URL.
#[derive(Debug, Default, Clone)]
pub struct MemoryCrlStore {
    crls: Arc<DashMap<String, Crl>>,
}

impl MemoryCrlStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CrlStore for MemoryCrlStore {
    async fn save_crl(&self, crl: Crl) -> Result<()> {
        self.crls.insert(crl.url.clone(), crl);
        Ok(())
    }

    async fn get_all_by_issuer_keys(&self, issuer_keys: &[String]) -> Result<Vec<Crl>> {
        Ok(self
            .crls
            .iter()
            .filter(|crl| {
                crl.issuer_key
                    .as_ref()
                    .is_some_and(|key| issuer_keys.contains(key))
            })
            .map(|crl| crl.value().clone())
            .collect())
    }

    async fn get_all_crls(&self) -> Result<Vec<Crl>> {
        Ok(self.crls.iter().map(|crl| crl.value().clone()).collect())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryCrlUrlStore {
    urls: Arc<DashMap<String, CrlUrl>>,
}

impl MemoryCrlUrlStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CrlUrlStore for MemoryCrlUrlStore {
    async fn add_crl_url(&self, url: &str) -> Result<bool> {
        match self.urls.entry(url.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(CrlUrl::new(url));
                Ok(true)
            }
        }
    }

    async fn update_crl_url(
        &self,
        url: &str,
        last_update: DateTime<Utc>,
        next_update: Option<DateTime<Utc>>,
    ) -> Result<()> {
        if let Some(mut entry) = self.urls.get_mut(url) {
            entry.last_update = Some(last_update);
            entry.next_update = next_update;
        }
        Ok(())
    }

    async fn get_all_crl_urls(&self) -> Result<Vec<CrlUrl>> {
        Ok(self.urls.iter().map(|url| url.value().clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, Pki};

    #[tokio::test]
    async fn test_trusted_flag_fixed_at_first_insert() {
        let pki = Pki::new();
        let store = MemoryCertificateStore::new();
        let intermediate = Certificate::from_der(&pki.intermediate.der).unwrap();

        store
            .save_certificate(intermediate.clone().with_trusted(false))
            .await
            .unwrap();
        store
            .save_certificate(intermediate.clone().with_trusted(true))
            .await
            .unwrap();

        let stored = store.find_by_serial("20").await.unwrap().unwrap();
        assert!(!stored.trusted);
        assert_eq!(
            store
                .find_by_subject_key(intermediate.subject_key.as_deref().unwrap())
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_concurrent_rekeying_keeps_index_consistent() {
        let pki = Pki::new();
        let store = MemoryCertificateStore::new();
        let intermediate = Certificate::from_der(&pki.intermediate.der).unwrap();

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..64 {
            let store = store.clone();
            let mut certificate = intermediate.clone();
            certificate.subject_key = Some(format!("key-{}", i % 4));
            tasks.spawn(async move { store.save_certificate(certificate).await });
        }
        while let Some(saved) = tasks.join_next().await {
            saved.unwrap().unwrap();
        }

        let stored = store.find_by_serial("20").await.unwrap().unwrap();
        let current = stored.subject_key.unwrap();
        for i in 0..4 {
            let key = format!("key-{i}");
            let found = store.find_by_subject_key(&key).await.unwrap();
            assert_eq!(found.len(), usize::from(key == current), "index for {key}");
        }
    }

    #[tokio::test]
    async fn test_delete_by_trust_class() {
        let pki = Pki::new();
        let store = MemoryCertificateStore::new();
        let root = Certificate::from_der(&pki.root.der).unwrap();
        store.save_certificate(root.clone().with_trusted(true)).await.unwrap();
        store
            .save_certificate(Certificate::from_der(&pki.intermediate.der).unwrap())
            .await
            .unwrap();
        store
            .save_certificate(Certificate::from_der(&pki.leaf.der).unwrap())
            .await
            .unwrap();

        assert_eq!(store.delete_all_intermediate().await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.delete_all_trusted().await.unwrap(), 1);
        assert!(
            store
                .find_by_subject_key(root.subject_key.as_deref().unwrap())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_crl_upsert_by_url_and_issuer_lookup() {
        let pki = Pki::new();
        let store = MemoryCrlStore::new();
        let url = "http://crl.test/root.crl";
        let first = Crl::from_der(&test_support::crl(&pki.root, &[]), url).unwrap();
        let second = Crl::from_der(&test_support::crl(&pki.root, &[0x20]), url).unwrap();
        let issuer_key = first.issuer_key.clone().unwrap();

        store.save_crl(first).await.unwrap();
        store.save_crl(second).await.unwrap();

        let crls = store.get_all_by_issuer_keys(&[issuer_key]).await.unwrap();
        assert_eq!(crls.len(), 1);
        assert_eq!(crls[0].revoked_count, 1);
        assert!(
            store
                .get_all_by_issuer_keys(&["00".to_string()])
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_crl_urls_are_unique() {
        let store = MemoryCrlUrlStore::new();
        assert!(store.add_crl_url("http://a.test/a.crl").await.unwrap());
        assert!(!store.add_crl_url("http://a.test/a.crl").await.unwrap());

        let now = Utc::now();
        store
            .update_crl_url("http://a.test/a.crl", now, None)
            .await
            .unwrap();
        store
            .update_crl_url("http://unknown.test/x.crl", now, None)
            .await
            .unwrap();

        let urls = store.get_all_crl_urls().await.unwrap();
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].last_update, Some(now));
    }
}
