use std::sync::Arc;

use color_eyre::eyre::Context;

use crate::config::{Config, IngestConfig};
use crate::ingest::{
    CertificateUpdater, CrlUpdater, CrlUrlUpdater, DataUpdater, DirectoryLoader, HttpFetcher,
    UrlListLoader, XmlFeedLoader,
};
use crate::schedule::UpdateTrigger;
use crate::server::AppState;
use crate::store::{
    CertificateStore, CrlStore, CrlUrlStore, MemoryCertificateStore, MemoryCrlStore,
    MemoryCrlUrlStore, RedisCertificateStore, RedisCrlStore, RedisCrlUrlStore,
};
use crate::verification::{CheckPipeline, VerificationService};

/// The three stores backing the trust store.
#[derive(Clone)]
pub struct Stores {
    pub certificates: Arc<dyn CertificateStore>,
    pub crls: Arc<dyn CrlStore>,
    pub crl_urls: Arc<dyn CrlUrlStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            certificates: Arc::new(MemoryCertificateStore::new()),
            crls: Arc::new(MemoryCrlStore::new()),
            crl_urls: Arc::new(MemoryCrlUrlStore::new()),
        }
    }
}

pub async fn setup(config: &Config) -> color_eyre::Result<AppState> {
    let stores = if let Some(redis_config) = &config.redis {
        tracing::info!("Redis URI provided, using Redis for the trust store.");
        let redis_conn = redis_config
            .start()
            .await
            .wrap_err("Failed to start Redis")?;
        Stores {
            certificates: Arc::new(RedisCertificateStore::new(redis_conn.clone())),
            crls: Arc::new(RedisCrlStore::new(redis_conn.clone())),
            crl_urls: Arc::new(RedisCrlUrlStore::new(redis_conn)),
        }
    } else {
        tracing::info!("No Redis URI, using in-memory trust store.");
        Stores::in_memory()
    };

    build_state(config, stores)
}

/// Wires the verification service and the update pipeline over `stores`.
pub fn build_state(config: &Config, stores: Stores) -> color_eyre::Result<AppState> {
    let pipeline = CheckPipeline::standard(
        &config.verification,
        stores.certificates.clone(),
        stores.crls.clone(),
    );
    tracing::info!(checks = ?pipeline.enabled_codes(), "Check pipeline ready");

    let updater = data_updater(&config.ingest, &stores)?;
    Ok(AppState {
        verification: Arc::new(VerificationService::new(pipeline)),
        updates: UpdateTrigger::new(Arc::new(updater)),
    })
}

/// Wires the update stages to the sources listed in `config`.
pub fn data_updater(config: &IngestConfig, stores: &Stores) -> color_eyre::Result<DataUpdater> {
    let fetcher =
        HttpFetcher::new(config.fetch_timeout()).wrap_err("Failed to build HTTP client")?;

    let mut certificates =
        CertificateUpdater::new(stores.certificates.clone(), stores.crl_urls.clone());
    for path in &config.trusted_directories {
        certificates = certificates.with_trusted(Arc::new(DirectoryLoader::new(path)));
    }
    for path in &config.intermediate_directories {
        certificates = certificates.with_intermediate(Arc::new(DirectoryLoader::new(path)));
    }
    for url in &config.certificate_feeds {
        certificates = certificates
            .with_intermediate(Arc::new(XmlFeedLoader::new(url.as_str(), fetcher.clone())));
    }

    let mut crl_urls = CrlUrlUpdater::new(stores.crl_urls.clone());
    for url in &config.crl_url_feeds {
        crl_urls = crl_urls.with_loader(Arc::new(XmlFeedLoader::new(url.as_str(), fetcher.clone())));
    }
    for path in &config.crl_url_lists {
        crl_urls = crl_urls.with_loader(Arc::new(UrlListLoader::new(path)));
    }

    let crls = CrlUpdater::new(
        fetcher,
        stores.crls.clone(),
        stores.crl_urls.clone(),
        config.fetch_concurrency,
    );
    Ok(DataUpdater::new(certificates, crl_urls, crls))
}
