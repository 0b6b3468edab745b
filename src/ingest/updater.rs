//! Update stages that move loader output into the trust store.

use std::ops::AddAssign;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashSet;
use futures::{StreamExt, TryStreamExt, stream};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use super::{CertificateLoader, CrlUrlLoader, HttpFetcher, IngestError};
use crate::store::{CertificateStore, CrlStore, CrlUrlStore, StoreError};

/// Counters collected over one update run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub certificates_saved: usize,
    pub crl_urls_added: usize,
    pub crls_stored: usize,
    pub crl_downloads_failed: usize,
}

impl AddAssign for UpdateReport {
    fn add_assign(&mut self, other: Self) {
        self.certificates_saved += other.certificates_saved;
        self.crl_urls_added += other.crl_urls_added;
        self.crls_stored += other.crls_stored;
        self.crl_downloads_failed += other.crl_downloads_failed;
    }
}

/// Stores certificates from trusted and intermediate sources and registers
/// the CRL locations they advertise.
pub struct CertificateUpdater {
    trusted: Vec<Arc<dyn CertificateLoader>>,
    intermediate: Vec<Arc<dyn CertificateLoader>>,
    certificates: Arc<dyn CertificateStore>,
    crl_urls: Arc<dyn CrlUrlStore>,
}

impl CertificateUpdater {
    pub fn new(certificates: Arc<dyn CertificateStore>, crl_urls: Arc<dyn CrlUrlStore>) -> Self {
        Self {
            trusted: Vec::new(),
            intermediate: Vec::new(),
            certificates,
            crl_urls,
        }
    }

    /// Certificates from `loader` are stored as trust anchors.
    pub fn with_trusted(mut self, loader: Arc<dyn CertificateLoader>) -> Self {
        self.trusted.push(loader);
        self
    }

    pub fn with_intermediate(mut self, loader: Arc<dyn CertificateLoader>) -> Self {
        self.intermediate.push(loader);
        self
    }

    pub async fn update(&self) -> Result<UpdateReport, IngestError> {
        let discovered = DashSet::new();
        let trusted = self.save_from(&self.trusted, true, &discovered).await?;
        let intermediate = self.save_from(&self.intermediate, false, &discovered).await?;
        info!(trusted, intermediate, "Certificates stored");

        let mut crl_urls_added = 0;
        for url in discovered {
            if self.crl_urls.add_crl_url(&url).await? {
                debug!(url, "New CRL location from certificate");
                crl_urls_added += 1;
            }
        }

        Ok(UpdateReport {
            certificates_saved: trusted + intermediate,
            crl_urls_added,
            ..UpdateReport::default()
        })
    }

    async fn save_from(
        &self,
        loaders: &[Arc<dyn CertificateLoader>],
        trusted: bool,
        discovered: &DashSet<String>,
    ) -> Result<usize, IngestError> {
        if loaders.is_empty() {
            return Ok(0);
        }
        for loader in loaders {
            debug!(source = loader.source(), trusted, "Reading certificates");
        }

        let certificates = stream::select_all(loaders.iter().map(|loader| loader.certificates()))
            .map(move |certificate| certificate.with_trusted(trusted))
            .inspect(|certificate| {
                for url in &certificate.crl_urls {
                    discovered.insert(url.clone());
                }
            })
            .boxed();
        Ok(self.certificates.save_all_certificates(certificates).await?)
    }
}

/// Registers CRL locations from dedicated URL sources.
pub struct CrlUrlUpdater {
    loaders: Vec<Arc<dyn CrlUrlLoader>>,
    crl_urls: Arc<dyn CrlUrlStore>,
}

impl CrlUrlUpdater {
    pub fn new(crl_urls: Arc<dyn CrlUrlStore>) -> Self {
        Self {
            loaders: Vec::new(),
            crl_urls,
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn CrlUrlLoader>) -> Self {
        self.loaders.push(loader);
        self
    }

    pub async fn update(&self) -> Result<UpdateReport, IngestError> {
        for loader in &self.loaders {
            debug!(source = loader.source(), "Reading CRL locations");
        }

        let store = &self.crl_urls;
        let crl_urls_added = stream::select_all(self.loaders.iter().map(|loader| loader.crl_urls()))
            .map(Ok)
            .try_fold(0, |added, url| async move {
                let new = store.add_crl_url(&url).await?;
                Ok::<_, StoreError>(added + usize::from(new))
            })
            .await?;
        info!(crl_urls_added, "CRL locations registered");

        Ok(UpdateReport {
            crl_urls_added,
            ..UpdateReport::default()
        })
    }
}

/// Downloads every registered CRL location and stores the result.
pub struct CrlUpdater {
    fetcher: HttpFetcher,
    crls: Arc<dyn CrlStore>,
    crl_urls: Arc<dyn CrlUrlStore>,
    concurrency: usize,
}

impl CrlUpdater {
    pub fn new(
        fetcher: HttpFetcher,
        crls: Arc<dyn CrlStore>,
        crl_urls: Arc<dyn CrlUrlStore>,
        concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            crls,
            crl_urls,
            concurrency: concurrency.max(1),
        }
    }

    /// A download or parse failure is counted and logged, a store failure
    /// stops the stage.
    pub async fn update(&self) -> Result<UpdateReport, IngestError> {
        let locations = self.crl_urls.get_all_crl_urls().await?;
        info!(count = locations.len(), "Refreshing CRLs");

        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for location in locations {
            let permits = permits.clone();
            let fetcher = self.fetcher.clone();
            let crls = self.crls.clone();
            let crl_urls = self.crl_urls.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.map_err(StoreError::new)?;
                refresh_crl(location.url, &fetcher, crls.as_ref(), crl_urls.as_ref()).await
            });
        }

        let mut report = UpdateReport::default();
        while let Some(joined) = tasks.join_next().await {
            if joined?? {
                report.crls_stored += 1;
            } else {
                report.crl_downloads_failed += 1;
            }
        }
        info!(
            stored = report.crls_stored,
            failed = report.crl_downloads_failed,
            "CRLs refreshed"
        );
        Ok(report)
    }
}

/// Returns whether a CRL was stored for `url`.
async fn refresh_crl(
    url: String,
    fetcher: &HttpFetcher,
    crls: &dyn CrlStore,
    crl_urls: &dyn CrlUrlStore,
) -> Result<bool, StoreError> {
    let crl = match fetcher.fetch_crl(&url).await {
        Ok(crl) => crl,
        Err(e) => {
            warn!(url, error = %e, "Skipping CRL");
            return Ok(false);
        }
    };

    let (this_update, next_update) = (crl.this_update, crl.next_update);
    crls.save_crl(crl).await?;
    crl_urls.update_crl_url(&url, this_update, next_update).await?;
    debug!(url, "CRL stored");
    Ok(true)
}

/// Runs the update stages in order: certificates, CRL locations, CRL content.
///
/// Callers make sure only one run is in flight.
pub struct DataUpdater {
    certificates: CertificateUpdater,
    crl_urls: CrlUrlUpdater,
    crls: CrlUpdater,
}

impl DataUpdater {
    pub fn new(certificates: CertificateUpdater, crl_urls: CrlUrlUpdater, crls: CrlUpdater) -> Self {
        Self {
            certificates,
            crl_urls,
            crls,
        }
    }

    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<UpdateReport, IngestError> {
        let started = Instant::now();
        info!("Trust store update started");

        let mut report = self.certificates.update().await?;
        report += self.crl_urls.update().await?;
        report += self.crls.update().await?;

        info!(
            certificates_saved = report.certificates_saved,
            crl_urls_added = report.crl_urls_added,
            crls_stored = report.crls_stored,
            crl_downloads_failed = report.crl_downloads_failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Trust store update finished"
        );
        Ok(report)
    }
}
