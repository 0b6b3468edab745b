//! Independent per-signer checks and the pipeline that runs them.

use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;

use super::model::CheckResult;
use crate::config::VerificationConfig;
use crate::pki::SignerCertificate;
use crate::store::{CertificateStore, CrlStore, StoreError};

mod chain;
mod content;
mod key_usage;
mod policy;

pub use chain::ChainCheck;
pub use content::ContentCheck;
pub use key_usage::KeyUsageCheck;
pub use policy::CertificatePolicyCheck;

/// A single validation step over one signer and its certificate.
///
/// Checks never see each other's results. A failed check is reported as an
/// unsuccessful [`CheckResult`]; only storage failures are returned as errors.
#[async_trait]
pub trait Check: Send + Sync {
    fn code(&self) -> &'static str;

    fn is_enabled(&self) -> bool {
        true
    }

    async fn evaluate(
        &self,
        signer: &SignerCertificate,
        content: &[u8],
    ) -> Result<CheckResult, StoreError>;
}

/// Wraps a check with an on/off switch taken from configuration.
pub struct Configured<C> {
    check: C,
    enabled: bool,
}

impl<C: Check> Configured<C> {
    pub fn new(check: C, enabled: bool) -> Self {
        Self { check, enabled }
    }
}

#[async_trait]
impl<C: Check> Check for Configured<C> {
    fn code(&self) -> &'static str {
        self.check.code()
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn evaluate(
        &self,
        signer: &SignerCertificate,
        content: &[u8],
    ) -> Result<CheckResult, StoreError> {
        self.check.evaluate(signer, content).await
    }
}

#[derive(Clone, Default)]
pub struct CheckPipeline {
    checks: Vec<Arc<dyn Check>>,
}

impl CheckPipeline {
    pub fn new(checks: Vec<Arc<dyn Check>>) -> Self {
        Self { checks }
    }

    /// The five standard checks, switched on or off by `config`.
    pub fn standard(
        config: &VerificationConfig,
        certificates: Arc<dyn CertificateStore>,
        crls: Arc<dyn CrlStore>,
    ) -> Self {
        Self::new(vec![
            Arc::new(Configured::new(ContentCheck, config.content)),
            Arc::new(Configured::new(KeyUsageCheck, config.key_usage)),
            Arc::new(Configured::new(
                CertificatePolicyCheck,
                config.certificate_policy,
            )),
            Arc::new(Configured::new(
                ChainCheck::without_revocation(certificates.clone()),
                config.chain,
            )),
            Arc::new(Configured::new(
                ChainCheck::with_revocation(certificates, crls),
                config.chain_with_crl,
            )),
        ])
    }

    pub fn enabled_codes(&self) -> Vec<&'static str> {
        self.checks
            .iter()
            .filter(|check| check.is_enabled())
            .map(|check| check.code())
            .collect()
    }

    /// Runs every enabled check concurrently. Result order is unspecified.
    pub async fn run(
        &self,
        signer: &SignerCertificate,
        content: &[u8],
    ) -> Result<Vec<CheckResult>, StoreError> {
        try_join_all(
            self.checks
                .iter()
                .filter(|check| check.is_enabled())
                .map(|check| check.evaluate(signer, content)),
        )
        .await
    }
}
