use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

use super::Check;
use crate::pki::{Certificate, PathError, PathValidator, SignerCertificate};
use crate::store::{CertificateStore, CrlStore, StoreError};
use crate::verification::{messages, model::CheckResult};

/// Builds a path from the signature certificate to a trusted certificate,
/// optionally enforcing revocation lists.
pub struct ChainCheck {
    certificates: Arc<dyn CertificateStore>,
    crls: Option<Arc<dyn CrlStore>>,
}

impl ChainCheck {
    pub fn without_revocation(certificates: Arc<dyn CertificateStore>) -> Self {
        Self {
            certificates,
            crls: None,
        }
    }

    pub fn with_revocation(
        certificates: Arc<dyn CertificateStore>,
        crls: Arc<dyn CrlStore>,
    ) -> Self {
        Self {
            certificates,
            crls: Some(crls),
        }
    }

    fn result(&self, success: bool, detail: &str) -> CheckResult {
        let description = if self.crls.is_some() {
            messages::CHECK_CERT_CHAIN_WITH_CRL_DESCRIPTION
        } else {
            messages::CHECK_CERT_CHAIN_DESCRIPTION
        };
        CheckResult::new(self.code(), description, success, detail)
    }

    fn failure_detail(&self, error: PathError) -> &'static str {
        match error {
            PathError::Expired => messages::CERTIFICATE_EXPIRED,
            PathError::NotYetValid => messages::CERTIFICATE_NOT_YET_VALID,
            PathError::Revoked => messages::CERTIFICATE_REVOKED,
            PathError::NoPath if self.crls.is_some() => messages::CHAIN_INVALID_WITH_CRL,
            PathError::NoPath => messages::CHAIN_INVALID,
        }
    }
}

#[async_trait]
impl Check for ChainCheck {
    fn code(&self) -> &'static str {
        if self.crls.is_some() {
            messages::CHECK_CERT_CHAIN_WITH_CRL
        } else {
            messages::CHECK_CERT_CHAIN
        }
    }

    async fn evaluate(
        &self,
        signer: &SignerCertificate,
        _content: &[u8],
    ) -> Result<CheckResult, StoreError> {
        let certificate = match Certificate::from_der(&signer.certificate) {
            Ok(certificate) => certificate,
            Err(e) => {
                warn!(error = %e, "Signature certificate could not be decoded");
                return Ok(self.result(false, self.failure_detail(PathError::NoPath)));
            }
        };

        let chain = match &certificate.issuer_key {
            Some(issuer_key) => {
                self.certificates
                    .get_certificate_chain_for_leaf_key(issuer_key)
                    .await?
            }
            None => Vec::new(),
        };
        let (anchors, intermediates): (Vec<Certificate>, Vec<Certificate>) =
            chain.iter().cloned().partition(|c| c.trusted);
        debug!(
            serial = %certificate.serial_number,
            anchors = anchors.len(),
            intermediates = intermediates.len(),
            "Chain assembled for signature certificate"
        );

        let mut validator =
            PathValidator::new(&anchors, &intermediates).with_intermediate_der(&signer.certificate);

        if let Some(crl_store) = &self.crls {
            let mut issuer_keys: Vec<String> =
                chain.iter().filter_map(|c| c.issuer_key.clone()).collect();
            issuer_keys.extend(certificate.issuer_key.clone());
            issuer_keys.sort();
            issuer_keys.dedup();

            let crls = crl_store.get_all_by_issuer_keys(&issuer_keys).await?;
            debug!(count = crls.len(), "Revocation lists collected for chain");
            validator = validator.with_crls(&crls);
        }

        Ok(match validator.validate(&signer.certificate, Utc::now()) {
            Ok(_) if self.crls.is_some() => self.result(true, messages::CHAIN_VALID_WITH_CRL),
            Ok(_) => self.result(true, messages::CHAIN_VALID),
            Err(e) => {
                debug!(serial = %certificate.serial_number, error = %e, "Chain check failed");
                self.result(false, self.failure_detail(e))
            }
        })
    }
}
