//! Verification of detached signatures against the trust store.

pub mod checks;
pub mod info;
pub mod messages;
pub mod model;

use futures::future::try_join_all;
use thiserror::Error;
use tracing::{debug, info, instrument};

pub use checks::{Check, CheckPipeline};
pub use model::{CertificateInfo, CheckResult, SignatureResult, VerificationResult};

use crate::pki::{ParseError, SignedDocument, SignerCertificate};
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum VerificationError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Trust store unavailable: {0}")]
    Store(#[from] StoreError),
}

/// Parses a detached signature and runs the check pipeline for every signer.
#[derive(Clone)]
pub struct VerificationService {
    pipeline: CheckPipeline,
}

impl VerificationService {
    pub fn new(pipeline: CheckPipeline) -> Self {
        Self { pipeline }
    }

    /// Verifies `signature` over `document`.
    ///
    /// Malformed envelopes and signers without exactly one embedded
    /// certificate fail the whole call. Failed checks do not: they are
    /// reported in the result and clear its qualification status.
    #[instrument(skip_all, fields(document_len = document.len(), signature_len = signature.len()))]
    pub async fn verify(
        &self,
        document: &[u8],
        signature: &[u8],
    ) -> Result<VerificationResult, VerificationError> {
        let signed = SignedDocument::parse(document, signature)?;
        debug!(signers = signed.signers.len(), "Signed data parsed");

        let signatures = try_join_all(
            signed
                .signers
                .iter()
                .map(|signer| self.verify_signer(signer, signed.content)),
        )
        .await?;

        let result = VerificationResult::new(signatures);
        info!(
            id = %result.id,
            signatures = result.signatures_count,
            qualified = result.qualification_status,
            "Verification finished"
        );
        Ok(result)
    }

    async fn verify_signer(
        &self,
        signer: &SignerCertificate,
        content: &[u8],
    ) -> Result<SignatureResult, VerificationError> {
        let verification_steps = self.pipeline.run(signer, content).await?;
        let certificate = signer.parse_certificate()?;
        Ok(SignatureResult {
            verification_steps,
            signature_certificate_info: info::certificate_info(&signer.signer, &certificate),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VerificationConfig;
    use crate::pki::Certificate;
    use crate::store::{CertificateStore, MemoryCertificateStore, MemoryCrlStore};
    use crate::test_support::{self, Pki};
    use std::sync::Arc;

    async fn service(pki: &Pki) -> VerificationService {
        let certificates = Arc::new(MemoryCertificateStore::new());
        certificates
            .save_certificate(Certificate::from_der(&pki.root.der).unwrap().with_trusted(true))
            .await
            .unwrap();
        certificates
            .save_certificate(Certificate::from_der(&pki.intermediate.der).unwrap())
            .await
            .unwrap();
        let config = VerificationConfig {
            chain_with_crl: false,
            ..VerificationConfig::default()
        };
        VerificationService::new(CheckPipeline::standard(
            &config,
            certificates,
            Arc::new(MemoryCrlStore::new()),
        ))
    }

    #[tokio::test]
    async fn test_qualified_signature() {
        let pki = Pki::new();
        let service = service(&pki).await;
        let signature = test_support::sign_detached(&pki.leaf, b"payload");

        let result = service.verify(b"payload", &signature).await.unwrap();
        assert!(result.qualification_status);
        assert_eq!(result.signatures_count, 1);
        assert_eq!(result.signatures[0].verification_steps.len(), 4);
        assert_eq!(
            result.signatures[0]
                .signature_certificate_info
                .subject
                .common_name
                .as_deref(),
            Some("Test Signer")
        );
    }

    #[tokio::test]
    async fn test_failed_check_clears_qualification() {
        let pki = Pki::new();
        let service = service(&pki).await;
        let signature = test_support::sign_detached(&pki.leaf, b"payload");

        let result = service.verify(b"other payload", &signature).await.unwrap();
        assert!(!result.qualification_status);
        let step = result.signatures[0]
            .step(messages::CHECK_SIGNED_DATA)
            .unwrap();
        assert!(!step.success);
        assert!(
            result.signatures[0]
                .step(messages::CHECK_CERT_CHAIN)
                .unwrap()
                .success
        );
    }

    #[tokio::test]
    async fn test_parse_failures_abort() {
        let pki = Pki::new();
        let service = service(&pki).await;

        let garbage = service.verify(b"doc", b"not a signature").await;
        assert!(matches!(garbage, Err(VerificationError::Parse(_))));

        let no_certs = test_support::sign_detached_without_certificates(&pki.leaf, b"doc");
        let ambiguous = service.verify(b"doc", &no_certs).await;
        assert!(matches!(
            ambiguous,
            Err(VerificationError::Parse(ParseError::AmbiguousSigner { matches: 0, .. }))
        ));
    }
}
