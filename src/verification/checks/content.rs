use async_trait::async_trait;
use tracing::debug;

use super::Check;
use crate::pki::{SignerCertificate, signature::verify_content};
use crate::store::StoreError;
use crate::verification::{messages, model::CheckResult};

/// Verifies the signature value over the document with the certificate's key.
pub struct ContentCheck;

impl ContentCheck {
    fn result(success: bool, detail: String) -> CheckResult {
        CheckResult::new(
            messages::CHECK_SIGNED_DATA,
            messages::CHECK_SIGNED_DATA_DESCRIPTION,
            success,
            detail,
        )
    }
}

#[async_trait]
impl Check for ContentCheck {
    fn code(&self) -> &'static str {
        messages::CHECK_SIGNED_DATA
    }

    async fn evaluate(
        &self,
        signer: &SignerCertificate,
        content: &[u8],
    ) -> Result<CheckResult, StoreError> {
        let outcome = signer
            .parse_certificate()
            .map_err(|e| e.to_string())
            .and_then(|cert| {
                verify_content(&signer.signer, content, &cert).map_err(|e| e.to_string())
            });

        Ok(match outcome {
            Ok(()) => Self::result(true, messages::SIGNATURE_MATCHES_CONTENT.to_string()),
            Err(reason) => {
                debug!(signer = %signer.signer.id, %reason, "Content check failed");
                Self::result(
                    false,
                    format!("{}: {reason}", messages::SIGNATURE_DOES_NOT_MATCH_CONTENT),
                )
            }
        })
    }
}
