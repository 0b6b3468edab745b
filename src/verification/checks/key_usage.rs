use async_trait::async_trait;
use x509_parser::prelude::*;

use super::Check;
use crate::pki::SignerCertificate;
use crate::store::StoreError;
use crate::verification::{messages, model::CheckResult};

/// Requires digitalSignature, nonRepudiation, keyEncipherment and
/// dataEncipherment to be asserted together.
pub struct KeyUsageCheck;

#[derive(Debug, Default, PartialEq, Eq)]
struct Flags {
    digital_signature: bool,
    non_repudiation: bool,
    key_encipherment: bool,
    data_encipherment: bool,
}

impl Flags {
    fn of(cert: &X509Certificate<'_>) -> Self {
        match cert.key_usage() {
            Ok(Some(usage)) => Self {
                digital_signature: usage.value.digital_signature(),
                non_repudiation: usage.value.non_repudiation(),
                key_encipherment: usage.value.key_encipherment(),
                data_encipherment: usage.value.data_encipherment(),
            },
            _ => Self::default(),
        }
    }

    fn all(&self) -> bool {
        self.digital_signature
            && self.non_repudiation
            && self.key_encipherment
            && self.data_encipherment
    }
}

#[async_trait]
impl Check for KeyUsageCheck {
    fn code(&self) -> &'static str {
        messages::CHECK_KEY_USAGE
    }

    async fn evaluate(
        &self,
        signer: &SignerCertificate,
        _content: &[u8],
    ) -> Result<CheckResult, StoreError> {
        let flags = signer
            .parse_certificate()
            .map(|cert| Flags::of(&cert))
            .unwrap_or_default();

        let detail = if flags.all() {
            messages::KEY_USAGE_VALID.to_string()
        } else {
            format!(
                "The signature certificate does not set every required keyUsage flag. \
                 digitalSignature={}, nonRepudiation={}, keyEncipherment={}, dataEncipherment={}",
                flags.digital_signature,
                flags.non_repudiation,
                flags.key_encipherment,
                flags.data_encipherment
            )
        };

        Ok(CheckResult::new(
            messages::CHECK_KEY_USAGE,
            messages::CHECK_KEY_USAGE_DESCRIPTION,
            flags.all(),
            detail,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Pki;
    use crate::verification::checks::tests::signer_for;
    use rcgen::KeyUsagePurpose;

    #[tokio::test]
    async fn test_all_four_flags_present() {
        let pki = Pki::new();
        let signer = signer_for(&pki.leaf, b"doc");

        let result = KeyUsageCheck.evaluate(&signer, b"doc").await.unwrap();
        assert!(result.success);
        assert_eq!(result.result_description, messages::KEY_USAGE_VALID);
    }

    #[tokio::test]
    async fn test_missing_flags_are_reported() {
        let pki = Pki::new();
        let leaf = pki.leaf_with(|params| {
            params.key_usages = vec![
                KeyUsagePurpose::DigitalSignature,
                KeyUsagePurpose::ContentCommitment,
            ];
        });
        let signer = signer_for(&leaf, b"doc");

        let result = KeyUsageCheck.evaluate(&signer, b"doc").await.unwrap();
        assert!(!result.success);
        assert!(result.result_description.contains("digitalSignature=true"));
        assert!(result.result_description.contains("nonRepudiation=true"));
        assert!(result.result_description.contains("keyEncipherment=false"));
        assert!(result.result_description.contains("dataEncipherment=false"));
    }
}
