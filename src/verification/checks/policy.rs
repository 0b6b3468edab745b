use async_trait::async_trait;

use super::Check;
use crate::pki::{SignerCertificate, dictionary::POLICY_CLASSES};
use crate::store::StoreError;
use crate::verification::{info::policy_oids, messages, model::CheckResult};

/// Maps the certificate policies to the strongest signature tool class.
pub struct CertificatePolicyCheck;

/// Class N applies when the policies of classes 1 through N are all present.
fn highest_class(policies: &[String]) -> Option<&'static str> {
    POLICY_CLASSES
        .iter()
        .take_while(|(oid, _)| policies.iter().any(|policy| policy == oid))
        .last()
        .map(|(_, name)| *name)
}

#[async_trait]
impl Check for CertificatePolicyCheck {
    fn code(&self) -> &'static str {
        messages::CHECK_CERTIFICATE_POLICY
    }

    async fn evaluate(
        &self,
        signer: &SignerCertificate,
        _content: &[u8],
    ) -> Result<CheckResult, StoreError> {
        let policies = signer
            .parse_certificate()
            .map(|cert| policy_oids(&cert))
            .unwrap_or_default();

        let (success, detail) = match highest_class(&policies) {
            Some(class) => (true, format!("{}: {class}", messages::POLICY_CONFIRMED)),
            None => (false, messages::POLICY_NOT_CONFIRMED.to_string()),
        };

        Ok(CheckResult::new(
            messages::CHECK_CERTIFICATE_POLICY,
            messages::CHECK_CERTIFICATE_POLICY_DESCRIPTION,
            success,
            detail,
        ))
    }
}
