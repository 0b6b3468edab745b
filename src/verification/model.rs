use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a whole verification call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub id: Uuid,
    pub verified_at: DateTime<Utc>,
    pub signatures_count: usize,
    pub signatures: Vec<SignatureResult>,
    /// True only when every check of every signature succeeded.
    pub qualification_status: bool,
}

impl VerificationResult {
    pub fn new(signatures: Vec<SignatureResult>) -> Self {
        let qualification_status = signatures
            .iter()
            .flat_map(|s| &s.verification_steps)
            .all(|step| step.success);
        Self {
            id: Uuid::new_v4(),
            verified_at: Utc::now(),
            signatures_count: signatures.len(),
            signatures,
            qualification_status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureResult {
    pub verification_steps: Vec<CheckResult>,
    pub signature_certificate_info: CertificateInfo,
}

impl SignatureResult {
    /// Looks up the result of the check with the given code.
    pub fn step(&self, code: &str) -> Option<&CheckResult> {
        self.verification_steps.iter().find(|step| step.code == code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub code: String,
    pub description: String,
    pub success: bool,
    pub result_description: String,
    pub created_at: DateTime<Utc>,
}

impl CheckResult {
    pub fn new(
        code: &str,
        description: &str,
        success: bool,
        result_description: impl Into<String>,
    ) -> Self {
        Self {
            code: code.to_string(),
            description: description.to_string(),
            success,
            result_description: result_description.into(),
            created_at: Utc::now(),
        }
    }
}

/// Display projection of the signature certificate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificateInfo {
    pub subject: CertificateSubject,
    pub issuer: CertificateSubject,
    pub serial_number: String,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub signed_at: Option<DateTime<Utc>>,
    pub hash_algorithm: NamedOid,
    pub signature_algorithm: NamedOid,
    pub extended_key_usages: Vec<NamedOid>,
    pub certificate_policies: Vec<NamedOid>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateSubject {
    pub organization: Option<String>,
    pub organization_unit: Option<String>,
    pub email: Option<String>,
    pub title: Option<String>,
    pub common_name: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub street: Option<String>,
    pub locality: Option<String>,
    pub surname: Option<String>,
    pub given_name: Option<String>,
    pub inn: Option<String>,
    pub ogrn: Option<String>,
    pub snils: Option<String>,
    pub ogrnip: Option<String>,
}

/// An OID with its human readable name, when one is known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedOid {
    pub oid: String,
    pub name: Option<String>,
}

impl NamedOid {
    pub fn new(oid: impl Into<String>, lookup: fn(&str) -> Option<&'static str>) -> Self {
        let oid = oid.into();
        let name = lookup(&oid).map(str::to_string);
        Self { oid, name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature(successes: &[bool]) -> SignatureResult {
        SignatureResult {
            verification_steps: successes
                .iter()
                .map(|ok| CheckResult::new("c", "d", *ok, "r"))
                .collect(),
            signature_certificate_info: CertificateInfo::default(),
        }
    }

    #[test]
    fn test_qualification_is_and_of_all_steps() {
        let all_ok = VerificationResult::new(vec![signature(&[true, true]), signature(&[true])]);
        assert!(all_ok.qualification_status);
        assert_eq!(all_ok.signatures_count, 2);

        let one_failed = VerificationResult::new(vec![signature(&[true]), signature(&[true, false])]);
        assert!(!one_failed.qualification_status);
    }

    #[test]
    fn test_json_field_names() {
        let result = VerificationResult::new(vec![signature(&[true])]);
        let json = serde_json::to_value(&result).unwrap();

        assert!(json.get("verified_at").is_some());
        assert_eq!(json["signatures_count"], 1);
        assert_eq!(json["qualification_status"], true);
        let step = &json["signatures"][0]["verification_steps"][0];
        assert_eq!(step["result_description"], "r");
        assert!(step.get("created_at").is_some());
        assert!(json["signatures"][0].get("signature_certificate_info").is_some());
    }
}
