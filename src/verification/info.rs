use x509_parser::prelude::*;

use super::model::{CertificateInfo, CertificateSubject, NamedOid};
use crate::pki::{
    SignerInfo, asn1_time_to_chrono,
    dictionary::{self, oid},
};

/// Builds the display projection of a signer's certificate. Never fails:
/// anything that cannot be decoded is left empty.
pub fn certificate_info(signer: &SignerInfo, cert: &X509Certificate<'_>) -> CertificateInfo {
    let validity = cert.validity();
    CertificateInfo {
        subject: subject_of(cert.subject()),
        issuer: subject_of(cert.issuer()),
        serial_number: hex::encode(cert.tbs_certificate.serial.to_bytes_be()),
        valid_from: asn1_time_to_chrono(validity.not_before),
        valid_to: asn1_time_to_chrono(validity.not_after),
        signed_at: signer
            .signed_attributes
            .as_ref()
            .and_then(|attributes| attributes.signing_time),
        hash_algorithm: NamedOid::new(signer.digest_algorithm.clone(), dictionary::algorithm_name),
        signature_algorithm: NamedOid::new(
            cert.signature_algorithm.algorithm.to_id_string(),
            dictionary::algorithm_name,
        ),
        extended_key_usages: extended_key_usages(cert)
            .into_iter()
            .map(|usage| NamedOid::new(usage, dictionary::extended_key_usage_name))
            .collect(),
        certificate_policies: policy_oids(cert)
            .into_iter()
            .map(|policy| NamedOid::new(policy, dictionary::policy_name))
            .collect(),
    }
}

fn subject_of(name: &X509Name<'_>) -> CertificateSubject {
    let mut subject = CertificateSubject::default();
    for attribute in name.iter_attributes() {
        let Ok(value) = attribute.as_str() else {
            continue;
        };
        let slot = match attribute.attr_type().to_id_string().as_str() {
            oid::ORGANIZATION => &mut subject.organization,
            oid::ORGANIZATION_UNIT => &mut subject.organization_unit,
            oid::EMAIL => &mut subject.email,
            oid::TITLE => &mut subject.title,
            oid::COMMON_NAME => &mut subject.common_name,
            oid::COUNTRY => &mut subject.country,
            oid::STATE => &mut subject.state,
            oid::STREET => &mut subject.street,
            oid::LOCALITY => &mut subject.locality,
            oid::SURNAME => &mut subject.surname,
            oid::GIVEN_NAME => &mut subject.given_name,
            oid::INN => &mut subject.inn,
            oid::OGRN => &mut subject.ogrn,
            oid::SNILS => &mut subject.snils,
            oid::OGRNIP => &mut subject.ogrnip,
            _ => continue,
        };
        slot.get_or_insert_with(|| value.to_string());
    }
    subject
}

fn extended_key_usages(cert: &X509Certificate<'_>) -> Vec<String> {
    let Ok(Some(eku)) = cert.extended_key_usage() else {
        return Vec::new();
    };
    let eku = eku.value;
    let known = [
        (eku.any, oid::ANY_EXTENDED_KEY_USAGE),
        (eku.server_auth, oid::SERVER_AUTH),
        (eku.client_auth, oid::CLIENT_AUTH),
        (eku.code_signing, oid::CODE_SIGNING),
        (eku.email_protection, oid::EMAIL_PROTECTION),
        (eku.time_stamping, oid::TIME_STAMPING),
        (eku.ocsp_signing, oid::OCSP_SIGNING),
    ];
    known
        .into_iter()
        .filter(|(set, _)| *set)
        .map(|(_, usage)| usage.to_string())
        .chain(eku.other.iter().map(|other| other.to_id_string()))
        .collect()
}

/// Policy identifiers listed in the certificatePolicies extension.
pub(crate) fn policy_oids(cert: &X509Certificate<'_>) -> Vec<String> {
    cert.extensions()
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::CertificatePolicies(policies) => Some(
                policies
                    .iter()
                    .map(|policy| policy.policy_id.to_id_string())
                    .collect(),
            ),
            _ => None,
        })
        .unwrap_or_default()
}
