//! Certificate, CRL and CMS fixtures generated at test time.
//!
//! Shared by the unit tests and the integration tests, so nothing here may
//! reach into the crate itself.
#![allow(dead_code)]

use openssl::{
    pkcs7::{Pkcs7, Pkcs7Flags},
    pkey::PKey,
    stack::Stack,
    x509::X509,
};
use rcgen::{
    BasicConstraints, CertificateParams, CertificateRevocationListParams, CrlDistributionPoint,
    CustomExtension, DnType, ExtendedKeyUsagePurpose, IsCa, KeyIdMethod, KeyPair,
    KeyUsagePurpose, RevokedCertParams, SerialNumber,
};
use time::{Duration, OffsetDateTime};

pub const ROOT_SERIAL: u8 = 0x10;
pub const INTERMEDIATE_SERIAL: u8 = 0x20;
pub const LEAF_SERIAL: u8 = 0x30;
pub const CRL_BASE: &str = "http://crl.test";
pub const ROOT_CRL_URL: &str = "http://crl.test/root.crl";
pub const INTERMEDIATE_CRL_URL: &str = "http://crl.test/intermediate.crl";
pub const LEAF_INN: &str = "7707083893";
/// Signature tool classes KS1 and KS2.
pub const LEAF_POLICIES: [&str; 2] = ["1.2.643.100.113.1", "1.2.643.100.113.2"];

/// A CA certificate together with what is needed to sign with it.
pub struct Authority {
    pub cert: rcgen::Certificate,
    pub key: KeyPair,
    pub der: Vec<u8>,
}

pub struct Leaf {
    pub der: Vec<u8>,
    pub key: KeyPair,
}

/// Root -> intermediate -> leaf, linked through key identifiers. The
/// intermediate points at `{crl_base}/root.crl` and the leaf at
/// `{crl_base}/intermediate.crl`.
pub struct Pki {
    pub root: Authority,
    pub intermediate: Authority,
    pub leaf: Leaf,
    crl_base: String,
}

impl Pki {
    pub fn new() -> Self {
        Self::with_crl_base(CRL_BASE)
    }

    pub fn with_crl_base(crl_base: &str) -> Self {
        let root = root_authority("Test Root CA");
        let intermediate =
            intermediate_authority(&root, "Test Intermediate CA", &format!("{crl_base}/root.crl"));
        let leaf = leaf_with(&intermediate, &format!("{crl_base}/intermediate.crl"), |_| {});
        Self {
            root,
            intermediate,
            leaf,
            crl_base: crl_base.to_string(),
        }
    }

    /// Issues another leaf from the intermediate after `customize` has
    /// adjusted the default leaf parameters.
    pub fn leaf_with(&self, customize: impl FnOnce(&mut CertificateParams)) -> Leaf {
        let crl_url = format!("{}/intermediate.crl", self.crl_base);
        leaf_with(&self.intermediate, &crl_url, customize)
    }

    /// Issues a replacement intermediate from the root. Leaves issued
    /// afterwards through [`Pki::leaf_with`] chain to it once it is assigned
    /// to `self.intermediate`.
    pub fn intermediate_with(&self, customize: impl FnOnce(&mut CertificateParams)) -> Authority {
        let key = KeyPair::generate().unwrap();
        let mut params = authority_params("Test Intermediate CA", INTERMEDIATE_SERIAL);
        customize(&mut params);
        let cert = params.signed_by(&key, &self.root.cert, &self.root.key).unwrap();
        Authority {
            der: cert.der().to_vec(),
            cert,
            key,
        }
    }
}

fn base_params(common_name: &str, serial: u8) -> CertificateParams {
    let mut params = CertificateParams::default();
    params
        .distinguished_name
        .push(DnType::CommonName, common_name);
    params
        .distinguished_name
        .push(DnType::OrganizationName, "Sigcheck Test");
    params.distinguished_name.push(DnType::CountryName, "RU");
    params.serial_number = Some(SerialNumber::from_slice(&[serial]));
    params.not_before = OffsetDateTime::now_utc() - Duration::days(1);
    params.not_after = OffsetDateTime::now_utc() + Duration::days(365);
    params.use_authority_key_identifier_extension = true;
    params
}

fn authority_params(common_name: &str, serial: u8) -> CertificateParams {
    let mut params = base_params(common_name, serial);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    params.not_after = OffsetDateTime::now_utc() + Duration::days(3650);
    params
}

fn root_authority(common_name: &str) -> Authority {
    let key = KeyPair::generate().unwrap();
    let cert = authority_params(common_name, ROOT_SERIAL)
        .self_signed(&key)
        .unwrap();
    Authority {
        der: cert.der().to_vec(),
        cert,
        key,
    }
}

fn intermediate_authority(root: &Authority, common_name: &str, crl_url: &str) -> Authority {
    let key = KeyPair::generate().unwrap();
    let mut params = authority_params(common_name, INTERMEDIATE_SERIAL);
    params.crl_distribution_points = vec![CrlDistributionPoint {
        uris: vec![crl_url.to_string()],
    }];
    let cert = params.signed_by(&key, &root.cert, &root.key).unwrap();
    Authority {
        der: cert.der().to_vec(),
        cert,
        key,
    }
}

fn leaf_with(
    issuer: &Authority,
    crl_url: &str,
    customize: impl FnOnce(&mut CertificateParams),
) -> Leaf {
    let key = KeyPair::generate().unwrap();
    let mut params = base_params("Test Signer", LEAF_SERIAL);
    params.is_ca = IsCa::ExplicitNoCa;
    params
        .distinguished_name
        .push(DnType::CustomDnType(vec![2, 5, 4, 4]), "Ivanov");
    params.distinguished_name.push(
        DnType::CustomDnType(vec![1, 2, 643, 3, 131, 1, 1]),
        LEAF_INN,
    );
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::ContentCommitment,
        KeyUsagePurpose::KeyEncipherment,
        KeyUsagePurpose::DataEncipherment,
    ];
    params.extended_key_usages = vec![
        ExtendedKeyUsagePurpose::ClientAuth,
        ExtendedKeyUsagePurpose::EmailProtection,
    ];
    params.crl_distribution_points = vec![CrlDistributionPoint {
        uris: vec![crl_url.to_string()],
    }];
    params
        .custom_extensions
        .push(policies_extension(&LEAF_POLICIES));
    customize(&mut params);

    let cert = params.signed_by(&key, &issuer.cert, &issuer.key).unwrap();
    Leaf {
        der: cert.der().to_vec(),
        key,
    }
}

/// A certificatePolicies extension listing `policies`.
pub fn policies_extension(policies: &[&str]) -> CustomExtension {
    let infos: Vec<u8> = policies
        .iter()
        .flat_map(|policy| der_tlv(0x30, &der_tlv(0x06, &oid_body(policy))))
        .collect();
    CustomExtension::from_oid_content(&[2, 5, 29, 32], der_tlv(0x30, &infos))
}

/// A self-signed certificate that carries no Authority Key Identifier.
pub fn self_signed_without_aki(common_name: &str) -> Vec<u8> {
    let key = KeyPair::generate().unwrap();
    let mut params = base_params(common_name, 0x01);
    params.use_authority_key_identifier_extension = false;
    params.self_signed(&key).unwrap().der().to_vec()
}

/// A CRL signed by `authority`, in effect from an hour ago for a week.
pub fn crl(authority: &Authority, revoked: &[u8]) -> Vec<u8> {
    let now = OffsetDateTime::now_utc();
    let params = CertificateRevocationListParams {
        this_update: now - Duration::hours(1),
        next_update: now + Duration::days(7),
        crl_number: SerialNumber::from_slice(&[1]),
        issuing_distribution_point: None,
        revoked_certs: revoked
            .iter()
            .map(|serial| RevokedCertParams {
                serial_number: SerialNumber::from_slice(&[*serial]),
                revocation_time: now - Duration::hours(2),
                reason_code: None,
                invalidity_date: None,
            })
            .collect(),
        key_identifier_method: KeyIdMethod::Sha256,
    };
    params
        .signed_by(&authority.cert, &authority.key)
        .unwrap()
        .der()
        .to_vec()
}

/// A detached DER CMS signature over `document` that embeds the signer
/// certificate.
pub fn sign_detached(signer: &Leaf, document: &[u8]) -> Vec<u8> {
    pkcs7_sign(signer, document, Pkcs7Flags::DETACHED | Pkcs7Flags::BINARY)
}

pub fn sign_detached_without_certificates(signer: &Leaf, document: &[u8]) -> Vec<u8> {
    pkcs7_sign(
        signer,
        document,
        Pkcs7Flags::DETACHED | Pkcs7Flags::BINARY | Pkcs7Flags::NOCERTS,
    )
}

fn pkcs7_sign(signer: &Leaf, document: &[u8], flags: Pkcs7Flags) -> Vec<u8> {
    let cert = X509::from_der(&signer.der).unwrap();
    let key = PKey::private_key_from_pem(signer.key.serialize_pem().as_bytes()).unwrap();
    let extra = Stack::new().unwrap();
    Pkcs7::sign(&cert, &key, &extra, document, flags)
        .unwrap()
        .to_der()
        .unwrap()
}

fn oid_body(dotted: &str) -> Vec<u8> {
    let arcs: Vec<u64> = dotted.split('.').map(|arc| arc.parse().unwrap()).collect();
    let mut body = Vec::new();
    let first = arcs[0] * 40 + arcs[1];
    for arc in std::iter::once(first).chain(arcs[2..].iter().copied()) {
        let mut groups = vec![(arc & 0x7f) as u8];
        let mut rest = arc >> 7;
        while rest > 0 {
            groups.push((rest & 0x7f) as u8 | 0x80);
            rest >>= 7;
        }
        body.extend(groups.iter().rev());
    }
    body
}

pub fn der_tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes: Vec<u8> = len
            .to_be_bytes()
            .into_iter()
            .skip_while(|b| *b == 0)
            .collect();
        out.push(0x80 | bytes.len() as u8);
        out.extend(bytes);
    }
    out.extend_from_slice(content);
    out
}

#[test]
fn oid_encoding_matches_known_value() {
    // 1.2.840.113549 -> 2a 86 48 86 f7 0d
    assert_eq!(
        oid_body("1.2.840.113549"),
        vec![0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d]
    );
}
