use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use x509_parser::prelude::*;

use super::{
    ParseError, asn1_time_to_chrono, authority_key_identifier, looks_like_pem,
    subject_key_identifier,
};

pub const PEM_CERTIFICATE_TAG: &str = "CERTIFICATE";

/// A certificate as held by the trust store.
///
/// Parent/child links between certificates follow `issuer_key` -> `subject_key`,
/// both taken from the key identifier extensions. Distinguished names are kept
/// for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Lowercase hex of the serial number magnitude.
    pub serial_number: String,
    pub subject_key: Option<String>,
    pub issuer_key: Option<String>,
    pub subject: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub pem: String,
    pub trusted: bool,
    #[serde(default)]
    pub crl_urls: Vec<String>,
}

impl Certificate {
    /// Decodes a DER encoded X.509 certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, ParseError> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| ParseError::Certificate(e.to_string()))?;

        let validity = cert.validity();
        let not_before = asn1_time_to_chrono(validity.not_before)
            .ok_or_else(|| ParseError::Certificate("notBefore out of range".into()))?;
        let not_after = asn1_time_to_chrono(validity.not_after)
            .ok_or_else(|| ParseError::Certificate("notAfter out of range".into()))?;

        Ok(Self {
            serial_number: hex::encode(cert.tbs_certificate.serial.to_bytes_be()),
            subject_key: subject_key_identifier(cert.extensions()),
            issuer_key: authority_key_identifier(cert.extensions()),
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            not_before,
            not_after,
            pem: ::pem::encode(&::pem::Pem::new(PEM_CERTIFICATE_TAG, der.to_vec())),
            trusted: false,
            crl_urls: crl_distribution_urls(&cert),
        })
    }

    pub fn from_pem(input: &str) -> Result<Self, ParseError> {
        let block = ::pem::parse(input)?;
        if block.tag() != PEM_CERTIFICATE_TAG {
            return Err(ParseError::Certificate(format!(
                "unexpected PEM label {}",
                block.tag()
            )));
        }
        Self::from_der(block.contents())
    }

    /// Decodes the bare base64 body of a certificate, as embedded in XML feeds.
    pub fn from_base64(input: &str) -> Result<Self, ParseError> {
        let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        let der = STANDARD.decode(compact)?;
        Self::from_der(&der)
    }

    /// Accepts either DER or PEM input.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        if looks_like_pem(bytes) {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| ParseError::Certificate(e.to_string()))?;
            Self::from_pem(text)
        } else {
            Self::from_der(bytes)
        }
    }

    pub fn to_der(&self) -> Result<Vec<u8>, ParseError> {
        Ok(::pem::parse(&self.pem)?.into_contents())
    }

    /// A certificate whose authority key is its own subject key ends a chain walk.
    pub fn is_self_signed(&self) -> bool {
        matches!((&self.subject_key, &self.issuer_key), (Some(subject), Some(issuer)) if subject == issuer)
    }

    pub fn with_trusted(mut self, trusted: bool) -> Self {
        self.trusted = trusted;
        self
    }
}

/// Collects every URI of every full-name distribution point. Anything that
/// does not decode is ignored.
pub(crate) fn crl_distribution_urls(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut urls = Vec::new();
    for ext in cert.extensions() {
        let ParsedExtension::CRLDistributionPoints(points) = ext.parsed_extension() else {
            continue;
        };
        for point in points.iter() {
            let Some(DistributionPointName::FullName(names)) = &point.distribution_point else {
                continue;
            };
            for name in names {
                if let GeneralName::URI(uri) = name {
                    urls.push((*uri).to_string());
                }
            }
        }
    }
    urls
}
