pub mod certificate;
pub mod cms;
pub mod crl;
pub mod dictionary;
pub mod path;
pub mod signature;

pub use certificate::Certificate;
pub use self::cms::{SignedDocument, SignerCertificate, SignerIdentifier, SignerInfo};
pub use crl::{Crl, CrlUrl};
pub use path::{PathError, PathValidator};

use chrono::{DateTime, Utc};
use thiserror::Error;
use x509_parser::prelude::*;

/// Errors raised while decoding certificates, CRLs and signed envelopes.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Malformed certificate: {0}")]
    Certificate(String),

    #[error("Malformed CRL: {0}")]
    Crl(String),

    #[error("Malformed signed data: {0}")]
    SignedData(String),

    #[error("Signer {signer} matches {matches} embedded certificates, expected exactly one")]
    AmbiguousSigner { signer: String, matches: usize },

    #[error("PEM decoding failed: {0}")]
    Pem(#[from] ::pem::PemError),

    #[error("Base64 decoding failed: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Returns true when the buffer looks like a PEM document rather than DER.
pub(crate) fn looks_like_pem(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .is_some_and(|start| bytes[start..].starts_with(b"-----BEGIN"))
}

pub(crate) fn asn1_time_to_chrono(time: ASN1Time) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.timestamp(), 0)
}

/// Hex encoding of the Subject Key Identifier extension, if present.
pub(crate) fn subject_key_identifier(extensions: &[X509Extension<'_>]) -> Option<String> {
    extensions
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::SubjectKeyIdentifier(ski) => Some(hex::encode(ski.0)),
            _ => None,
        })
}

/// Hex encoding of the key identifier carried by the Authority Key Identifier extension.
pub(crate) fn authority_key_identifier(extensions: &[X509Extension<'_>]) -> Option<String> {
    extensions
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::AuthorityKeyIdentifier(aki) => {
                aki.key_identifier.as_ref().map(|id| hex::encode(id.0))
            }
            _ => None,
        })
}

/// Serial number magnitude with leading zero octets removed.
pub(crate) fn trim_serial(serial: &[u8]) -> &[u8] {
    let start = serial
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(serial.len().saturating_sub(1));
    &serial[start..]
}
