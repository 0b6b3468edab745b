use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use x509_parser::prelude::*;

use super::{ParseError, asn1_time_to_chrono, authority_key_identifier, looks_like_pem};

pub const PEM_CRL_TAG: &str = "X509 CRL";

/// A revocation list together with the URL it was downloaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crl {
    pub url: String,
    pub issuer_key: Option<String>,
    pub issuer: String,
    pub this_update: DateTime<Utc>,
    pub next_update: Option<DateTime<Utc>>,
    pub revoked_count: usize,
    pub pem: String,
}

impl Crl {
    pub fn from_der(der: &[u8], url: impl Into<String>) -> Result<Self, ParseError> {
        let (_, crl) = CertificateRevocationList::from_der(der)
            .map_err(|e| ParseError::Crl(e.to_string()))?;

        let this_update = asn1_time_to_chrono(crl.last_update())
            .ok_or_else(|| ParseError::Crl("thisUpdate out of range".into()))?;

        Ok(Self {
            url: url.into(),
            issuer_key: authority_key_identifier(crl.extensions()),
            issuer: crl.issuer().to_string(),
            this_update,
            next_update: crl.next_update().and_then(asn1_time_to_chrono),
            revoked_count: crl.iter_revoked_certificates().count(),
            pem: ::pem::encode(&::pem::Pem::new(PEM_CRL_TAG, der.to_vec())),
        })
    }

    /// Accepts either DER or PEM input.
    pub fn parse(bytes: &[u8], url: impl Into<String>) -> Result<Self, ParseError> {
        if looks_like_pem(bytes) {
            let block = ::pem::parse(bytes)?;
            if block.tag() != PEM_CRL_TAG {
                return Err(ParseError::Crl(format!("unexpected PEM label {}", block.tag())));
            }
            Self::from_der(block.contents(), url)
        } else {
            Self::from_der(bytes, url)
        }
    }

    pub fn to_der(&self) -> Result<Vec<u8>, ParseError> {
        Ok(::pem::parse(&self.pem)?.into_contents())
    }

    /// Whether `at` falls inside `[thisUpdate, nextUpdate]`.
    pub fn is_current_at(&self, at: DateTime<Utc>) -> bool {
        self.this_update <= at && self.next_update.is_none_or(|next| at <= next)
    }
}

/// Download bookkeeping for one CRL location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrlUrl {
    pub url: String,
    pub last_update: Option<DateTime<Utc>>,
    pub next_update: Option<DateTime<Utc>>,
}

impl CrlUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            last_update: None,
            next_update: None,
        }
    }
}
