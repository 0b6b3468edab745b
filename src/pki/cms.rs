//! Decoder for detached CMS / PKCS#7 `SignedData` envelopes.
//!
//! Only the parts needed for verification are kept: embedded certificates,
//! and for every signer its identifier, algorithms, signed attributes and
//! signature value.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use cms::{
    cert::CertificateChoices,
    content_info::ContentInfo,
    signed_data::{self, SignedData},
};
use der::{Any, Decode, Encode, Tag, Tagged, asn1::ObjectIdentifier};
use tracing::debug;
use x509_cert::attr::Attribute;
use x509_parser::prelude::{ASN1Time, FromDer, ParsedExtension, X509Certificate, X509Name};

use super::{ParseError, asn1_time_to_chrono, dictionary::oid, trim_serial};

/// Identifies the certificate of a signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerIdentifier {
    IssuerAndSerial { issuer: Vec<u8>, serial: Vec<u8> },
    SubjectKeyId(Vec<u8>),
}

impl SignerIdentifier {
    fn from_sid(sid: &signed_data::SignerIdentifier) -> Result<Self, ParseError> {
        Ok(match sid {
            signed_data::SignerIdentifier::IssuerAndSerialNumber(id) => Self::IssuerAndSerial {
                issuer: id.issuer.to_der().map_err(malformed)?,
                serial: id.serial_number.as_bytes().to_vec(),
            },
            signed_data::SignerIdentifier::SubjectKeyIdentifier(ski) => {
                Self::SubjectKeyId(ski.0.as_bytes().to_vec())
            }
        })
    }

    pub fn matches(&self, cert: &X509Certificate<'_>) -> bool {
        match self {
            Self::IssuerAndSerial { issuer, serial } => {
                cert.issuer().as_raw() == issuer.as_slice()
                    && trim_serial(cert.raw_serial()) == trim_serial(serial)
            }
            Self::SubjectKeyId(key_id) => cert.extensions().iter().any(|ext| {
                matches!(ext.parsed_extension(), ParsedExtension::SubjectKeyIdentifier(ski) if ski.0 == key_id.as_slice())
            }),
        }
    }
}

impl fmt::Display for SignerIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IssuerAndSerial { issuer, serial } => {
                let issuer = X509Name::from_der(issuer)
                    .map(|(_, name)| name.to_string())
                    .unwrap_or_else(|_| hex::encode(issuer));
                write!(f, "issuer={issuer}, serial={}", hex::encode(trim_serial(serial)))
            }
            Self::SubjectKeyId(key_id) => write!(f, "subjectKeyId={}", hex::encode(key_id)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAttributes {
    /// DER of the attributes as a `SET OF`, which is what the signature covers.
    pub der: Vec<u8>,
    pub content_type: Option<String>,
    pub message_digest: Option<Vec<u8>>,
    pub signing_time: Option<DateTime<Utc>>,
}

impl SignedAttributes {
    fn from_cms(attributes: &signed_data::SignedAttributes) -> Result<Self, ParseError> {
        let mut decoded = Self {
            der: attributes.to_der().map_err(malformed)?,
            content_type: None,
            message_digest: None,
            signing_time: None,
        };

        for Attribute { oid: attr_type, values } in attributes.iter() {
            let Some(value) = values.iter().next() else {
                continue;
            };
            match attr_type.to_string().as_str() {
                oid::CONTENT_TYPE => {
                    decoded.content_type = reencode::<ObjectIdentifier>(value)
                        .ok()
                        .map(|oid| oid.to_string())
                }
                oid::MESSAGE_DIGEST => {
                    if value.tag() != Tag::OctetString {
                        return Err(malformed("messageDigest is not an OCTET STRING"));
                    }
                    decoded.message_digest = Some(value.value().to_vec());
                }
                oid::SIGNING_TIME => decoded.signing_time = signing_time(value),
                _ => {}
            }
        }

        Ok(decoded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerInfo {
    pub id: SignerIdentifier,
    pub digest_algorithm: String,
    pub signature_algorithm: String,
    pub signed_attributes: Option<SignedAttributes>,
    pub signature: Vec<u8>,
}

impl SignerInfo {
    fn from_cms(info: &signed_data::SignerInfo) -> Result<Self, ParseError> {
        Ok(Self {
            id: SignerIdentifier::from_sid(&info.sid)?,
            digest_algorithm: info.digest_alg.oid.to_string(),
            signature_algorithm: info.signature_algorithm.oid.to_string(),
            signed_attributes: info
                .signed_attrs
                .as_ref()
                .map(SignedAttributes::from_cms)
                .transpose()?,
            signature: info.signature.as_bytes().to_vec(),
        })
    }
}

/// A signer paired with the single embedded certificate it refers to.
#[derive(Debug, Clone)]
pub struct SignerCertificate {
    pub signer: SignerInfo,
    pub certificate: Arc<[u8]>,
}

impl SignerCertificate {
    pub fn parse_certificate(&self) -> Result<X509Certificate<'_>, ParseError> {
        X509Certificate::from_der(&self.certificate)
            .map(|(_, cert)| cert)
            .map_err(|e| ParseError::Certificate(e.to_string()))
    }
}

/// A detached signature and the document it claims to sign.
#[derive(Debug, Clone)]
pub struct SignedDocument<'a> {
    pub content: &'a [u8],
    pub signers: Vec<SignerCertificate>,
}

impl<'a> SignedDocument<'a> {
    /// Decodes `signature` as DER, falling back to PEM, and pairs every signer
    /// with exactly one embedded certificate.
    pub fn parse(content: &'a [u8], signature: &[u8]) -> Result<Self, ParseError> {
        let signed_data = match decode_signed_data(signature) {
            Ok(signed_data) => signed_data,
            Err(der_error) => {
                debug!("Signature is not DER ({der_error}), trying PEM");
                let block = ::pem::parse(signature).map_err(|_| der_error)?;
                decode_signed_data(block.contents())?
            }
        };

        let certificates = embedded_certificates(&signed_data)?;
        if signed_data.signer_infos.0.is_empty() {
            return Err(ParseError::SignedData("envelope carries no signers".into()));
        }

        let signers = signed_data
            .signer_infos
            .0
            .iter()
            .map(|info| {
                let signer = SignerInfo::from_cms(info)?;
                let certificate = match_certificate(&signer.id, &certificates)?;
                Ok(SignerCertificate {
                    signer,
                    certificate: Arc::from(certificate),
                })
            })
            .collect::<Result<Vec<_>, ParseError>>()?;

        Ok(Self { content, signers })
    }
}

/// Finds the one certificate referenced by `id`; zero or several matches make
/// the envelope unusable.
pub(crate) fn match_certificate<'c>(
    id: &SignerIdentifier,
    certificates: &'c [Vec<u8>],
) -> Result<&'c [u8], ParseError> {
    let matching: Vec<&[u8]> = certificates
        .iter()
        .filter(|der| {
            X509Certificate::from_der(der)
                .map(|(_, cert)| id.matches(&cert))
                .unwrap_or(false)
        })
        .map(Vec::as_slice)
        .collect();

    match matching.as_slice() {
        [single] => Ok(*single),
        _ => Err(ParseError::AmbiguousSigner {
            signer: id.to_string(),
            matches: matching.len(),
        }),
    }
}

fn decode_signed_data(input: &[u8]) -> Result<SignedData, ParseError> {
    let content_info = ContentInfo::from_der(input).map_err(malformed)?;
    let content_type = content_info.content_type.to_string();
    if content_type != oid::SIGNED_DATA {
        return Err(ParseError::SignedData(format!(
            "content type {content_type} is not signedData"
        )));
    }
    reencode::<SignedData>(&content_info.content).map_err(malformed)
}

fn embedded_certificates(signed_data: &SignedData) -> Result<Vec<Vec<u8>>, ParseError> {
    let Some(set) = &signed_data.certificates else {
        return Ok(Vec::new());
    };
    set.0
        .iter()
        .filter_map(|choice| match choice {
            CertificateChoices::Certificate(cert) => Some(cert.to_der().map_err(malformed)),
            _ => None,
        })
        .collect()
}

/// `signingTime` is a UTCTime or GeneralizedTime; UTCTime years 50..99 are 19xx.
fn signing_time(value: &Any) -> Option<DateTime<Utc>> {
    let der = value.to_der().ok()?;
    let (_, time) = ASN1Time::from_der(&der).ok()?;
    asn1_time_to_chrono(time)
}

/// Decodes an open type by re-reading its full encoding.
fn reencode<T: for<'a> Decode<'a>>(value: &Any) -> der::Result<T> {
    T::from_der(&value.to_der()?)
}

fn malformed(error: impl ToString) -> ParseError {
    ParseError::SignedData(error.to_string())
}
