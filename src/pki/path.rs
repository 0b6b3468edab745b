//! Certification path building with optional CRL enforcement.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};
use x509_parser::prelude::*;

use super::{Certificate, Crl};

/// Longest path, in certificates below the anchor, the builder will try.
pub const MAX_PATH_DEPTH: usize = 16;

/// Why no acceptable path exists. Variants are ordered from least to most
/// specific; when several candidate paths fail the most specific reason wins.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PathError {
    #[error("No certification path to a trust anchor could be built")]
    NoPath,

    #[error("Certificate is not yet valid")]
    NotYetValid,

    #[error("Certificate has expired")]
    Expired,

    #[error("Certificate has been revoked")]
    Revoked,
}

/// Snapshot of anchors, intermediates and optional CRLs for one validation.
#[derive(Debug, Default)]
pub struct PathValidator {
    anchors: Vec<Vec<u8>>,
    intermediates: Vec<Vec<u8>>,
    crls: Option<Vec<Crl>>,
}

impl PathValidator {
    pub fn new(anchors: &[Certificate], intermediates: &[Certificate]) -> Self {
        Self {
            anchors: decode_all(anchors.iter().map(|c| (c.serial_number.as_str(), c.to_der()))),
            intermediates: decode_all(
                intermediates
                    .iter()
                    .map(|c| (c.serial_number.as_str(), c.to_der())),
            ),
            crls: None,
        }
    }

    /// Adds a DER certificate to the intermediate pool.
    pub fn with_intermediate_der(mut self, der: &[u8]) -> Self {
        self.intermediates.push(der.to_vec());
        self
    }

    /// Turns on revocation checking against `crls`.
    pub fn with_crls(mut self, crls: &[Crl]) -> Self {
        self.crls = Some(crls.to_vec());
        self
    }

    pub fn checks_revocation(&self) -> bool {
        self.crls.is_some()
    }

    /// Returns the length, anchor included, of the first acceptable path from
    /// `target` to an anchor.
    pub fn validate(&self, target: &[u8], at: DateTime<Utc>) -> Result<usize, PathError> {
        let (_, target) = X509Certificate::from_der(target).map_err(|_| PathError::NoPath)?;
        let crl_ders = self.crls.as_ref().map(|crls| current_crls(crls, at));

        let search = Search {
            anchors: parse_certificates(&self.anchors),
            pool: parse_certificates(&self.intermediates),
            crls: crl_ders.as_ref().map(|ders| {
                ders.iter()
                    .filter_map(|der| CertificateRevocationList::from_der(der).ok())
                    .map(|(_, crl)| crl)
                    .collect()
            }),
            at: at.timestamp(),
        };

        let mut path = vec![&target];
        let mut failure = None;
        if search.extend(&mut path, &mut failure) {
            debug!(length = path.len() + 1, "Certification path built");
            Ok(path.len() + 1)
        } else {
            Err(failure.unwrap_or(PathError::NoPath))
        }
    }
}

fn decode_all<'a>(
    items: impl Iterator<Item = (&'a str, Result<Vec<u8>, super::ParseError>)>,
) -> Vec<Vec<u8>> {
    items
        .filter_map(|(id, der)| match der {
            Ok(der) => Some(der),
            Err(e) => {
                warn!(id, error = %e, "Skipping undecodable trust store entry");
                None
            }
        })
        .collect()
}

/// DER of the CRLs in effect at `at`; the others cannot vouch for anything.
fn current_crls(crls: &[Crl], at: DateTime<Utc>) -> Vec<Vec<u8>> {
    let current = crls.iter().filter(|crl| {
        let current = crl.is_current_at(at);
        if !current {
            debug!(url = %crl.url, "Ignoring CRL outside its validity window");
        }
        current
    });
    decode_all(current.map(|crl| (crl.url.as_str(), crl.to_der())))
}

fn parse_certificates(ders: &[Vec<u8>]) -> Vec<X509Certificate<'_>> {
    ders.iter()
        .filter_map(|der| X509Certificate::from_der(der).ok())
        .map(|(_, cert)| cert)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Good,
    Revoked,
    Unknown,
}

struct Search<'a> {
    anchors: Vec<X509Certificate<'a>>,
    pool: Vec<X509Certificate<'a>>,
    crls: Option<Vec<CertificateRevocationList<'a>>>,
    at: i64,
}

impl<'a> Search<'a> {
    /// Depth-first extension of `path`, whose last element still needs an issuer.
    fn extend<'p>(
        &'p self,
        path: &mut Vec<&'p X509Certificate<'a>>,
        failure: &mut Option<PathError>,
    ) -> bool {
        let Some(&current) = path.last() else {
            return false;
        };

        if let Err(e) = self.check_validity(current) {
            record(failure, e);
            return false;
        }
        if path.len() > MAX_PATH_DEPTH {
            record(failure, PathError::NoPath);
            return false;
        }

        for anchor in self.anchors.iter().filter(|a| issued_by(current, a)) {
            match self.check_revocation(path, anchor) {
                Ok(()) => return true,
                Err(e) => record(failure, e),
            }
        }

        for issuer in &self.pool {
            let already_used = path
                .iter()
                .any(|c| c.tbs_certificate.as_ref() == issuer.tbs_certificate.as_ref());
            if already_used || !is_ca(issuer) || !issued_by(current, issuer) {
                continue;
            }
            path.push(issuer);
            if self.extend(path, failure) {
                return true;
            }
            path.pop();
        }

        record(failure, PathError::NoPath);
        false
    }

    fn check_validity(&self, cert: &X509Certificate<'_>) -> Result<(), PathError> {
        let validity = cert.validity();
        if self.at < validity.not_before.timestamp() {
            Err(PathError::NotYetValid)
        } else if self.at > validity.not_after.timestamp() {
            Err(PathError::Expired)
        } else {
            Ok(())
        }
    }

    /// Checks every non-anchor certificate of a complete path. A revoked
    /// member outranks a member without a usable CRL.
    fn check_revocation(
        &self,
        path: &[&X509Certificate<'a>],
        anchor: &X509Certificate<'a>,
    ) -> Result<(), PathError> {
        let Some(crls) = &self.crls else {
            return Ok(());
        };

        let issuers = path.iter().skip(1).copied().chain(std::iter::once(anchor));
        let statuses: Vec<Status> = path
            .iter()
            .zip(issuers)
            .map(|(cert, issuer)| self.status(crls, cert, issuer))
            .collect();

        if statuses.contains(&Status::Revoked) {
            Err(PathError::Revoked)
        } else if statuses.contains(&Status::Unknown) {
            Err(PathError::NoPath)
        } else {
            Ok(())
        }
    }

    fn status(
        &self,
        crls: &[CertificateRevocationList<'a>],
        cert: &X509Certificate<'_>,
        issuer: &X509Certificate<'_>,
    ) -> Status {
        let serial = cert.tbs_certificate.serial.to_bytes_be();
        let issuer_key = key_identifier(issuer.extensions(), false);
        let mut status = Status::Unknown;

        for crl in crls {
            if crl.issuer().as_raw() != cert.issuer().as_raw() {
                continue;
            }
            if let (Some(crl_key), Some(issuer_key)) =
                (key_identifier(crl.extensions(), true), issuer_key)
            {
                if crl_key != issuer_key {
                    continue;
                }
            }
            if x509_parser::verify::verify_signature(
                issuer.public_key(),
                &crl.signature_algorithm,
                &crl.signature_value,
                crl.tbs_cert_list.as_ref(),
            )
            .is_err()
            {
                warn!(issuer = %crl.issuer(), "CRL signature verification failed");
                continue;
            }

            let revoked = crl
                .iter_revoked_certificates()
                .any(|entry| entry.user_certificate.to_bytes_be() == serial);
            if revoked {
                debug!(serial = %hex::encode(&serial), "Certificate found on CRL");
                return Status::Revoked;
            }
            status = Status::Good;
        }
        status
    }
}

fn record(failure: &mut Option<PathError>, error: PathError) {
    if failure.is_none_or(|current| error > current) {
        *failure = Some(error);
    }
}

fn issued_by(cert: &X509Certificate<'_>, issuer: &X509Certificate<'_>) -> bool {
    cert.issuer().as_raw() == issuer.subject().as_raw()
        && cert.verify_signature(Some(issuer.public_key())).is_ok()
}

fn is_ca(cert: &X509Certificate<'_>) -> bool {
    matches!(cert.basic_constraints(), Ok(Some(constraints)) if constraints.value.ca)
}

fn key_identifier<'a>(extensions: &'a [X509Extension<'_>], authority: bool) -> Option<&'a [u8]> {
    extensions
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::SubjectKeyIdentifier(ski) if !authority => Some(ski.0),
            ParsedExtension::AuthorityKeyIdentifier(aki) if authority => {
                aki.key_identifier.as_ref().map(|id| id.0)
            }
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, Pki};
    use chrono::Duration;

    fn parsed(der: &[u8], trusted: bool) -> Certificate {
        Certificate::from_der(der).unwrap().with_trusted(trusted)
    }

    fn crl(der: Vec<u8>) -> Crl {
        Crl::from_der(&der, "http://crl.test/x.crl").unwrap()
    }

    #[test]
    fn test_valid_path_without_revocation() {
        let pki = Pki::new();
        let validator = PathValidator::new(
            &[parsed(&pki.root.der, true)],
            &[parsed(&pki.intermediate.der, false)],
        );

        assert_eq!(validator.validate(&pki.leaf.der, Utc::now()), Ok(3));
        assert!(!validator.checks_revocation());
    }

    #[test]
    fn test_missing_anchor_is_no_path() {
        let pki = Pki::new();
        let validator = PathValidator::new(
            &[],
            &[parsed(&pki.intermediate.der, false), parsed(&pki.root.der, false)],
        );

        assert_eq!(
            validator.validate(&pki.leaf.der, Utc::now()),
            Err(PathError::NoPath)
        );
    }

    #[test]
    fn test_expired_and_not_yet_valid() {
        let pki = Pki::new();
        let validator = PathValidator::new(
            &[parsed(&pki.root.der, true)],
            &[parsed(&pki.intermediate.der, false)],
        );

        assert_eq!(
            validator.validate(&pki.leaf.der, Utc::now() + Duration::days(3650)),
            Err(PathError::Expired)
        );
        assert_eq!(
            validator.validate(&pki.leaf.der, Utc::now() - Duration::days(30)),
            Err(PathError::NotYetValid)
        );
    }

    #[test]
    fn test_revocation_checked_when_crls_supplied() {
        let pki = Pki::new();
        let anchors = [parsed(&pki.root.der, true)];
        let pool = [parsed(&pki.intermediate.der, false)];

        let clean = PathValidator::new(&anchors, &pool).with_crls(&[
            crl(test_support::crl(&pki.root, &[])),
            crl(test_support::crl(&pki.intermediate, &[])),
        ]);
        assert_eq!(clean.validate(&pki.leaf.der, Utc::now()), Ok(3));

        let revoked = PathValidator::new(&anchors, &pool).with_crls(&[
            crl(test_support::crl(&pki.root, &[test_support::INTERMEDIATE_SERIAL])),
            crl(test_support::crl(&pki.intermediate, &[])),
        ]);
        assert_eq!(
            revoked.validate(&pki.leaf.der, Utc::now()),
            Err(PathError::Revoked)
        );

        let without_leaf_crl = PathValidator::new(&anchors, &pool)
            .with_crls(&[crl(test_support::crl(&pki.root, &[test_support::INTERMEDIATE_SERIAL]))]);
        assert_eq!(
            without_leaf_crl.validate(&pki.leaf.der, Utc::now()),
            Err(PathError::Revoked)
        );
    }

    #[test]
    fn test_missing_or_stale_crl_is_no_path() {
        let pki = Pki::new();
        let anchors = [parsed(&pki.root.der, true)];
        let pool = [parsed(&pki.intermediate.der, false)];

        let missing = PathValidator::new(&anchors, &pool)
            .with_crls(&[crl(test_support::crl(&pki.root, &[]))]);
        assert_eq!(
            missing.validate(&pki.leaf.der, Utc::now()),
            Err(PathError::NoPath)
        );

        let stale = PathValidator::new(&anchors, &pool).with_crls(&[
            crl(test_support::crl(&pki.root, &[])),
            crl(test_support::crl(&pki.intermediate, &[])),
        ]);
        assert_eq!(
            stale.validate(&pki.leaf.der, Utc::now() + Duration::days(30)),
            Err(PathError::NoPath)
        );
    }

    #[test]
    fn test_crl_from_wrong_issuer_is_ignored() {
        let pki = Pki::new();
        let other = Pki::new();
        let validator = PathValidator::new(
            &[parsed(&pki.root.der, true)],
            &[parsed(&pki.intermediate.der, false)],
        )
        .with_crls(&[
            crl(test_support::crl(&pki.root, &[])),
            crl(test_support::crl(&other.intermediate, &[test_support::LEAF_SERIAL])),
        ]);

        assert_eq!(
            validator.validate(&pki.leaf.der, Utc::now()),
            Err(PathError::NoPath)
        );
    }

    #[test]
    fn test_leaf_in_intermediate_pool() {
        let pki = Pki::new();
        let validator = PathValidator::new(
            &[parsed(&pki.root.der, true)],
            &[parsed(&pki.intermediate.der, false)],
        )
        .with_intermediate_der(&pki.leaf.der);

        assert_eq!(validator.validate(&pki.leaf.der, Utc::now()), Ok(3));
    }
}
