//! Fixed codes and texts reported to verification callers.

pub const CHECK_SIGNED_DATA: &str = "checkSignedData";
pub const CHECK_SIGNED_DATA_DESCRIPTION: &str =
    "Checks that the document content matches the signature";

pub const CHECK_KEY_USAGE: &str = "checkKeyUsage";
pub const CHECK_KEY_USAGE_DESCRIPTION: &str =
    "Checks that the certificate key may be used to sign documents";

pub const CHECK_CERTIFICATE_POLICY: &str = "checkCertificatePolicy";
pub const CHECK_CERTIFICATE_POLICY_DESCRIPTION: &str =
    "Checks the certificate policy and the class of the signature tool";

pub const CHECK_CERT_CHAIN: &str = "checkCertChain";
pub const CHECK_CERT_CHAIN_DESCRIPTION: &str =
    "Checks that a certificate chain exists from a trusted certificate to the signature certificate";

pub const CHECK_CERT_CHAIN_WITH_CRL: &str = "checkCertChainWithCRL";
pub const CHECK_CERT_CHAIN_WITH_CRL_DESCRIPTION: &str = "Checks that a certificate chain exists from a \
     trusted certificate to the signature certificate, taking revocation lists into account";

pub const SIGNATURE_MATCHES_CONTENT: &str = "The signature matches the document content";
pub const SIGNATURE_DOES_NOT_MATCH_CONTENT: &str =
    "The signature does not match the document content";

pub const KEY_USAGE_VALID: &str = "The signature certificate sets the keyUsage flags: digital signature, \
     non-repudiation, key encipherment, data encipherment";

pub const POLICY_CONFIRMED: &str = "Certificate policy confirmed. Signature tool class";
pub const POLICY_NOT_CONFIRMED: &str = "Certificate policy not confirmed. The signature tool class \
     could not be determined, check the certificatePolicies extension";

pub const CHAIN_VALID: &str = "Certificate chain built successfully";
pub const CHAIN_VALID_WITH_CRL: &str =
    "Certificate chain built successfully (revocation lists taken into account)";
pub const CHAIN_INVALID: &str = "Certificate chain could not be built. One of the intermediate \
     certificates may be missing or invalid";
pub const CHAIN_INVALID_WITH_CRL: &str = "Certificate chain could not be built. One of the \
     intermediate certificates may be missing or invalid, or no revocation list was found for it";
pub const CERTIFICATE_EXPIRED: &str = "A certificate in the chain has expired";
pub const CERTIFICATE_NOT_YET_VALID: &str = "A certificate in the chain is not yet valid";
pub const CERTIFICATE_REVOKED: &str = "A certificate in the chain has been revoked";

pub const ERROR_UPLOADING_SIGNATURE: &str = "ERROR_UPLOADING_SIGNATURE";
pub const ERROR_UPLOADING_SIGNATURE_MESSAGE: &str =
    "The document or signature could not be read from the request";
pub const SIGNATURE_INVALID_FORMAT: &str = "SIGNATURE_INVALID_FORMAT";
pub const SIGNATURE_INVALID_FORMAT_MESSAGE: &str =
    "The signature is not a supported CMS signed-data envelope";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
pub const INTERNAL_ERROR_MESSAGE: &str = "The service has encountered an unexpected internal state";
