use ring::{
    digest,
    signature::{self, UnparsedPublicKey, VerificationAlgorithm},
};
use thiserror::Error;
use x509_parser::prelude::*;

use super::{SignerInfo, dictionary::oid};

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("Unsupported digest algorithm {0}")]
    UnsupportedDigest(String),

    #[error("Unsupported signature algorithm {signature} for key type {key}")]
    UnsupportedSignature { signature: String, key: String },

    #[error("Signed attributes carry no message digest")]
    MissingMessageDigest,

    #[error("Message digest does not match the document")]
    DigestMismatch,

    #[error("Signature value does not verify")]
    InvalidSignature,
}

fn digest_algorithm(algorithm: &str) -> Result<&'static digest::Algorithm, SignatureError> {
    match algorithm {
        oid::SHA1 => Ok(&digest::SHA1_FOR_LEGACY_USE_ONLY),
        oid::SHA256 => Ok(&digest::SHA256),
        oid::SHA384 => Ok(&digest::SHA384),
        oid::SHA512 => Ok(&digest::SHA512),
        other => Err(SignatureError::UnsupportedDigest(other.to_string())),
    }
}

/// Picks the verification algorithm from the signer's algorithms and the
/// certificate's key type. EC curves are told apart by the point length.
fn verification_algorithm(
    signer: &SignerInfo,
    key_algorithm: &str,
    key: &[u8],
) -> Result<&'static dyn VerificationAlgorithm, SignatureError> {
    let hash = match signer.signature_algorithm.as_str() {
        oid::SHA1_WITH_RSA => oid::SHA1,
        oid::SHA256_WITH_RSA | oid::ECDSA_WITH_SHA256 => oid::SHA256,
        oid::SHA384_WITH_RSA | oid::ECDSA_WITH_SHA384 => oid::SHA384,
        oid::SHA512_WITH_RSA | oid::ECDSA_WITH_SHA512 => oid::SHA512,
        _ => signer.digest_algorithm.as_str(),
    };

    let algorithm: Option<&'static dyn VerificationAlgorithm> = match (key_algorithm, hash) {
        (oid::RSA_ENCRYPTION, oid::SHA1) => {
            Some(&signature::RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY)
        }
        (oid::RSA_ENCRYPTION, oid::SHA256) => Some(&signature::RSA_PKCS1_2048_8192_SHA256),
        (oid::RSA_ENCRYPTION, oid::SHA384) => Some(&signature::RSA_PKCS1_2048_8192_SHA384),
        (oid::RSA_ENCRYPTION, oid::SHA512) => Some(&signature::RSA_PKCS1_2048_8192_SHA512),
        (oid::EC_PUBLIC_KEY, oid::SHA256) if key.len() == 65 => {
            Some(&signature::ECDSA_P256_SHA256_ASN1)
        }
        (oid::EC_PUBLIC_KEY, oid::SHA384) if key.len() == 65 => {
            Some(&signature::ECDSA_P256_SHA384_ASN1)
        }
        (oid::EC_PUBLIC_KEY, oid::SHA256) if key.len() == 97 => {
            Some(&signature::ECDSA_P384_SHA256_ASN1)
        }
        (oid::EC_PUBLIC_KEY, oid::SHA384) if key.len() == 97 => {
            Some(&signature::ECDSA_P384_SHA384_ASN1)
        }
        (oid::ED25519, _) => Some(&signature::ED25519),
        _ => None,
    };

    algorithm.ok_or_else(|| SignatureError::UnsupportedSignature {
        signature: signer.signature_algorithm.clone(),
        key: key_algorithm.to_string(),
    })
}

/// Verifies the signer's signature over `content` with the public key of
/// `certificate`.
///
/// With signed attributes present, the `messageDigest` attribute must match
/// the document and the signature covers the DER `SET OF` attribute block.
pub fn verify_content(
    signer: &SignerInfo,
    content: &[u8],
    certificate: &X509Certificate<'_>,
) -> Result<(), SignatureError> {
    let spki = certificate.public_key();
    let key_algorithm = spki.algorithm.algorithm.to_id_string();
    let key: &[u8] = &spki.subject_public_key.data;
    let algorithm = verification_algorithm(signer, &key_algorithm, key)?;

    let signed_bytes: &[u8] = match &signer.signed_attributes {
        Some(attributes) => {
            let expected = attributes
                .message_digest
                .as_deref()
                .ok_or(SignatureError::MissingMessageDigest)?;
            let actual = digest::digest(digest_algorithm(&signer.digest_algorithm)?, content);
            if actual.as_ref() != expected {
                return Err(SignatureError::DigestMismatch);
            }
            &attributes.der
        }
        None => content,
    };

    UnparsedPublicKey::new(algorithm, key)
        .verify(signed_bytes, &signer.signature)
        .map_err(|_| SignatureError::InvalidSignature)
}
