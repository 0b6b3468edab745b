//! Static OID tables used for signature verification and for the
//! human-readable certificate description.

pub mod oid {
    // Digest algorithms
    pub const SHA1: &str = "1.3.14.3.2.26";
    pub const SHA224: &str = "2.16.840.1.101.3.4.2.4";
    pub const SHA256: &str = "2.16.840.1.101.3.4.2.1";
    pub const SHA384: &str = "2.16.840.1.101.3.4.2.2";
    pub const SHA512: &str = "2.16.840.1.101.3.4.2.3";
    pub const GOST_R3411_94: &str = "1.2.643.2.2.9";
    pub const GOST_R3411_2012_256: &str = "1.2.643.7.1.1.2.2";
    pub const GOST_R3411_2012_512: &str = "1.2.643.7.1.1.2.3";

    // Public key and signature algorithms
    pub const RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
    pub const SHA1_WITH_RSA: &str = "1.2.840.113549.1.1.5";
    pub const SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
    pub const SHA384_WITH_RSA: &str = "1.2.840.113549.1.1.12";
    pub const SHA512_WITH_RSA: &str = "1.2.840.113549.1.1.13";
    pub const EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
    pub const ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";
    pub const ECDSA_WITH_SHA384: &str = "1.2.840.10045.4.3.3";
    pub const ECDSA_WITH_SHA512: &str = "1.2.840.10045.4.3.4";
    pub const ED25519: &str = "1.3.101.112";
    pub const GOST_R3410_2001: &str = "1.2.643.2.2.19";
    pub const GOST_R3410_2012_256: &str = "1.2.643.7.1.1.1.1";
    pub const GOST_R3410_2012_512: &str = "1.2.643.7.1.1.1.2";
    pub const GOST_R3411_94_WITH_R3410_2001: &str = "1.2.643.2.2.3";
    pub const GOST_R3411_2012_256_WITH_R3410_2012: &str = "1.2.643.7.1.1.3.2";
    pub const GOST_R3411_2012_512_WITH_R3410_2012: &str = "1.2.643.7.1.1.3.3";

    // CMS
    pub const SIGNED_DATA: &str = "1.2.840.113549.1.7.2";
    pub const CONTENT_TYPE: &str = "1.2.840.113549.1.9.3";
    pub const MESSAGE_DIGEST: &str = "1.2.840.113549.1.9.4";
    pub const SIGNING_TIME: &str = "1.2.840.113549.1.9.5";

    // Distinguished name attributes
    pub const COMMON_NAME: &str = "2.5.4.3";
    pub const SURNAME: &str = "2.5.4.4";
    pub const COUNTRY: &str = "2.5.4.6";
    pub const LOCALITY: &str = "2.5.4.7";
    pub const STATE: &str = "2.5.4.8";
    pub const STREET: &str = "2.5.4.9";
    pub const ORGANIZATION: &str = "2.5.4.10";
    pub const ORGANIZATION_UNIT: &str = "2.5.4.11";
    pub const TITLE: &str = "2.5.4.12";
    pub const GIVEN_NAME: &str = "2.5.4.42";
    pub const EMAIL: &str = "1.2.840.113549.1.9.1";
    pub const OGRN: &str = "1.2.643.100.1";
    pub const SNILS: &str = "1.2.643.100.3";
    pub const OGRNIP: &str = "1.2.643.100.5";
    pub const INN: &str = "1.2.643.3.131.1.1";

    // Extended key usages
    pub const ANY_EXTENDED_KEY_USAGE: &str = "2.5.29.37.0";
    pub const SERVER_AUTH: &str = "1.3.6.1.5.5.7.3.1";
    pub const CLIENT_AUTH: &str = "1.3.6.1.5.5.7.3.2";
    pub const CODE_SIGNING: &str = "1.3.6.1.5.5.7.3.3";
    pub const EMAIL_PROTECTION: &str = "1.3.6.1.5.5.7.3.4";
    pub const TIME_STAMPING: &str = "1.3.6.1.5.5.7.3.8";
    pub const OCSP_SIGNING: &str = "1.3.6.1.5.5.7.3.9";

    // Electronic signature tool classes
    pub const POLICY_KS1: &str = "1.2.643.100.113.1";
    pub const POLICY_KS2: &str = "1.2.643.100.113.2";
    pub const POLICY_KS3: &str = "1.2.643.100.113.3";
    pub const POLICY_KV1: &str = "1.2.643.100.113.4";
    pub const POLICY_KV2: &str = "1.2.643.100.113.5";
    pub const POLICY_KA1: &str = "1.2.643.100.113.6";
}

/// Signature tool classes ordered from weakest to strongest. A certificate
/// belongs to a class when it carries the policy OIDs of that class and of
/// every class before it.
pub const POLICY_CLASSES: [(&str, &str); 6] = [
    (oid::POLICY_KS1, "KS1"),
    (oid::POLICY_KS2, "KS2"),
    (oid::POLICY_KS3, "KS3"),
    (oid::POLICY_KV1, "KV1"),
    (oid::POLICY_KV2, "KV2"),
    (oid::POLICY_KA1, "KA1"),
];

pub fn algorithm_name(algorithm: &str) -> Option<&'static str> {
    let name = match algorithm {
        oid::SHA1 => "SHA-1",
        oid::SHA224 => "SHA-224",
        oid::SHA256 => "SHA-256",
        oid::SHA384 => "SHA-384",
        oid::SHA512 => "SHA-512",
        oid::GOST_R3411_94 => "GOST R 34.11-94",
        oid::GOST_R3411_2012_256 => "GOST R 34.11-2012 (256 bit)",
        oid::GOST_R3411_2012_512 => "GOST R 34.11-2012 (512 bit)",
        oid::RSA_ENCRYPTION => "RSA",
        oid::SHA1_WITH_RSA => "SHA-1 with RSA",
        oid::SHA256_WITH_RSA => "SHA-256 with RSA",
        oid::SHA384_WITH_RSA => "SHA-384 with RSA",
        oid::SHA512_WITH_RSA => "SHA-512 with RSA",
        oid::EC_PUBLIC_KEY => "ECDSA",
        oid::ECDSA_WITH_SHA256 => "ECDSA with SHA-256",
        oid::ECDSA_WITH_SHA384 => "ECDSA with SHA-384",
        oid::ECDSA_WITH_SHA512 => "ECDSA with SHA-512",
        oid::ED25519 => "Ed25519",
        oid::GOST_R3410_2001 => "GOST R 34.10-2001",
        oid::GOST_R3410_2012_256 => "GOST R 34.10-2012 (256 bit)",
        oid::GOST_R3410_2012_512 => "GOST R 34.10-2012 (512 bit)",
        oid::GOST_R3411_94_WITH_R3410_2001 => "GOST R 34.11-94 with GOST R 34.10-2001",
        oid::GOST_R3411_2012_256_WITH_R3410_2012 => {
            "GOST R 34.11-2012 with GOST R 34.10-2012 (256 bit)"
        }
        oid::GOST_R3411_2012_512_WITH_R3410_2012 => {
            "GOST R 34.11-2012 with GOST R 34.10-2012 (512 bit)"
        }
        _ => return None,
    };
    Some(name)
}

pub fn extended_key_usage_name(usage: &str) -> Option<&'static str> {
    let name = match usage {
        oid::ANY_EXTENDED_KEY_USAGE => "Any purpose",
        oid::SERVER_AUTH => "Server authentication",
        oid::CLIENT_AUTH => "Client authentication",
        oid::CODE_SIGNING => "Code signing",
        oid::EMAIL_PROTECTION => "Secure email",
        oid::TIME_STAMPING => "Time stamping",
        oid::OCSP_SIGNING => "OCSP signing",
        "1.2.643.2.2.34.6" => "Registration center user",
        "1.2.643.2.2.34.25" => "Time stamping service user",
        "1.2.643.2.2.34.26" => "Certificate status service user",
        "1.2.643.5.3.48.1" => "Lipetsk region finance department user",
        "1.2.643.5.3.40.1" => "Kaluga region finance department user",
        "1.2.643.2.23.3" => "Samara region finance department user",
        "1.2.643.3.41.1.3.4" => "Kurgan region finance department user",
        "1.2.643.7.2.21.1.2" => "Consolidated register submissions",
        "1.2.643.3.89.24" => "zapret-info.gov.ru user",
        "1.2.643.6.3.1.1" => "Electronic trading platform auctions",
        "1.2.643.6.3.1.3.1" => "Procurement participant",
        "1.2.643.6.3.1.2.1" => "Legal entity",
        "1.2.643.6.3.1.2.2" => "Individual",
        "1.2.643.6.3.1.2.3" => "Sole proprietor",
        "1.2.643.5.5.66.1" => "MTP electronic trading system",
        "1.2.643.3.8.100.1.42" => "Qualified signature on www.utpl.ru",
        "1.2.643.6.3.1.4.1" => "Organization administrator",
        "1.2.643.6.3.1.4.2" => "Authorized specialist",
        "1.2.643.6.3.1.4.3" => "Specialist entitled to sign contracts",
        "1.2.643.6.17" => "Gazprombank",
        "1.2.643.3.8.100.1.19" => "UralBidIn",
        "1.2.643.3.61.502710.1.6.3.4.1.1" => "Trading platform customer: organization administrator",
        "1.2.643.3.61.502710.1.6.3.4.1.2" => "Trading platform customer: authorized specialist",
        "1.2.643.3.61.502710.1.6.3.4.1.3" => {
            "Trading platform customer: specialist entitled to sign contracts"
        }
        "1.2.643.3.61.502710.1.6.3.4.1.4" => {
            "Trading platform customer: specialist entitled to send contract drafts"
        }
        "1.2.643.3.61.502710.1.6.3.4.2" => "Trading platform authorized organization",
        "1.2.643.3.61.502710.1.6.3.4.2.1" => "Trading platform authorized organization: administrator",
        "1.2.643.3.61.502710.1.6.3.4.2.2" => {
            "Trading platform authorized organization: authorized specialist"
        }
        "1.2.643.3.61.502710.1.6.3.4.2.3" => {
            "Trading platform authorized organization: specialist entitled to send contract drafts"
        }
        "1.2.643.3.61.502710.1.6.3.4.2.4" => {
            "Trading platform authorized organization: official entitled to sign contracts"
        }
        "1.2.643.3.61.502710.1.6.3.4.2.5" => {
            "Trading platform authorized organization: specialist entitled to approve orders"
        }
        "1.2.643.7.2.50.1.2" => "Unified identification and authentication system user",
        "1.2.643.3.215.4" | "1.2.643.3.215.6" | "1.2.643.3.215.7" | "1.2.643.3.215.8"
        | "1.2.643.3.215.9" | "1.2.643.3.215.11" | "1.2.643.3.215.12" | "1.2.643.3.215.13" => {
            "Federal Customs Service"
        }
        "1.2.643.5.1.31.1" => "Federal Financial Markets Service",
        "1.2.643.3.89.21" => "Federal Agency for State Property Management",
        "1.2.643.3.7.3.3" => "Federal Tariff Service",
        "1.2.643.5.1.24.2.1.3.1" => "Rosreestr: cadastral engineer",
        "1.2.643.5.1.24.2.30" => "Rosreestr: state register request for legal entities",
        "1.2.643.5.1.24.2.1.3" => "Rosreestr: state register request for individuals",
        "1.2.643.5.1.24.2.27" => "Rosreestr: insolvency practitioner",
        "1.2.643.5.1.24.2.8" => "Rosreestr: judge",
        "1.2.643.5.1.24.2.49" => "Rosreestr: authority representative",
        "1.2.643.5.1.24.3.3.10" => "Rosreestr: credit institution",
        "1.2.643.5.1.24.2.48" => "Rosreestr: buildings, structures and unfinished construction",
        "1.2.643.5.1.24.2.15" => "Rosreestr: law enforcement agency",
        "1.2.643.5.1.24.2.26" => "Rosreestr: notary",
        "1.2.643.5.1.24.2.14" => "Rosreestr: bailiff",
        "1.2.643.100.2.1" => "SMEV and Rosreestr: authority representative",
        "1.2.643.5.1.24.2.6" => "SMEV and Rosreestr: regional state authority",
        "1.2.643.5.1.24.2.20" => "SMEV and Rosreestr: federal executive authority",
        "1.2.643.5.1.24.2.43" => {
            "SMEV and Rosreestr: territorial body of a federal executive authority"
        }
        "1.2.643.5.1.24.2.19" => "SMEV and Rosreestr: local government",
        "1.2.643.5.1.24.2.5" => "SMEV and Rosreestr: local government municipal property office",
        "1.2.643.5.1.24.2.44" => "SMEV and Rosreestr: head or authorized officer of an authority",
        "1.2.643.3.58.2.1.6" => "SMEV and Rosreestr: signature owner identifier",
        "1.2.643.5.1.24.2.53" => "SMEV and Rosreestr: subordinate organization of an authority",
        "1.2.643.5.1.24.2.52" => "SMEV and Rosreestr: territorial body of a state extra-budgetary fund",
        "1.2.643.5.1.24.2.51" => "SMEV and Rosreestr: state extra-budgetary fund",
        "1.2.643.100.2.2" => "SMEV: government authority",
        "1.2.643.5.1.28.2" => "Federal alcohol market declaration system",
        "1.2.643.2.64.1.1.1" => "Unified federal register of legal entity facts",
        "1.2.643.3.58.2.1.3" => "Certification authority engineer",
        _ => return None,
    };
    Some(name)
}

pub fn policy_name(policy: &str) -> Option<&'static str> {
    let name = match policy {
        oid::POLICY_KS1 => "Signature tool class KS1",
        oid::POLICY_KS2 => "Signature tool class KS2",
        oid::POLICY_KS3 => "Signature tool class KS3",
        oid::POLICY_KV1 => "Signature tool class KV1",
        oid::POLICY_KV2 => "Signature tool class KV2",
        oid::POLICY_KA1 => "Signature tool class KA1",
        "2.5.29.32.0" => "Any policy",
        _ => return None,
    };
    Some(name)
}
