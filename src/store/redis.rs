use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, aio::ConnectionManager};
use serde::de::DeserializeOwned;

use crate::pki::{Certificate, Crl, CrlUrl};
use crate::store::{CertificateStore, CrlStore, CrlUrlStore, Result};

const CERTIFICATES: &str = "certs";
const TRUSTED_FLAGS: &str = "cert:trusted";
const CRLS: &str = "crls";
const CRL_URLS: &str = "crl_urls";

fn certificate_key(serial: &str) -> String {
    format!("cert:{serial}")
}

fn subject_key_index(subject_key: &str) -> String {
    format!("cert:ski:{subject_key}")
}

fn crl_key(url: &str) -> String {
    format!("crl:{url}")
}

fn crl_issuer_index(issuer_key: &str) -> String {
    format!("crl:issuer:{issuer_key}")
}

fn crl_url_key(url: &str) -> String {
    format!("crl_url:{url}")
}

async fn get_records<T: DeserializeOwned>(
    conn: &mut ConnectionManager,
    keys: &[String],
) -> Result<Vec<T>> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    let values: Vec<Option<String>> = conn.mget(keys).await?;
    values
        .into_iter()
        .flatten()
        .map(|json| serde_json::from_str(&json).map_err(Into::into))
        .collect()
}

/// A Redis certificate store.
///
/// Records are JSON under `cert:{serial}`. The trusted flag lives in the
/// `cert:trusted` hash and is written with `HSETNX`, so the first insert of a
/// serial number decides it.
#[derive(Clone)]
pub struct RedisCertificateStore {
    conn: ConnectionManager,
}

impl RedisCertificateStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    async fn load(&self, serials: &[String]) -> Result<Vec<Certificate>> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = serials.iter().map(|s| certificate_key(s)).collect();
        let mut certificates: Vec<Certificate> = get_records(&mut conn, &keys).await?;
        if certificates.is_empty() {
            return Ok(certificates);
        }

        let fields: Vec<&str> = certificates
            .iter()
            .map(|c| c.serial_number.as_str())
            .collect();
        let flags: Vec<Option<String>> = redis::cmd("HMGET")
            .arg(TRUSTED_FLAGS)
            .arg(&fields)
            .query_async(&mut conn)
            .await?;
        for (certificate, flag) in certificates.iter_mut().zip(flags) {
            if let Some(flag) = flag {
                certificate.trusted = flag == "1";
            }
        }
        Ok(certificates)
    }

    async fn delete_where(&self, trusted: bool) -> Result<usize> {
        let mut conn = self.conn.clone();
        let serials: Vec<String> = conn.smembers(CERTIFICATES).await?;
        let certificates = self.load(&serials).await?;

        let mut removed = 0;
        for certificate in certificates.iter().filter(|c| c.trusted == trusted) {
            let serial = &certificate.serial_number;
            let mut pipe = redis::pipe();
            pipe.atomic()
                .del(certificate_key(serial))
                .srem(CERTIFICATES, serial)
                .hdel(TRUSTED_FLAGS, serial);
            if let Some(key) = &certificate.subject_key {
                pipe.srem(subject_key_index(key), serial);
            }
            let _: () = pipe.query_async(&mut conn).await?;
            removed += 1;
        }
        Ok(removed)
    }
}

#[async_trait]
impl CertificateStore for RedisCertificateStore {
    async fn save_certificate(&self, certificate: Certificate) -> Result<()> {
        let mut conn = self.conn.clone();
        let serial = certificate.serial_number.clone();
        let previous: Option<String> = conn.get(certificate_key(&serial)).await?;

        let mut pipe = redis::pipe();
        pipe.atomic()
            .set(certificate_key(&serial), serde_json::to_string(&certificate)?)
            .sadd(CERTIFICATES, &serial)
            .hset_nx(
                TRUSTED_FLAGS,
                &serial,
                if certificate.trusted { "1" } else { "0" },
            );
        if let Some(previous) = previous {
            let previous: Certificate = serde_json::from_str(&previous)?;
            let moved = previous
                .subject_key
                .filter(|key| Some(key) != certificate.subject_key.as_ref());
            if let Some(key) = moved {
                pipe.srem(subject_key_index(&key), &serial);
            }
        }
        if let Some(key) = &certificate.subject_key {
            pipe.sadd(subject_key_index(key), &serial);
        }
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn find_by_subject_key(&self, subject_key: &str) -> Result<Vec<Certificate>> {
        let mut conn = self.conn.clone();
        let serials: Vec<String> = conn.smembers(subject_key_index(subject_key)).await?;
        self.load(&serials).await
    }

    async fn find_by_serial(&self, serial_number: &str) -> Result<Option<Certificate>> {
        let mut found = self.load(&[serial_number.to_string()]).await?;
        Ok(found.pop())
    }

    async fn delete_all_trusted(&self) -> Result<usize> {
        self.delete_where(true).await
    }

    async fn delete_all_intermediate(&self) -> Result<usize> {
        self.delete_where(false).await
    }

    async fn count(&self) -> Result<usize> {
        let mut conn = self.conn.clone();
        let count = conn.scard(CERTIFICATES).await?;
        Ok(count)
    }
}

/// A Redis CRL store. Records are JSON under `crl:{url}`, indexed by issuer key.
#[derive(Clone)]
pub struct RedisCrlStore {
    conn: ConnectionManager,
}

impl RedisCrlStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CrlStore for RedisCrlStore {
    async fn save_crl(&self, crl: Crl) -> Result<()> {
        let mut conn = self.conn.clone();
        let previous: Option<String> = conn.get(crl_key(&crl.url)).await?;

        let mut pipe = redis::pipe();
        pipe.atomic()
            .set(crl_key(&crl.url), serde_json::to_string(&crl)?)
            .sadd(CRLS, &crl.url);
        if let Some(previous) = previous {
            let previous: Crl = serde_json::from_str(&previous)?;
            if let Some(key) = previous.issuer_key {
                pipe.srem(crl_issuer_index(&key), &crl.url);
            }
        }
        if let Some(key) = &crl.issuer_key {
            pipe.sadd(crl_issuer_index(key), &crl.url);
        }
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn get_all_by_issuer_keys(&self, issuer_keys: &[String]) -> Result<Vec<Crl>> {
        let mut conn = self.conn.clone();
        let mut urls: Vec<String> = Vec::new();
        for key in issuer_keys {
            let members: Vec<String> = conn.smembers(crl_issuer_index(key)).await?;
            urls.extend(members);
        }
        urls.sort();
        urls.dedup();
        let keys: Vec<String> = urls.iter().map(|url| crl_key(url)).collect();
        get_records(&mut conn, &keys).await
    }

    async fn get_all_crls(&self) -> Result<Vec<Crl>> {
        let mut conn = self.conn.clone();
        let urls: Vec<String> = conn.smembers(CRLS).await?;
        let keys: Vec<String> = urls.iter().map(|url| crl_key(url)).collect();
        get_records(&mut conn, &keys).await
    }
}

#[derive(Clone)]
pub struct RedisCrlUrlStore {
    conn: ConnectionManager,
}

impl RedisCrlUrlStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CrlUrlStore for RedisCrlUrlStore {
    async fn add_crl_url(&self, url: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let added: usize = conn.sadd(CRL_URLS, url).await?;
        if added == 0 {
            return Ok(false);
        }
        let _: () = conn
            .set(crl_url_key(url), serde_json::to_string(&CrlUrl::new(url))?)
            .await?;
        Ok(true)
    }

    async fn update_crl_url(
        &self,
        url: &str,
        last_update: DateTime<Utc>,
        next_update: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut conn = self.conn.clone();
        let known: bool = conn.sismember(CRL_URLS, url).await?;
        if !known {
            return Ok(());
        }
        let record = CrlUrl {
            url: url.to_string(),
            last_update: Some(last_update),
            next_update,
        };
        let _: () = conn
            .set(crl_url_key(url), serde_json::to_string(&record)?)
            .await?;
        Ok(())
    }

    async fn get_all_crl_urls(&self) -> Result<Vec<CrlUrl>> {
        let mut conn = self.conn.clone();
        let urls: Vec<String> = conn.smembers(CRL_URLS).await?;
        let keys: Vec<String> = urls.iter().map(|url| crl_url_key(url)).collect();
        get_records(&mut conn, &keys).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(certificate_key("1f"), "cert:1f");
        assert_eq!(subject_key_index("ab"), "cert:ski:ab");
        assert_eq!(crl_key("http://x/y.crl"), "crl:http://x/y.crl");
        assert_eq!(crl_issuer_index("ab"), "crl:issuer:ab");
        assert_eq!(crl_url_key("http://x/y.crl"), "crl_url:http://x/y.crl");
    }
}
