use futures::{StreamExt, stream, stream::BoxStream};
use quick_xml::{Reader, events::Event};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};

use super::{CertificateLoader, CrlUrlLoader};
use crate::ingest::HttpFetcher;
use crate::pki::Certificate;

/// Element holding the base64 body of a certificate.
const CERTIFICATE_ELEMENT: &[u8] = "Данные".as_bytes();
/// Element listing the CRL locations of an accredited authority.
const CRL_LIST_ELEMENT: &[u8] = "АдресаСписковОтзыва".as_bytes();
const CRL_ADDRESS_ELEMENT: &[u8] = "Адрес".as_bytes();

const CHANNEL_CAPACITY: usize = 64;

/// Reads certificates and CRL locations from a remote XML registry feed.
///
/// The feed is downloaded when the stream is first polled and parsed on the
/// blocking pool; items are emitted while parsing progresses.
#[derive(Debug, Clone)]
pub struct XmlFeedLoader {
    url: String,
    fetcher: HttpFetcher,
}

impl XmlFeedLoader {
    pub fn new(url: impl Into<String>, fetcher: HttpFetcher) -> Self {
        Self {
            url: url.into(),
            fetcher,
        }
    }

    fn scan<T: Send + 'static>(
        &self,
        scanner: fn(&[u8], &mpsc::Sender<T>) -> Result<usize, quick_xml::Error>,
    ) -> BoxStream<'static, T> {
        let url = self.url.clone();
        let fetcher = self.fetcher.clone();
        stream::once(async move {
            let body = match fetcher.get_bytes(&url).await {
                Ok(body) => body,
                Err(e) => {
                    error!(url, error = %e, "Cannot download XML feed");
                    return stream::empty().boxed();
                }
            };

            let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
            tokio::task::spawn_blocking(move || match scanner(&body, &tx) {
                Ok(count) => info!(url, count, "XML feed parsed"),
                Err(e) => error!(url, error = %e, "XML feed parsing stopped"),
            });
            ReceiverStream::new(rx).boxed()
        })
        .flatten()
        .boxed()
    }
}

impl CertificateLoader for XmlFeedLoader {
    fn source(&self) -> &str {
        &self.url
    }

    fn certificates(&self) -> BoxStream<'static, Certificate> {
        self.scan(scan_certificates)
    }
}

impl CrlUrlLoader for XmlFeedLoader {
    fn source(&self) -> &str {
        &self.url
    }

    fn crl_urls(&self) -> BoxStream<'static, String> {
        self.scan(scan_crl_urls)
    }
}

/// Sends every decodable certificate body. Stops early when the receiver is gone.
fn scan_certificates(
    xml: &[u8],
    tx: &mpsc::Sender<Certificate>,
) -> Result<usize, quick_xml::Error> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut body: Option<String> = None;
    let mut sent = 0;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == CERTIFICATE_ELEMENT => {
                body = Some(String::new());
            }
            Event::Text(t) => {
                if let Some(body) = body.as_mut() {
                    body.push_str(&t.unescape()?);
                }
            }
            Event::End(e) if e.local_name().as_ref() == CERTIFICATE_ELEMENT => {
                let Some(encoded) = body.take() else {
                    continue;
                };
                match Certificate::from_base64(&encoded) {
                    Ok(certificate) => {
                        debug!(serial = %certificate.serial_number, "Certificate read from feed");
                        if tx.blocking_send(certificate).is_err() {
                            return Ok(sent);
                        }
                        sent += 1;
                    }
                    Err(e) => warn!(error = %e, "Skipping undecodable feed certificate"),
                }
            }
            Event::Eof => return Ok(sent),
            _ => {}
        }
        buf.clear();
    }
}

fn scan_crl_urls(xml: &[u8], tx: &mpsc::Sender<String>) -> Result<usize, quick_xml::Error> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_list = false;
    let mut address: Option<String> = None;
    let mut sent = 0;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                CRL_LIST_ELEMENT => in_list = true,
                CRL_ADDRESS_ELEMENT if in_list => address = Some(String::new()),
                _ => {}
            },
            Event::Text(t) => {
                if let Some(address) = address.as_mut() {
                    address.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                CRL_LIST_ELEMENT => in_list = false,
                CRL_ADDRESS_ELEMENT => {
                    if let Some(url) = address.take().filter(|url| !url.is_empty()) {
                        if tx.blocking_send(url).is_err() {
                            return Ok(sent);
                        }
                        sent += 1;
                    }
                }
                _ => {}
            },
            Event::Eof => return Ok(sent),
            _ => {}
        }
        buf.clear();
    }
}
