//! Sources of certificates and CRL locations.
//!
//! Every loader hands out a lazy, finite stream that is consumed once. Items
//! that fail to decode are logged and skipped; a source that cannot be read at
//! all is logged and yields an empty stream.

use futures::stream::BoxStream;

use crate::pki::Certificate;

mod directory;
mod feed;
mod url_list;

pub use directory::DirectoryLoader;
pub use feed::XmlFeedLoader;
pub use url_list::{UrlListLoader, parse_url_list};

pub trait CertificateLoader: Send + Sync {
    /// Where the certificates come from, for logs.
    fn source(&self) -> &str;

    fn certificates(&self) -> BoxStream<'static, Certificate>;
}

pub trait CrlUrlLoader: Send + Sync {
    fn source(&self) -> &str;

    fn crl_urls(&self) -> BoxStream<'static, String>;
}
