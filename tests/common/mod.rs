#![allow(dead_code)]

use std::collections::HashMap;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use sigcheck_server::{
    config::Config,
    server::Server,
    setup::{Stores, build_state},
};

#[path = "../../src/test_support.rs"]
mod fixtures;

pub use fixtures::*;

/// Registry feed carrying the leaf certificate.
pub fn leaf_feed(pki: &Pki) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <АккредитованныеУдостоверяющиеЦентры><УдостоверяющийЦентр><Ключ>\
         <Сертификаты><ДанныеСертификата><Данные>{}</Данные></ДанныеСертификата></Сертификаты>\
         </Ключ></УдостоверяющийЦентр></АккредитованныеУдостоверяющиеЦентры>",
        STANDARD.encode(&pki.leaf.der)
    )
}

/// Configuration with defaults only, isolated from the process environment.
pub fn test_config() -> Config {
    let mut config = Config::load_with_sources(Some(HashMap::new())).unwrap();
    config.server.host = "127.0.0.1".to_string();
    // Use a random OS port
    config.server.port = 0;
    config.ingest.fetch_timeout_secs = 5;
    config
}

// Helper function to spawn a test server on a random port
pub async fn spawn_server(config: &Config, stores: Stores) -> String {
    let state = build_state(config, stores).unwrap();
    let server = Server::new(state, &config.server).await.unwrap();

    let port = server.port().unwrap();
    tokio::spawn(async move {
        server.run().await.expect("failed to run server");
    });

    format!("http://{}:{}", config.server.host, port)
}
