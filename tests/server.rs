mod common;

use common::Pki;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use sigcheck_server::setup::Stores;
use sigcheck_server::verification::messages;

const DOCUMENT: &[u8] = b"Invoice 2024-117";

async fn post_verify(addr: &str, form: Form) -> (StatusCode, Value) {
    let response = Client::new()
        .post(format!("{addr}/verify"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_verify_reports_unknown_chain() {
    let config = common::test_config();
    let addr = common::spawn_server(&config, Stores::in_memory()).await;
    let pki = Pki::with_crl_base("http://crl.invalid");

    let form = Form::new()
        .part("data", Part::bytes(DOCUMENT.to_vec()).file_name("invoice.txt"))
        .part("sig", Part::bytes(common::sign_detached(&pki.leaf, DOCUMENT)).file_name("invoice.txt.sig"));
    let (status, body) = post_verify(&addr, form).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["signatures_count"], 1);
    assert_eq!(body["qualification_status"], false);

    let steps = body["signatures"][0]["verification_steps"].as_array().unwrap();
    assert_eq!(steps.len(), 5);
    let step = |code: &str| {
        steps
            .iter()
            .find(|step| step["code"] == code)
            .unwrap()
            .clone()
    };
    assert_eq!(step(messages::CHECK_SIGNED_DATA)["success"], true);
    assert_eq!(step(messages::CHECK_KEY_USAGE)["success"], true);
    assert_eq!(step(messages::CHECK_CERT_CHAIN)["success"], false);
}

#[tokio::test]
async fn test_verify_rejects_bad_uploads() {
    let config = common::test_config();
    let addr = common::spawn_server(&config, Stores::in_memory()).await;

    let missing = Form::new().part("data", Part::bytes(DOCUMENT.to_vec()));
    let (status, body) = post_verify(&addr, missing).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], messages::ERROR_UPLOADING_SIGNATURE);

    let garbage = Form::new()
        .part("data", Part::bytes(DOCUMENT.to_vec()))
        .part("sig", Part::bytes(b"not a signature".to_vec()));
    let (status, body) = post_verify(&addr, garbage).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], messages::SIGNATURE_INVALID_FORMAT);
}

#[tokio::test]
async fn test_disabled_checks_are_not_reported() {
    let mut config = common::test_config();
    config.verification.chain = false;
    config.verification.chain_with_crl = false;
    let addr = common::spawn_server(&config, Stores::in_memory()).await;
    let pki = Pki::with_crl_base("http://crl.invalid");

    let form = Form::new()
        .part("data", Part::bytes(DOCUMENT.to_vec()))
        .part("sig", Part::bytes(common::sign_detached(&pki.leaf, DOCUMENT)));
    let (status, body) = post_verify(&addr, form).await;

    assert_eq!(status, StatusCode::OK);
    let steps = body["signatures"][0]["verification_steps"].as_array().unwrap();
    assert_eq!(steps.len(), 3);
    assert_eq!(body["qualification_status"], true);
}

#[tokio::test]
async fn test_update_trigger_is_accepted() {
    let config = common::test_config();
    let addr = common::spawn_server(&config, Stores::in_memory()).await;

    let response = Client::new()
        .post(format!("{addr}/update/do-scheduled-update"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body: Value = response.json().await.unwrap();
    assert!(body["started"].is_boolean());
}
