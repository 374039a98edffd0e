// $batch round trips: encoding on the wire, per-item decoding and safe insert.

mod common;

use std::sync::{Arc, Mutex};

use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{BATCH_PATH, TOKEN_PATH, batch_response, items, mount_any_token, no_content, optionset_json, setup};
use optionset_cli::api::{BulkOptions, OptionSetError, TargetRef};

async fn batch_requests(server: &MockServer) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == BATCH_PATH)
        .collect()
}

async fn mount_existing(server: &MockServer, name: &str, options: &[(&str, i32)]) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/api/data/v9.2/GlobalOptionSetDefinitions(Name='{}')",
            name
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(optionset_json(name, name, options)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_bulk_insert_all_succeed() {
    let (server, client) = setup().await;
    mount_any_token(&server).await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .and(header("OData-Version", "4.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(no_content(3)))
        .expect(1)
        .mount(&server)
        .await;

    let options = items(&[("USA", 1), ("Canada", 2), ("Mexico", 52)]);
    let report = client
        .bulk_insert_options(&options, &TargetRef::global("new_phoneprefix"), BulkOptions::insert())
        .await
        .unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 0);
    assert!(!report.estimated);
    assert!(report.is_complete_success());

    let requests = batch_requests(&server).await;
    assert_eq!(requests.len(), 1);
    let request = &requests[0];

    let content_type = request.headers.get("Content-Type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/mixed;boundary=batch_"));
    assert!(request.headers.get("Prefer").is_none());

    let body = String::from_utf8(request.body.clone()).unwrap();
    let boundary = content_type.trim_start_matches("multipart/mixed;boundary=");
    assert!(body.starts_with(&format!("--{}\r\n", boundary)));
    assert!(body.trim_end().ends_with(&format!("--{}--", boundary)));
    assert_eq!(body.matches("POST InsertOptionValue HTTP/1.1").count(), 3);
    assert!(body.contains("Content-ID: 3"));
    assert!(body.contains(r#""OptionSetName":"new_phoneprefix""#));
}

#[tokio::test]
async fn test_bulk_insert_mixed_results() {
    let (server, client) = setup().await;
    mount_any_token(&server).await;

    let error_body = json!({"error": {"code": "0x80044363", "message": "Duplicate value"}}).to_string();
    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .and(header_exists("Prefer"))
        .respond_with(ResponseTemplate::new(200).set_body_string(batch_response(&[
            ("200 OK", "{}"),
            ("400 Bad Request", &error_body),
            ("204 No Content", ""),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let options = items(&[("USA", 1), ("Canada", 2), ("Mexico", 52)]);
    let bulk = BulkOptions::insert().continue_on_error(true);
    let report = client
        .bulk_insert_options(&options, &TargetRef::global("new_phoneprefix"), bulk)
        .await
        .unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);

    let failed: Vec<_> = report.failures().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].index, 1);
    assert_eq!(failed[0].label, "Canada");
    assert_eq!(failed[0].status_code, 400);
    assert_eq!(failed[0].message.as_deref(), Some("[0x80044363] Duplicate value"));

    let requests = batch_requests(&server).await;
    assert_eq!(
        requests[0].headers.get("Prefer").unwrap().to_str().unwrap(),
        "odata.continue-on-error"
    );
}

#[tokio::test]
async fn test_bulk_delete_local_target() {
    let (server, client) = setup().await;
    mount_any_token(&server).await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .and(header("Prefer", "odata.continue-on-error"))
        .respond_with(ResponseTemplate::new(200).set_body_string(no_content(2)))
        .expect(1)
        .mount(&server)
        .await;

    let options = items(&[("North", 100000000), ("South", 100000001)]);
    let report = client
        .bulk_delete_options(&options, &TargetRef::local("account", "new_region"), BulkOptions::delete())
        .await
        .unwrap();
    assert_eq!(report.succeeded, 2);

    let body = String::from_utf8(batch_requests(&server).await[0].body.clone()).unwrap();
    assert_eq!(body.matches("POST DeleteOptionValue HTTP/1.1").count(), 2);
    assert!(body.contains(r#""EntityLogicalName":"account""#));
    assert!(!body.contains("OptionSetName"));
    assert!(!body.contains("LocalizedLabels"));
}

#[tokio::test]
async fn test_bulk_update_sends_merge_flag() {
    let (server, client) = setup().await;
    mount_any_token(&server).await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(no_content(1)))
        .expect(1)
        .mount(&server)
        .await;

    let bulk = BulkOptions::update().merge_labels(true);
    client
        .bulk_update_options(&items(&[("United States", 1)]), &TargetRef::global("new_phoneprefix"), bulk)
        .await
        .unwrap();

    let body = String::from_utf8(batch_requests(&server).await[0].body.clone()).unwrap();
    assert!(body.contains("POST UpdateOptionValue HTTP/1.1"));
    assert!(body.contains(r#""MergeLabels":true"#));
}

#[tokio::test]
async fn test_bulk_uses_fresh_token_each_call() {
    let (server, client) = setup().await;
    common::mount_token(&server, 3600, 2).await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(no_content(1)))
        .expect(2)
        .mount(&server)
        .await;

    let options = items(&[("USA", 1)]);
    let target = TargetRef::global("new_phoneprefix");
    for _ in 0..2 {
        client
            .bulk_insert_options(&options, &target, BulkOptions::insert())
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_empty_bulk_sends_nothing() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let report = client
        .bulk_insert_options(&[], &TargetRef::global("new_phoneprefix"), BulkOptions::insert())
        .await
        .unwrap();
    assert_eq!(report.total, 0);
    assert!(report.results.is_empty());
}

#[tokio::test]
async fn test_rejected_batch_keeps_request_and_response() {
    let (server, client) = setup().await;
    mount_any_token(&server).await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"code": "0x80040216", "message": "An unexpected error occurred."}
        })))
        .mount(&server)
        .await;

    let err = client
        .bulk_insert_options(&items(&[("USA", 1)]), &TargetRef::global("new_phoneprefix"), BulkOptions::insert())
        .await
        .unwrap_err();

    match err {
        OptionSetError::RemoteApi {
            status,
            message,
            request_body,
            response_body,
        } => {
            assert_eq!(status, 500);
            assert_eq!(message, "[0x80040216] An unexpected error occurred.");
            assert!(request_body.unwrap().starts_with("--batch_"));
            assert!(response_body.contains("0x80040216"));
        }
        other => panic!("expected remote error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unparseable_batch_response_is_estimated() {
    let (server, client) = setup().await;
    mount_any_token(&server).await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    let report = client
        .bulk_insert_options(&items(&[("USA", 1), ("Canada", 2)]), &TargetRef::global("new_phoneprefix"), BulkOptions::insert())
        .await
        .unwrap();

    assert!(report.estimated);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 0);
    assert!(matches!(
        report.into_strict(),
        Err(OptionSetError::DecodeAmbiguity { total: 2 })
    ));
}

#[tokio::test]
async fn test_safe_insert_skips_existing_values() {
    let (server, client) = setup().await;
    mount_any_token(&server).await;
    mount_existing(&server, "new_phoneprefix", &[("USA", 1), ("Canada", 2)]).await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(no_content(2)))
        .expect(1)
        .mount(&server)
        .await;

    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);
    let client = client.with_progress(move |message: &str| {
        sink.lock().unwrap().push(message.to_string());
    });

    let options = items(&[("USA", 1), ("Mexico", 52), ("Brazil", 55)]);
    let (report, skipped) = client
        .safe_bulk_insert(&options, &TargetRef::global("new_phoneprefix"), false)
        .await
        .unwrap();

    let report = report.expect("a batch should have been sent");
    assert_eq!(report.total, 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.results[0].value, 52);
    assert_eq!(report.results[1].value, 55);
    assert_eq!(skipped, items(&[("USA", 1)]));

    let body = String::from_utf8(batch_requests(&server).await[0].body.clone()).unwrap();
    assert!(!body.contains(r#""Value":1,"#));
    assert!(body.contains(r#""Value":52"#));

    let messages = messages.lock().unwrap();
    assert_eq!(
        *messages,
        vec![
            "Skipping 1 duplicate(s) already in the OptionSet".to_string(),
            "Sending batch INSERT for 2 options …".to_string(),
            "Batch INSERT complete: 2/2 succeeded".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_safe_insert_all_duplicates_sends_no_batch() {
    let (server, client) = setup().await;
    mount_any_token(&server).await;
    mount_existing(&server, "new_phoneprefix", &[("USA", 1), ("Canada", 2)]).await;

    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let options = items(&[("Canada", 2), ("USA", 1)]);
    let (report, skipped) = client
        .safe_bulk_insert(&options, &TargetRef::global("new_phoneprefix"), true)
        .await
        .unwrap();

    assert!(report.is_none());
    assert_eq!(skipped, options);
}

#[tokio::test]
async fn test_safe_insert_into_missing_optionset_sends_everything() {
    let (server, client) = setup().await;
    mount_any_token(&server).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(no_content(2)))
        .expect(1)
        .mount(&server)
        .await;

    let (report, skipped) = client
        .safe_bulk_insert(&items(&[("USA", 1), ("Canada", 2)]), &TargetRef::global("new_fresh"), false)
        .await
        .unwrap();

    assert_eq!(report.unwrap().succeeded, 2);
    assert!(skipped.is_empty());
}

#[tokio::test]
async fn test_token_failure_stops_bulk_before_batch() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_request"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(BATCH_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client
        .bulk_insert_options(&items(&[("USA", 1)]), &TargetRef::global("new_phoneprefix"), BulkOptions::insert())
        .await
        .unwrap_err();
    assert!(matches!(err, OptionSetError::Auth { .. }));
}
