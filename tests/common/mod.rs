//! Shared fixtures for the wiremock-backed integration tests

#![allow(dead_code)]

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use optionset_cli::api::{Credentials, OptionItem, OptionSetClient};

pub const TENANT: &str = "tenant-1";
pub const TOKEN_PATH: &str = "/tenant-1/oauth2/v2.0/token";
pub const BATCH_PATH: &str = "/api/data/v9.2/$batch";

/// Start a server that plays both identity provider and Dataverse
pub async fn setup() -> (MockServer, OptionSetClient) {
    let server = MockServer::start().await;
    let client = client_for(&server);
    (server, client)
}

pub fn client_for(server: &MockServer) -> OptionSetClient {
    let credentials = Credentials::new(server.uri(), TENANT, "client-1", "secret-1");
    OptionSetClient::with_http_client(credentials, reqwest::Client::new())
        .with_authority(&server.uri())
}

/// Token endpoint answering with `expires_in`, expected to be hit `calls` times
pub async fn mount_token(server: &MockServer, expires_in: u64, calls: u64) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=client-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "token-abc",
            "expires_in": expires_in
        })))
        .expect(calls)
        .mount(server)
        .await;
}

/// Token endpoint without call-count expectations
pub async fn mount_any_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "token-abc",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

/// Multipart changeset response with one part per status line
pub fn batch_response(statuses: &[(&str, &str)]) -> String {
    let batch = "batchresponse_0c7e9a51-2f43-4d0b-9a56-7d2b0f3c1e11";
    let changeset = "changesetresponse_5b1f2e77-8a3c-4b4e-b7b8-32d1c1d5a0f2";

    let mut text = format!(
        "--{}\r\nContent-Type: multipart/mixed; boundary={}\r\n\r\n",
        batch, changeset
    );
    for (i, (status, body)) in statuses.iter().enumerate() {
        text.push_str(&format!(
            "--{}\r\nContent-Type: application/http\r\nContent-Transfer-Encoding: binary\r\nContent-ID: {}\r\n\r\nHTTP/1.1 {}\r\nOData-Version: 4.0\r\n\r\n{}\r\n",
            changeset,
            i + 1,
            status,
            body
        ));
    }
    text.push_str(&format!("--{}--\r\n--{}--\r\n", changeset, batch));
    text
}

pub fn no_content(n: usize) -> String {
    batch_response(&vec![("204 No Content", ""); n])
}

pub fn items(pairs: &[(&str, i32)]) -> Vec<OptionItem> {
    pairs
        .iter()
        .map(|(label, value)| OptionItem::new(*label, *value))
        .collect()
}

/// Global option set definition with English labels
pub fn optionset_json(name: &str, display: &str, options: &[(&str, i32)]) -> serde_json::Value {
    json!({
        "Name": name,
        "OptionSetType": "Picklist",
        "IsCustomOptionSet": true,
        "DisplayName": {
            "LocalizedLabels": [{"Label": display, "LanguageCode": 1033}],
            "UserLocalizedLabel": {"Label": display, "LanguageCode": 1033}
        },
        "Options": options
            .iter()
            .map(|(label, value)| json!({
                "Value": value,
                "Label": {"LocalizedLabels": [{"Label": label, "LanguageCode": 1033}]}
            }))
            .collect::<Vec<_>>()
    })
}
