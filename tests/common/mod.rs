//! Shared helpers for the integration tests.

#![allow(dead_code)]

use rtir_rest::config::Config;
use rtir_rest::rt_client::RtirClient;
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

pub const USER: &str = "analyst";
pub const PASSWORD: &str = "s3cret-pw";

pub const START_PAGE: &str = "<html><head><title>RT at a glance</title></head><body></body></html>";
pub const LOGIN_PAGE: &str = "<html><head><title>Login</title></head><body></body></html>";

/// Wraps a body in an `RT/4.2.9 200 Ok` response.
pub fn rt_ok(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!("RT/4.2.9 200 Ok\n\n{}\n", body))
}

pub fn show_body(id: &str, owner: &str) -> String {
    format!(
        "id: ticket/{}\nQueue: Incident Reports\nOwner: {}\nCreator: root\nSubject: Open resolver on 192.0.2.7\nStatus: open\nRequestors: abuse@example.net\nCreated: Mon Mar 05 10:11:12 2018\nCF.{{IP}}: 192.0.2.7\nCF.{{Classification}}: \n",
        id, owner
    )
}

pub fn client_for(server: &MockServer) -> RtirClient {
    let config = Config::new(USER, PASSWORD, server.uri()).expect("valid config");
    RtirClient::new(config).expect("client")
}

/// Mounts an accepting login page and logs a fresh client in.
pub async fn logged_in_client(server: &MockServer) -> RtirClient {
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(START_PAGE))
        .mount(server)
        .await;

    let mut client = client_for(server);
    assert!(client.login().await.expect("login request"));
    client
}

/// Matches a url-encoded form whose `field` value contains `needle`.
pub struct FormField {
    field: &'static str,
    needle: String,
}

impl Match for FormField {
    fn matches(&self, request: &Request) -> bool {
        url::form_urlencoded::parse(&request.body)
            .any(|(key, value)| key == self.field && value.contains(&self.needle))
    }
}

/// Matches the `content` payload RT reads mutations from.
pub fn content_contains(needle: impl Into<String>) -> FormField {
    form_field("content", needle)
}

pub fn form_field(field: &'static str, needle: impl Into<String>) -> FormField {
    FormField {
        field,
        needle: needle.into(),
    }
}

/// Returns `(path, content)` of every request carrying a `content` payload,
/// in the order the server received them.
pub async fn posted_contents(server: &MockServer) -> Vec<(String, String)> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter_map(|request| {
            url::form_urlencoded::parse(&request.body)
                .find(|(key, _)| key == "content")
                .map(|(_, value)| (request.url.path().to_string(), value.into_owned()))
        })
        .collect()
}
