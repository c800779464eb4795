//! Request-level tests of `RtirClient` against a mock RT server.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use rtir_rest::compat::OrEmpty;
use rtir_rest::error::RtirError;
use rtir_rest::models::NewTicket;
use rtir_rest::parser::{LoginOutcome, ResponseFormat, Rt4Format};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn login_accepts_start_page_and_keeps_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(form_field("user", USER))
        .and(form_field("pass", PASSWORD))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "RT_SID_rtir.80=abc123; path=/")
                .set_body_string(START_PAGE),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    assert!(assert_ok!(client.login().await));
    assert!(client.is_logged_in());
    assert_eq!(client.session().cookie(), Some("RT_SID_rtir.80=abc123"));

    // A second login is a no-op.
    assert!(assert_ok!(client.login().await));
}

#[tokio::test]
async fn login_page_means_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    assert!(!assert_ok!(client.login().await));
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn login_http_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500).set_body_string(format!("boom {}", PASSWORD)))
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    let err = assert_err!(client.login().await);
    assert!(matches!(err, RtirError::HttpStatus { .. }));
    assert!(!err.to_string().contains(PASSWORD));
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn logout_forgets_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/logout"))
        .respond_with(rt_ok(""))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = logged_in_client(&server).await;
    assert!(assert_ok!(client.logout().await));
    assert!(!client.is_logged_in());
    assert!(client.session().credentials().is_none());

    let err = assert_err!(client.login().await);
    assert!(matches!(err, RtirError::MissingCredentials));
    assert!(matches!(
        client.get_ticket_info("1").await,
        Err(RtirError::NotLoggedIn)
    ));
}

#[tokio::test]
async fn new_login_switches_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/logout"))
        .respond_with(rt_ok(""))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(form_field("user", "responder"))
        .respond_with(ResponseTemplate::new(200).set_body_string(START_PAGE))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    let mut client = logged_in_client(&server).await;
    assert!(assert_ok!(client.new_login("responder", "other-pw").await));
    assert_eq!(client.session().user(), "responder");
}

#[tokio::test]
async fn show_extracts_fields_and_caches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/ticket/123/show"))
        .respond_with(rt_ok(&show_body("123", "Nobody")))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = logged_in_client(&server).await;

    let info = assert_ok!(client.get_ticket_info("123").await);
    assert!(info.starts_with("id: ticket/123\nQueue: Incident Reports"));
    assert!(!info.contains("RT/4.2.9"));

    assert_eq!(assert_ok!(client.get_ticket_owner("123").await), "Nobody");
    assert_eq!(
        assert_ok!(client.get_ticket_subject("123").await),
        "Open resolver on 192.0.2.7"
    );
    assert_eq!(assert_ok!(client.get_ticket_ip("123").await), "192.0.2.7");
    assert_eq!(
        assert_ok!(client.get_ticket_create_date("123").await),
        "Mon Mar 05 10:11:12 2018"
    );
    assert_eq!(client.cache().len(), 1);
}

#[tokio::test]
async fn mutation_invalidates_cached_ticket() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/ticket/7/show"))
        .respond_with(rt_ok(&show_body("7", "Nobody")))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/ticket/7/comment"))
        .and(content_contains("Action: comment"))
        .and(content_contains("Text: first line\n second line"))
        .respond_with(rt_ok("# Message recorded"))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = logged_in_client(&server).await;
    assert_ok!(client.get_ticket_status("7").await);
    assert_ok!(client.get_ticket_status("7").await);
    assert_ok!(client.comment_ticket("7", "first line\nsecond line").await);
    assert!(client.cache().is_empty());
    assert_ok!(client.get_ticket_status("7").await);
}

#[tokio::test]
async fn missing_ticket_is_not_found_and_clears_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/ticket/1/show"))
        .respond_with(rt_ok(&show_body("1", "Nobody")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/ticket/999/show"))
        .respond_with(rt_ok("# Ticket 999 does not exist."))
        .mount(&server)
        .await;

    let mut client = logged_in_client(&server).await;
    assert_ok!(client.get_ticket_info("1").await);

    let err = assert_err!(client.get_ticket_info("999").await);
    assert!(matches!(err, RtirError::NotFound { kind: "ticket", .. }));
    assert!(client.cache().is_empty());
    assert_eq!(client.get_ticket_owner("999").await.or_empty("owner"), "");
}

#[tokio::test]
async fn unknown_field_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/ticket/5/show"))
        .respond_with(rt_ok(&show_body("5", "Nobody")))
        .expect(0)
        .mount(&server)
        .await;

    let mut client = logged_in_client(&server).await;
    let result = client.get_ticket_item("5", "Color").await;
    assert!(matches!(result, Err(RtirError::UnknownField(ref f)) if f == "Color"));
    assert_eq!(
        client.get_ticket_item("5", "Color").await.or_empty("get_ticket_item"),
        ""
    );
}

#[tokio::test]
async fn rt_error_status_line_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/ticket/5/show"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("RT/4.2.9 401 Credentials required\n"),
        )
        .mount(&server)
        .await;

    let mut client = logged_in_client(&server).await;
    let err = assert_err!(client.get_ticket_info("5").await);
    assert!(matches!(err, RtirError::RtApi { code: 401, .. }));
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn search_sends_query_and_sorts_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/search/ticket"))
        .and(query_param("query", "(Status='new' OR Status='open')"))
        .respond_with(rt_ok("12: Spam run\n3: Open resolver\n100: Phishing"))
        .expect(2)
        .mount(&server)
        .await;

    let client = logged_in_client(&server).await;
    assert_eq!(
        assert_ok!(client.get_all_new_open_tickets().await),
        "12: Spam run\n3: Open resolver\n100: Phishing"
    );
    assert_eq!(
        assert_ok!(client.get_all_new_open_ticket_ids().await),
        vec!["3", "12", "100"]
    );
}

#[tokio::test]
async fn empty_search_yields_no_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/search/ticket"))
        .respond_with(rt_ok("No matching results."))
        .mount(&server)
        .await;

    let client = logged_in_client(&server).await;
    assert_eq!(assert_ok!(client.search_tickets("Queue='Empty'").await), "");
    assert!(assert_ok!(client.get_all_new_open_ticket_ids().await).is_empty());
}

#[tokio::test]
async fn queues_are_enumerated_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/REST/1.0/queue/0"))
        .respond_with(rt_ok("# Queue 0 does not exist."))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/REST/1.0/queue/1"))
        .respond_with(rt_ok("id: queue/1\nName: General\nDescription: The default queue"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/REST/1.0/queue/2"))
        .respond_with(rt_ok("id: queue/2\nName: Incident Reports"))
        .mount(&server)
        .await;

    let client = logged_in_client(&server).await;
    let queues = assert_ok!(client.get_all_queues(3).await);
    let names: Vec<String> = queues.iter().map(ToString::to_string).collect();
    assert_eq!(names, vec!["1,General", "2,Incident Reports"]);
}

#[tokio::test]
async fn message_reads_last_matching_attachment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/ticket/5/attachments"))
        .respond_with(rt_ok(
            "id: ticket/5/attachments\n\nAttachments: 44: (Unnamed) (text/plain / 0b),\n             45: (Unnamed) (multipart/mixed / 0b),\n             46: (Unnamed) (text/plain / 1k)",
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/ticket/5/attachments/46"))
        .respond_with(rt_ok("id: 46\nContentType: text/plain\nContent: Please check 192.0.2.7"))
        .expect(1)
        .mount(&server)
        .await;

    let client = logged_in_client(&server).await;
    assert_eq!(
        assert_ok!(client.get_ticket_message_ids("5", "text/plain").await),
        vec!["44", "46"]
    );
    let message = assert_ok!(client.get_ticket_message("5", "text/plain").await);
    assert_eq!(
        message,
        "id: 46\nContentType: text/plain\nContent: Please check 192.0.2.7"
    );
    assert_eq!(assert_ok!(client.get_ticket_message("5", "text/html").await), "");
}

#[tokio::test]
async fn create_posts_payload_and_parses_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/ticket/new"))
        .and(content_contains("id: ticket/new"))
        .and(content_contains("Queue: Incident Reports"))
        .and(content_contains("Owner: analyst"))
        .and(content_contains("CF-Customer: abuse@example.net"))
        .and(content_contains("CF-Constituency: EDUNET"))
        .respond_with(rt_ok("# Ticket 77 created."))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = logged_in_client(&server).await;
    let ticket = NewTicket::new("abuse@example.net", "Open resolver", "Details\nmore")
        .with_constituency("EDUNET");
    assert_eq!(assert_ok!(client.create_ticket(&ticket).await), "77");
}

#[tokio::test]
async fn create_without_id_is_unexpected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/ticket/new"))
        .respond_with(rt_ok("# Could not create ticket."))
        .mount(&server)
        .await;

    let mut client = logged_in_client(&server).await;
    let ticket = NewTicket::new("abuse@example.net", "Open resolver", "");
    let err = assert_err!(client.create_ticket(&ticket).await);
    assert!(matches!(err, RtirError::UnexpectedResponse(_)));
}

#[tokio::test]
async fn user_info_defaults_to_logged_in_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/user/analyst"))
        .respond_with(rt_ok("id: user/22\nName: analyst\nRealName: Jane Analyst"))
        .expect(1)
        .mount(&server)
        .await;

    let client = logged_in_client(&server).await;
    let info = assert_ok!(client.get_user_info("").await);
    assert!(info.contains("RealName: Jane Analyst"));
}

#[tokio::test]
async fn operations_before_login_make_no_requests() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(rt_ok(""))
        .expect(0)
        .mount(&server)
        .await;

    let mut client = client_for(&server);
    assert!(matches!(
        client.get_ticket_owner("1").await,
        Err(RtirError::NotLoggedIn)
    ));
    assert!(matches!(
        client.take_or_steal_ticket("1").await,
        Err(RtirError::NotLoggedIn)
    ));
    assert!(matches!(
        client.take_comment_close_ticket("1", "done").await,
        Err(RtirError::NotLoggedIn)
    ));
    assert!(matches!(
        client.get_all_queues(4).await,
        Err(RtirError::NotLoggedIn)
    ));
    assert!(!assert_ok!(client.logout().await));
}

struct DashboardFormat;

impl ResponseFormat for DashboardFormat {
    fn login_outcome(&self, body: &str) -> LoginOutcome {
        if body.contains("<title>Dashboard</title>") {
            LoginOutcome::Authenticated
        } else {
            LoginOutcome::LoginPage
        }
    }

    fn created_ticket_id(&self, body: &str) -> Option<String> {
        Rt4Format.created_ticket_id(body)
    }

    fn is_missing(&self, body: &str) -> bool {
        Rt4Format.is_missing(body)
    }
}

#[tokio::test]
async fn custom_format_decides_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Dashboard</title>"))
        .mount(&server)
        .await;

    let mut default_client = client_for(&server);
    assert!(!assert_ok!(default_client.login().await));

    let mut client = client_for(&server).with_format(Box::new(DashboardFormat));
    assert!(assert_ok!(client.login().await));
}

#[tokio::test]
async fn raw_reads_keep_the_status_line() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/ticket/9/show"))
        .respond_with(rt_ok(&show_body("9", "Nobody")))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/search/ticket"))
        .respond_with(rt_ok("9: Open resolver on 192.0.2.7"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/ticket/9/attachments/31"))
        .respond_with(rt_ok("id: 31\nContent: hello"))
        .mount(&server)
        .await;

    let mut client = logged_in_client(&server).await;
    let raw = assert_ok!(client.get_ticket_info_raw("9").await);
    assert!(raw.starts_with("RT/4.2.9 200 Ok"));
    assert!(client.cache().is_empty());

    assert_eq!(
        assert_ok!(client.get_ticket_requestors("9").await),
        "abuse@example.net"
    );
    assert_eq!(
        assert_ok!(client.search_tickets_raw("id = 9").await),
        "RT/4.2.9 200 Ok\n\n9: Open resolver on 192.0.2.7"
    );
    assert_eq!(
        assert_ok!(client.get_ticket_message_by_id("9", "31").await),
        "\nid: 31\nContent: hello\n"
    );
}

#[tokio::test]
async fn queue_info_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/queue/Incident%20Reports"))
        .respond_with(rt_ok("id: queue/3\nName: Incident Reports\nDescription: New reports"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/queue/Nope"))
        .respond_with(rt_ok("# Queue Nope does not exist."))
        .mount(&server)
        .await;

    let client = logged_in_client(&server).await;
    assert_eq!(
        assert_ok!(client.get_queue_info("Incident Reports").await),
        "id: queue/3\nName: Incident Reports\nDescription: New reports"
    );
    let err = assert_err!(client.get_queue_info("Nope").await);
    assert!(matches!(err, RtirError::NotFound { kind: "queue", .. }));
}

#[tokio::test]
async fn set_owner_claims_then_edits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/ticket/4/show"))
        .respond_with(rt_ok(&show_body("4", "analyst")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/ticket/4/edit"))
        .and(content_contains("id: 4\nOwner: colleague"))
        .respond_with(rt_ok("# Ticket 4 updated."))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = logged_in_client(&server).await;
    assert_eq!(
        assert_ok!(client.set_ticket_owner("4", "colleague").await),
        "# Ticket 4 updated."
    );
}

#[tokio::test]
async fn edit_values_stay_on_one_payload_line() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/ticket/6/show"))
        .respond_with(rt_ok(&show_body("6", "analyst")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/REST/1.0/ticket/6/edit"))
        .respond_with(rt_ok("# Ticket 6 updated."))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = logged_in_client(&server).await;
    assert_ok!(
        client
            .set_ticket_queue("6", "Incidents\nStatus: resolved")
            .await
    );

    let contents = posted_contents(&server).await;
    assert_eq!(
        contents,
        vec![(
            "/REST/1.0/ticket/6/edit".to_string(),
            "Queue: Incidents Status: resolved\n".to_string()
        )]
    );
}
