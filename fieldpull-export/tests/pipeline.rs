//! End-to-end pipeline runs against a fake admin backend.

mod common;

use fieldpull_export::acf::{Credentials, ExportError, ExportPipeline, ExportRequest};
use fieldpull_http::HttpSession;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DASHBOARD: &str = r#"<html><body><div id="wpbody-content">Dashboard</div></body></html>"#;

const LOGIN_PAGE: &str = r#"<html><body>
    <form name="loginform" id="loginform" action="/wp-login.php" method="post">
      <input type="text" name="log">
      <input type="password" name="pwd">
    </form></body></html>"#;

fn plugins_page(row_id: &str, version: &str) -> String {
    format!(
        r#"<table class="plugins">
             <tr id="{row_id}">
               <td class="plugin-title"><strong>Advanced Custom Fields</strong></td>
               <td class="column-description">
                 <div class="plugin-version-author-uri">Version {version} | By Elliot Condon</div>
               </td>
             </tr>
           </table>"#
    )
}

const MODERN_FORM: &str = r#"
    <div id="wpbody-content">
      <form>
        <input type="hidden" name="_acf_nonce" value="nXyz">
        <div class="acf-fields">
          <input type="checkbox" name="keys[]" value="12">
          <input type="checkbox" name="keys[]" value="45">
        </div>
        <button name="action" value="generate">Generate export code</button>
      </form>
    </div>"#;

const LEGACY_FORM: &str = r#"
    <div id="wpbody-content">
      <div class="wrap">
        <form>
          <input type="hidden" name="nonce" value="abc123">
          <table><tr><td>
            <select multiple>
              <option value="12">Group 12</option>
              <option value="34">Group 34</option>
            </select>
          </td></tr></table>
        </form>
      </div>
    </div>"#;

fn session(server: &MockServer) -> HttpSession {
    HttpSession::new(&server.uri())
        .unwrap()
        .with_referer("/wp-login.php")
        .unwrap()
}

fn credentials() -> Credentials {
    Credentials {
        identifier: "admin".to_string(),
        secret: "hunter2".to_string(),
    }
}

#[tokio::test]
async fn modern_source_export_end_to_end() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/wp-login.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DASHBOARD))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-admin/plugins.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(plugins_page("advanced-custom-fields-pro", "5.6.10")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-admin/edit.php"))
        .and(query_param("page", "acf-tools"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MODERN_FORM))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-admin/edit.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div id="wpbody-content"><textarea>if( function_exists('register_field_group') ):
register_field_group(array());
endif;</textarea></div>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = ExportPipeline::new(
        session(&server),
        credentials(),
        ExportRequest {
            structured: false,
            extra_condition: Some("true".to_string()),
            ..ExportRequest::default()
        },
    );
    let artifact = pipeline.run().await.unwrap();

    assert!(artifact.text.starts_with("<?php \n"));
    assert!(
        artifact
            .text
            .contains("if( function_exists('register_field_group') && true ):")
    );
    assert_eq!(artifact.line_count, artifact.text.lines().count());

    // The submit request carries the whole payload on the query string, with
    // the trigger parameter last.
    let requests = server.received_requests().await.unwrap();
    let submit = requests
        .iter()
        .find(|r| r.method.as_str() == "POST" && r.url.path() == "/wp-admin/edit.php")
        .unwrap();
    let query = submit.url.query().unwrap();
    assert!(query.contains("_acf_nonce=nXyz&tool=export&keys=12+45"));
    assert!(query.ends_with("&generate=Erstelle+Export+Code"));
    assert!(submit.body.is_empty());
}

#[tokio::test]
async fn legacy_export_posts_the_historical_body() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/wp-login.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DASHBOARD))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-admin/plugins.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(plugins_page("advanced-custom-fields", "4.9.8")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-admin/edit.php"))
        .and(query_param("page", "acf-export"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LEGACY_FORM))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-admin/edit.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div id="wpbody-content"><textarea>if(function_exists("register_field_group"))
{
}</textarea></div>"#,
        ))
        .mount(&server)
        .await;

    let pipeline = ExportPipeline::new(session(&server), credentials(), ExportRequest::default());
    let artifact = pipeline.run().await.unwrap();
    assert!(artifact.text.starts_with("<?php \n"));

    let requests = server.received_requests().await.unwrap();
    let submit = requests
        .iter()
        .find(|r| r.method.as_str() == "POST" && r.url.path() == "/wp-admin/edit.php")
        .unwrap();
    assert_eq!(
        String::from_utf8_lossy(&submit.body),
        "nonce=abc123&acf_posts=&acf_posts%5B%5D=12&acf_posts%5B%5D=34&export_to_php=Export+als+PHP"
    );
}

#[tokio::test]
async fn structured_export_pretty_prints_the_response() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/wp-login.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DASHBOARD))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-admin/plugins.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(plugins_page("advanced-custom-fields-pro", "5.6.10")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-admin/edit.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MODERN_FORM))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-admin/edit.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"groups":[{"key":"group_a1","title":"Hero"}]}"#),
        )
        .mount(&server)
        .await;

    let pipeline = ExportPipeline::new(
        session(&server),
        credentials(),
        ExportRequest {
            structured: true,
            ..ExportRequest::default()
        },
    );
    let artifact = pipeline.run().await.unwrap();

    assert!(artifact.text.contains("\n\t\"groups\""));
    assert!(artifact.text.contains("\"key\": \"group_a1\""));
    assert!(artifact.line_count > 1);

    let requests = server.received_requests().await.unwrap();
    let submit = requests
        .iter()
        .find(|r| r.method.as_str() == "POST" && r.url.path() == "/wp-admin/edit.php")
        .unwrap();
    assert!(submit.url.query().unwrap().contains("action=download"));
}

#[tokio::test]
async fn failed_login_stops_after_one_request() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    // The login form coming back means the credentials were rejected; the
    // pipeline must not touch any other endpoint afterwards.
    Mock::given(method("POST"))
        .and(path("/wp-login.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = ExportPipeline::new(session(&server), credentials(), ExportRequest::default());
    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, ExportError::Authentication { status: 200 }));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn out_of_order_stage_is_a_sequence_error() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    let mut pipeline =
        ExportPipeline::new(session(&server), credentials(), ExportRequest::default());
    let err = pipeline.resolve_version().await.unwrap_err();

    assert!(matches!(err, ExportError::Sequence { needed: "login" }));
    // Rejected before any network call.
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn login_form_reappearing_mid_run_expires_the_session() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/wp-login.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DASHBOARD))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-admin/plugins.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(plugins_page("advanced-custom-fields-pro", "5.6.10")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-admin/edit.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_PAGE))
        .mount(&server)
        .await;

    let pipeline = ExportPipeline::new(session(&server), credentials(), ExportRequest::default());
    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, ExportError::SessionExpired));
}

#[tokio::test]
async fn route_prefix_is_applied_to_every_path() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/blog/wp-login.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(DASHBOARD))
        .mount(&server)
        .await;
    // Plugin listing without any recognisable row.
    Mock::given(method("GET"))
        .and(path("/blog/wp-admin/plugins.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<table></table>"))
        .mount(&server)
        .await;

    let pipeline = ExportPipeline::new(session(&server), credentials(), ExportRequest::default())
        .with_route_prefix(Some("/blog"));
    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, ExportError::NotInstalled));
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path().starts_with("/blog/")));
}
