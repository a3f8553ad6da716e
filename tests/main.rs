extern crate onereq;

use self::setup::*;
use onereq::{DecodedBody, Method, RequestOptions, Transport};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[test]
fn test_basic_get() {
    setup();
    let response = options("/basic").send().unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.raw_body, "basic");
    assert_eq!(response.body, DecodedBody::Text("basic".to_string()));
}

#[test]
fn test_users_json() {
    setup();
    let response = options("/usersJSON").send().unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.body,
        DecodedBody::Json(json!([{"id": 5, "name": "Harvey Birdman"}]))
    );
}

#[test]
fn test_users_json_with_charset() {
    setup();
    let response = options("/usersJSONWithCharset").send().unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.body,
        DecodedBody::Json(json!([{"id": 5, "name": "Harvey Birdman"}]))
    );
}

#[test]
fn test_content_type_without_body() {
    setup();
    let response = options("/contentTypeNoBody").send().unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.raw_body, "");
    assert_eq!(response.body, DecodedBody::Text(String::new()));
}

#[test]
fn test_broken_json_is_a_decode_error() {
    setup();
    let result = options("/brokenJSON").send();
    match result {
        Err(onereq::Error::BodyDecode { status_code, .. }) => assert_eq!(status_code, 200),
        other => panic!("expected a decode error, got {:?}", other),
    }
}

#[test]
fn test_post_echo() {
    setup();
    let body = get_body(
        options("/echo")
            .with_method(Method::Post)
            .with_body("test test test")
            .send(),
    );
    assert_eq!(body, "test test test");
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct User {
    id: i32,
    name: String,
}

#[test]
fn test_json_round_trip() {
    setup();
    let original = User {
        id: 5,
        name: "Harvey Birdman".to_string(),
    };

    let response = options("/echoJSON")
        .with_method(Method::Post)
        .with_json(&original)
        .unwrap()
        .send()
        .unwrap();

    assert_eq!(
        response.body,
        DecodedBody::Json(json!({"id": 5, "name": "Harvey Birdman"}))
    );
    let actual: User = response.json().unwrap();
    assert_eq!(actual, original);
}

#[test]
fn test_basic_auth() {
    setup();
    let response = options("/auth").with_basic_auth("harvey", "birdman").send().unwrap();
    assert_eq!(response.status_code, 200);
}

#[test]
fn test_basic_auth_rejected() {
    setup();
    let response = options("/auth").with_basic_auth("harvey", "mcbirdman").send().unwrap();
    assert_eq!(response.status_code, 400);
}

#[test]
fn test_follow_redirect() {
    setup();
    let response = options("/redirect").with_follow_redirects(true).send().unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.raw_body, "basic");
}

#[test]
fn test_follow_301_redirect() {
    setup();
    let response = options("/redirect301").with_follow_redirects(true).send().unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.raw_body, "basic");
}

#[test]
fn test_redirect_not_followed_by_default() {
    setup();
    let response = options("/redirect").send().unwrap();
    assert_eq!(response.status_code, 302);
    let location = format!("http://localhost:{}/basic", PORT);
    assert_eq!(response.headers.get("location"), Some(&location));
}

#[test]
fn test_303_is_not_followed() {
    setup();
    let response = options("/redirect303").with_follow_redirects(true).send().unwrap();
    assert_eq!(response.status_code, 303);
}

#[test]
fn test_redirect_loop_is_cut_off() {
    setup();
    let result = options("/redirectloop")
        .with_follow_redirects(true)
        .with_max_redirects(10)
        .send();
    assert_eq!(
        format!("{:?}", result.err().unwrap()),
        format!("{:?}", onereq::Error::TooManyRedirects)
    );
}

#[test]
fn test_cross_origin_redirect_keeps_host() {
    setup();
    // The location points at example.com, but only its path is taken: the
    // request lands back on the test server.
    let response = options("/redirectotherhost")
        .with_follow_redirects(true)
        .send()
        .unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.raw_body, "basic");
}

#[test]
fn test_relative_location_is_terminal() {
    setup();
    let response = options("/redirectrelative")
        .with_follow_redirects(true)
        .send()
        .unwrap();
    assert_eq!(response.status_code, 302);
}

#[test]
fn test_missing_location_is_terminal() {
    setup();
    let response = options("/redirectnowhere")
        .with_follow_redirects(true)
        .send()
        .unwrap();
    assert_eq!(response.status_code, 302);
}

#[test]
fn test_head() {
    setup();
    let response = options("/basic").with_method(Method::Head).send().unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.raw_body, "");
}

#[test]
fn test_timeout_too_low() {
    setup();
    let result = options("/slow").with_timeout(1).send();
    assert!(result.is_err());
}

#[test]
fn test_timeout_high_enough() {
    setup();
    let body = get_body(options("/slow").with_timeout(3).send());
    assert_eq!(body, "slow");
}

#[test]
fn test_unresponsive_server() {
    // Bound but never accepted: the request should hit the timeout rather
    // than hang forever.
    let _listener = std::net::TcpListener::bind("127.0.0.1:35863").unwrap();
    let result = RequestOptions::new(Transport::Http, "127.0.0.1", "/")
        .with_port(35863)
        .with_timeout(1)
        .send();
    assert!(result.is_err());
}

#[test]
fn test_not_found() {
    setup();
    assert_eq!(get_status_code(options("/nonexistent").send()), 404);
}
