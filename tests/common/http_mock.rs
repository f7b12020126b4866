use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mount a token endpoint that accepts `code` and returns a HubSpot-style token.
#[allow(dead_code)]
pub async fn mount_token_endpoint(server: &MockServer, code: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth/v1/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains(format!("code={code}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response()))
        .expect(1)
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub fn token_response() -> Value {
    json!({
        "access_token": "access-abc",
        "refresh_token": "refresh-def",
        "expires_in": 1800,
        "token_type": "bearer"
    })
}

/// Mount `GET /crm/v3/objects/{object}` answering with `status` and `body`.
#[allow(dead_code)]
pub async fn mount_object(server: &MockServer, object: &str, status: u16, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/crm/v3/objects/{object}")))
        .and(header("authorization", "Bearer access-abc"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[allow(dead_code)]
pub fn contacts_page() -> Value {
    json!({"results": [
        {"id": "101", "properties": {
            "firstname": "Ada", "lastname": "Lovelace",
            "createdate": "2020-01-01T00:00:00Z",
            "lastmodifieddate": "2020-02-01T00:00:00.000Z"
        }},
        {"id": "102", "properties": {"email": "grace@example.com"}}
    ]})
}

#[allow(dead_code)]
pub fn companies_page() -> Value {
    json!({"results": [
        {"id": "201", "properties": {"name": "Analytical Engines Ltd"}}
    ]})
}

#[allow(dead_code)]
pub fn deals_page() -> Value {
    json!({"results": [
        {"id": "301", "properties": {"dealname": "Difference Engine"}},
        {"id": "302", "properties": {}}
    ]})
}
