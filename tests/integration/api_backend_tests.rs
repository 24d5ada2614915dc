//! Integration tests for the remote API strategy
//!
//! These tests use wiremock to stand in for the identity, lead search, lead
//! detail and OAuth endpoints.

use profile_harvester::config::{Config, Secret};
use profile_harvester::crawler::StopReason;
use profile_harvester::model::SearchRequest;
use profile_harvester::{build_backend, AuthError, BackendKind, HarvestError, SearchFilter};
use serde_json::{json, Value};
use wiremock::matchers::{
    body_partial_json, body_string_contains, header, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/sales-api/v1/sales/search/lead";
const DETAIL_FIELDS: &str =
    "firstName,lastName,title,companyName,location,profilePictureUrl,summary,experience,education,skills";

fn api_config(server: &MockServer, token: &str) -> Config {
    let mut config = Config::default();
    config.backend.kind = BackendKind::Api;
    config.rate_limit.request_delay_ms = 0;
    config.api.base_url = server.uri();
    config.api.sales_url = format!("{}/sales-api/v1", server.uri());
    config.api.oauth_token_url = format!("{}/oauth/v2/accessToken", server.uri());
    config.api.access_token = Secret::new(token);
    config
}

fn filter(request: Value) -> SearchFilter {
    let request: SearchRequest = serde_json::from_value(request).unwrap();
    SearchFilter::from_request(&request)
}

fn lead(first: &str, last: &str, slug: &str) -> Value {
    json!({ "lead": {
        "firstName": first,
        "lastName": last,
        "profileUrl": format!("https://www.linkedin.com/in/{}?trk=api", slug),
        "title": "Engineering Manager",
        "location": { "displayName": "Toronto" }
    }})
}

async fn mount_identity(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "me" })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_search_sends_filters_and_maps_leads() {
    let server = MockServer::start().await;
    mount_identity(&server, "good-token").await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(header("Authorization", "Bearer good-token"))
        .and(header("X-Restli-Protocol-Version", "2.0.0"))
        .and(body_partial_json(json!({
            "q": "leadSearch",
            "start": 0,
            "search": {
                "keywords": "rust",
                "geoLocations": { "locations": [{ "name": "Toronto" }] }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": [lead("Grace", "Hopper", "grace"), lead("Alan", "Turing", "alan")],
            "paging": { "start": 0, "count": 2, "total": 2 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = build_backend(&api_config(&server, "good-token")).unwrap();
    let outcome = backend
        .search(&filter(json!({"keywords": "rust", "location": "Toronto"})))
        .await
        .unwrap();

    assert_eq!(outcome.stop, StopReason::Exhausted);
    assert_eq!(outcome.profiles.len(), 2);
    assert_eq!(outcome.profiles[0].name, "Grace Hopper");
    assert_eq!(outcome.profiles[0].profile_url, "https://www.linkedin.com/in/grace");
    assert_eq!(outcome.profiles[0].title, "Engineering Manager");
    assert_eq!(outcome.profiles[0].location, "Toronto");
}

#[tokio::test]
async fn test_search_requests_following_pages() {
    let server = MockServer::start().await;
    mount_identity(&server, "good-token").await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(body_partial_json(json!({ "start": 0, "count": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": [lead("A", "One", "a"), lead("B", "Two", "b")],
            "paging": { "start": 0, "count": 2, "total": 3 }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(body_partial_json(json!({ "start": 2, "count": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": [lead("C", "Three", "c")],
            "paging": { "start": 2, "count": 2, "total": 3 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = api_config(&server, "good-token");
    config.api.page_size = 2;
    let backend = build_backend(&config).unwrap();

    let outcome = backend.search(&filter(json!({}))).await.unwrap();
    assert_eq!(outcome.pages_fetched, 2);
    let names: Vec<&str> = outcome.profiles.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["A One", "B Two", "C Three"]);
}

#[tokio::test]
async fn test_server_error_keeps_earlier_pages() {
    let server = MockServer::start().await;
    mount_identity(&server, "good-token").await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(body_partial_json(json!({ "start": 0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": [lead("A", "One", "a"), lead("B", "Two", "b")],
            "paging": { "start": 0, "count": 2, "total": 10 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(body_partial_json(json!({ "start": 2 })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut config = api_config(&server, "good-token");
    config.api.page_size = 2;
    let backend = build_backend(&config).unwrap();

    let outcome = backend.search(&filter(json!({}))).await.unwrap();
    assert_eq!(outcome.profiles.len(), 2);
    assert!(matches!(outcome.stop, StopReason::FetchFailed(ref reason) if reason.contains("500")));
}

#[tokio::test]
async fn test_unauthorized_search_page_expires_session() {
    let server = MockServer::start().await;
    mount_identity(&server, "good-token").await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(body_partial_json(json!({ "start": 0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": [lead("A", "One", "a"), lead("B", "Two", "b")],
            "paging": { "start": 0, "count": 2, "total": 10 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(body_partial_json(json!({ "start": 2 })))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut config = api_config(&server, "good-token");
    config.api.page_size = 2;
    let backend = build_backend(&config).unwrap();

    let outcome = backend.search(&filter(json!({}))).await.unwrap();
    assert_eq!(outcome.profiles.len(), 2);
    assert!(matches!(outcome.stop, StopReason::SessionExpired(_)));
    assert!(!backend.auth_status().await.authenticated);
}

#[tokio::test]
async fn test_search_enriches_first_profiles() {
    let server = MockServer::start().await;
    mount_identity(&server, "good-token").await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": [lead("A", "One", "a"), lead("B", "Two", "b"), lead("C", "Three", "c")],
            "paging": { "start": 0, "count": 3, "total": 3 }
        })))
        .mount(&server)
        .await;
    for slug in ["a", "b"] {
        Mock::given(method("GET"))
            .and(path(format!("/sales-api/v1/sales/leads/{}", slug)))
            .and(query_param("fields", DETAIL_FIELDS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": format!("Headline {}", slug),
                "skills": [{ "name": "Rust" }]
            })))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/sales-api/v1/sales/leads/c"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "title": "never" })))
        .expect(0)
        .mount(&server)
        .await;

    let backend = build_backend(&api_config(&server, "good-token")).unwrap();
    let outcome = backend
        .search(&filter(json!({"getDetailedInfo": "yes", "maxDetailedProfiles": 2})))
        .await
        .unwrap();

    let details = outcome.profiles[1].details().unwrap();
    assert_eq!(details.headline, "Headline b");
    assert_eq!(details.skills, vec!["Rust"]);
    assert!(!outcome.profiles[2].has_details());
}

#[tokio::test]
async fn test_detail_by_member_id_and_url() {
    let server = MockServer::start().await;
    mount_identity(&server, "good-token").await;

    Mock::given(method("GET"))
        .and(path("/sales-api/v1/sales/leads/12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": "VP Engineering",
            "summary": "Scaling teams.",
            "location": { "displayName": "Oslo" },
            "experience": [{ "title": "VP", "companyName": "Nordic", "startDate": { "year": 2021 } }],
            "education": [{ "schoolName": "NTNU", "degree": "MSc", "fieldOfStudy": "CS" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sales-api/v1/sales/leads/jane-doe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "title": "Designer" })))
        .mount(&server)
        .await;

    let backend = build_backend(&api_config(&server, "good-token")).unwrap();

    let details = backend.detail("12345").await.unwrap();
    assert_eq!(details.headline, "VP Engineering");
    assert_eq!(details.location, "Oslo");
    assert_eq!(details.experience[0].duration, "2021 - Present");
    assert_eq!(details.education[0].dates, "");

    let by_url = backend.detail("https://www.linkedin.com/in/jane-doe/").await.unwrap();
    assert_eq!(by_url.headline, "Designer");
}

#[tokio::test]
async fn test_detail_not_found() {
    let server = MockServer::start().await;
    mount_identity(&server, "good-token").await;

    Mock::given(method("GET"))
        .and(path("/sales-api/v1/sales/leads/999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let backend = build_backend(&api_config(&server, "good-token")).unwrap();
    let err = backend.detail("999").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    let server = MockServer::start().await;
    mount_identity(&server, "fresh-token").await;

    Mock::given(method("POST"))
        .and(path("/oauth/v2/accessToken"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=the-refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-token",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(header("Authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "elements": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = api_config(&server, "stale-token");
    config.api.token_expires_at = 1;
    config.api.refresh_token = Secret::new("the-refresh-token");
    config.api.client_id = "client".to_string();
    config.api.client_secret = Secret::new("secret");
    let backend = build_backend(&config).unwrap();

    let status = backend.auth_status().await;
    assert!(!status.authenticated);
    assert!(status.token_expired);

    let outcome = backend.search(&filter(json!({}))).await.unwrap();
    assert!(outcome.profiles.is_empty());

    let status = backend.auth_status().await;
    assert!(status.authenticated);
    assert!(!status.token_expired);
}

#[tokio::test]
async fn test_rejected_token_without_refresh_fails_fast() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "elements": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let backend = build_backend(&api_config(&server, "revoked")).unwrap();
    let err = backend.search(&filter(json!({}))).await.unwrap_err();
    assert!(matches!(err, HarvestError::Auth(AuthError::TokenExpired)));
}

#[tokio::test]
async fn test_missing_token_is_reported() {
    let server = MockServer::start().await;
    let backend = build_backend(&api_config(&server, "")).unwrap();

    let err = backend.initialize().await.unwrap_err();
    assert!(matches!(err, HarvestError::Auth(AuthError::MissingCredentials(_))));
}
