//! Integration tests for the search pipeline
//!
//! These tests drive the full adapter (session, crawler, extractor, detail
//! fetcher, rate limiter) against a scripted in-memory driver.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use profile_harvester::backend::Adapter;
use profile_harvester::crawler::{PageSource, RateLimitPolicy, SearchQuery, StopReason};
use profile_harvester::extract::{HtmlMapping, JsonMapping, RawPayload, ResultExtractor};
use profile_harvester::session::{Authenticator, LoginAttempt, LoginPolicy};
use profile_harvester::{
    AuthError, Backend, BackendKind, FetchError, FetchResult, HarvestError, SearchFilter,
    SessionState,
};
use serde_json::{json, Value};

type PageFn = Box<dyn Fn(u32) -> FetchResult<Value> + Send + Sync>;
type DetailFn = Box<dyn Fn(&str) -> FetchResult<Value> + Send + Sync>;

/// Scripted driver: pages and detail payloads come from closures
struct MockDriver {
    pages: PageFn,
    details: DetailFn,
    page_delay: Option<Duration>,
    reject_login: bool,
    manual_login: bool,
    live: AtomicBool,
    logins: AtomicUsize,
    search_calls: AtomicU32,
    detail_calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockDriver {
    fn new(pages: impl Fn(u32) -> FetchResult<Value> + Send + Sync + 'static) -> Self {
        Self {
            pages: Box::new(pages),
            details: Box::new(|url| Ok(json!({ "title": format!("Headline for {}", url) }))),
            page_delay: None,
            reject_login: false,
            manual_login: false,
            live: AtomicBool::new(false),
            logins: AtomicUsize::new(0),
            search_calls: AtomicU32::new(0),
            detail_calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn with_details(
        mut self,
        details: impl Fn(&str) -> FetchResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.details = Box::new(details);
        self
    }

    fn detail_calls(&self) -> Vec<String> {
        self.detail_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Authenticator for MockDriver {
    async fn acquire(&self) -> Result<(), AuthError> {
        Ok(())
    }

    async fn release(&self) {}

    async fn verify(&self) -> FetchResult<bool> {
        Ok(self.live.load(Ordering::SeqCst))
    }

    async fn submit_credentials(&self) -> LoginAttempt {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if self.reject_login {
            return LoginAttempt::Rejected(AuthError::InvalidCredentials("rejected".into()));
        }
        if self.manual_login {
            return LoginAttempt::ManualRequired;
        }
        self.live.store(true, Ordering::SeqCst);
        LoginAttempt::Authenticated
    }

    async fn login_signal(&self) -> bool {
        false
    }

    fn token_expired(&self) -> bool {
        false
    }
}

#[async_trait]
impl PageSource for MockDriver {
    fn build_query(&self, _filter: &SearchFilter) -> FetchResult<SearchQuery> {
        Ok(SearchQuery::Body(json!({ "q": "leadSearch" })))
    }

    async fn fetch_search_page(&self, _query: &SearchQuery, page: u32) -> FetchResult<RawPayload> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.page_delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.pages)(page).map(RawPayload::Json)
    }

    async fn fetch_profile(&self, profile: &str) -> FetchResult<RawPayload> {
        self.detail_calls.lock().unwrap().push(profile.to_string());
        (self.details)(profile).map(RawPayload::Json)
    }
}

fn profile_url(slug: &str) -> String {
    format!("https://www.linkedin.com/in/{}", slug)
}

/// One page of lead records; `total` drives next-page detection
fn results_page(slugs: &[String], start: usize, total: Option<usize>) -> Value {
    let elements: Vec<Value> = slugs
        .iter()
        .map(|slug| {
            json!({ "lead": {
                "firstName": slug,
                "lastName": "Tester",
                "profileUrl": profile_url(slug),
                "title": "Engineer",
                "location": { "displayName": "Remote" }
            }})
        })
        .collect();

    let mut page = json!({ "elements": elements });
    if let Some(total) = total {
        page["paging"] = json!({ "start": start, "count": slugs.len(), "total": total });
    }
    page
}

fn slugs(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("p{}", i)).collect()
}

/// Pages of `page_size` unique profiles out of `total`
fn paged_source(page_size: usize, total: usize) -> impl Fn(u32) -> FetchResult<Value> {
    move |page| {
        let start = page as usize * page_size;
        let end = (start + page_size).min(total);
        Ok(results_page(&slugs(start..end.max(start)), start, Some(total)))
    }
}

fn filter(request: Value) -> SearchFilter {
    SearchFilter::from_request(&serde_json::from_value(request).unwrap())
}

fn adapter_with(
    driver: MockDriver,
    policy: RateLimitPolicy,
    login: LoginPolicy,
) -> Adapter<MockDriver> {
    let extractor = ResultExtractor::new(&HtmlMapping::default(), &JsonMapping::default()).unwrap();
    Adapter::new(
        BackendKind::Api,
        driver,
        extractor,
        policy,
        login,
        Duration::from_secs(30),
    )
}

fn adapter(driver: MockDriver) -> Adapter<MockDriver> {
    adapter_with(
        driver,
        RateLimitPolicy {
            request_delay: Duration::ZERO,
            max_actions_per_session: 100,
        },
        LoginPolicy::default(),
    )
}

fn driver_of(adapter: &Adapter<MockDriver>) -> &MockDriver {
    adapter.session().authenticator()
}

#[tokio::test]
async fn test_scenario_a_stops_at_max_results() {
    let adapter = adapter(MockDriver::new(paged_source(5, 8)));

    let outcome = adapter
        .search(&filter(json!({"keywords": "engineer", "maxResults": 5, "getDetailedInfo": false})))
        .await
        .unwrap();

    assert_eq!(outcome.profiles.len(), 5);
    assert!(outcome.profiles.iter().all(|p| !p.has_details()));
    assert_eq!(outcome.stop, StopReason::ReachedMax);
    assert!(outcome.enrichment.is_none());
    assert_eq!(driver_of(&adapter).search_calls.load(Ordering::SeqCst), 1);
    assert!(driver_of(&adapter).detail_calls().is_empty());
}

#[tokio::test]
async fn test_scenario_b_enriches_prefix_only() {
    let adapter = adapter(MockDriver::new(paged_source(6, 6)));

    let outcome = adapter
        .search(&filter(json!({"maxResults": 10, "getDetailedInfo": true, "maxDetailedProfiles": 3})))
        .await
        .unwrap();

    assert_eq!(outcome.profiles.len(), 6);
    let with_details: Vec<bool> = outcome.profiles.iter().map(|p| p.has_details()).collect();
    assert_eq!(with_details, vec![true, true, true, false, false, false]);

    let expected: Vec<String> = slugs(0..3).iter().map(|s| profile_url(s)).collect();
    assert_eq!(driver_of(&adapter).detail_calls(), expected);

    let report = outcome.enrichment.unwrap();
    assert_eq!(report.attempted, 3);
    assert_eq!(report.enriched, 3);
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn test_scenario_c_detail_failure_is_isolated() {
    let failing = profile_url("p1");
    let driver = MockDriver::new(paged_source(5, 5)).with_details(move |url| {
        if url == failing {
            Err(FetchError::Http {
                url: url.to_string(),
                status: 500,
            })
        } else {
            Ok(json!({ "title": "Headline" }))
        }
    });
    let adapter = adapter(driver);

    let outcome = adapter
        .search(&filter(json!({"getDetailedInfo": true, "maxDetailedProfiles": 3})))
        .await
        .unwrap();

    assert!(outcome.profiles[0].has_details());
    assert!(!outcome.profiles[1].has_details());
    assert!(outcome.profiles[2].has_details());
    assert!(!outcome.profiles[3].has_details());

    let report = outcome.enrichment.unwrap();
    assert_eq!(report.attempted, 3);
    assert_eq!(report.enriched, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert_eq!(report.failures[0].profile_url, profile_url("p1"));
}

#[tokio::test]
async fn test_scenario_d_single_page_without_next() {
    let adapter = adapter(MockDriver::new(|_| Ok(results_page(&slugs(0..3), 0, None))));

    let outcome = adapter.search(&filter(json!({"maxResults": 20}))).await.unwrap();

    assert_eq!(outcome.profiles.len(), 3);
    assert_eq!(outcome.stop, StopReason::Exhausted);
    assert!(!outcome.is_partial());
    assert_eq!(driver_of(&adapter).search_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_results_never_exceed_max_and_are_unique() {
    for max in [1, 4, 5, 6, 11, 15, 40] {
        let adapter = adapter(MockDriver::new(paged_source(5, 15)));
        let outcome = adapter.search(&filter(json!({ "maxResults": max }))).await.unwrap();

        assert!(outcome.profiles.len() <= max as usize, "max {}", max);
        assert_eq!(outcome.profiles.len(), (max as usize).min(15), "max {}", max);

        let mut urls: Vec<&str> = outcome.profiles.iter().map(|p| p.profile_url.as_str()).collect();
        let before = urls.len();
        urls.sort();
        urls.dedup();
        assert_eq!(urls.len(), before, "duplicate profile URL for max {}", max);
    }
}

#[tokio::test]
async fn test_enrichment_count_is_bounded_by_prefix() {
    for (found, max_detailed) in [(2usize, 5u32), (5, 5), (8, 3), (8, 20)] {
        let adapter = adapter(MockDriver::new(paged_source(10, found)));
        let outcome = adapter
            .search(&filter(json!({"getDetailedInfo": true, "maxDetailedProfiles": max_detailed})))
            .await
            .unwrap();

        let expected = found.min(max_detailed as usize);
        let calls = driver_of(&adapter).detail_calls();
        assert_eq!(calls.len(), expected);
        let prefix: Vec<String> = outcome.profiles[..expected]
            .iter()
            .map(|p| p.profile_url.clone())
            .collect();
        assert_eq!(calls, prefix);
    }
}

#[tokio::test]
async fn test_duplicates_across_pages_are_suppressed_in_order() {
    let driver = MockDriver::new(|page| {
        let page_slugs = match page {
            0 => vec!["a", "b", "c"],
            _ => vec!["b", "c", "d"],
        };
        let page_slugs: Vec<String> = page_slugs.into_iter().map(String::from).collect();
        let total = if page == 0 { Some(6) } else { None };
        Ok(results_page(&page_slugs, page as usize * 3, total))
    });
    let adapter = adapter(driver);

    let outcome = adapter.search(&filter(json!({}))).await.unwrap();
    let names: Vec<&str> = outcome.profiles.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["a Tester", "b Tester", "c Tester", "d Tester"]);
}

#[tokio::test]
async fn test_repeating_page_stops_as_stalled() {
    let adapter = adapter(MockDriver::new(|_| Ok(results_page(&slugs(0..3), 0, Some(1000)))));

    let outcome = adapter.search(&filter(json!({"maxResults": 50}))).await.unwrap();

    assert_eq!(outcome.profiles.len(), 3);
    assert_eq!(outcome.stop, StopReason::Stalled);
    assert_eq!(outcome.pages_fetched, 2);
}

#[tokio::test]
async fn test_page_failure_returns_partial_results() {
    let source = paged_source(5, 20);
    let driver = MockDriver::new(move |page| {
        if page == 1 {
            Err(FetchError::Http {
                url: "search".to_string(),
                status: 503,
            })
        } else {
            source(page)
        }
    });
    let adapter = adapter(driver);

    let outcome = adapter.search(&filter(json!({"maxResults": 20}))).await.unwrap();

    assert_eq!(outcome.profiles.len(), 5);
    assert!(matches!(outcome.stop, StopReason::FetchFailed(ref reason) if reason.contains("503")));
    assert!(outcome.is_partial());
}

#[tokio::test]
async fn test_page_of_dropped_records_still_advances() {
    let anonymous: Vec<Value> = (0..5)
        .map(|_| json!({ "lead": { "firstName": "LinkedIn", "lastName": "Member" } }))
        .collect();
    let adapter = adapter(MockDriver::new(move |page| {
        if page == 0 {
            Ok(json!({
                "elements": anonymous.clone(),
                "paging": { "start": 0, "count": 5, "total": 15 }
            }))
        } else {
            let start = page as usize * 5;
            Ok(results_page(&slugs(start..start + 5), start, Some(15)))
        }
    }));

    let outcome = adapter.search(&filter(json!({"maxResults": 5}))).await.unwrap();

    assert_eq!(outcome.profiles.len(), 5);
    assert_eq!(outcome.profiles[0].profile_url, profile_url("p5"));
    assert_eq!(outcome.dropped, 5);
    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.stop, StopReason::ReachedMax);
}

#[tokio::test]
async fn test_empty_page_claiming_more_stops_as_stalled() {
    let adapter = adapter(MockDriver::new(|page| {
        if page == 0 {
            Ok(results_page(&slugs(0..2), 0, Some(100)))
        } else {
            Ok(json!({ "elements": [], "paging": { "start": 2, "count": 0, "total": 100 } }))
        }
    }));

    let outcome = adapter.search(&filter(json!({"maxResults": 50}))).await.unwrap();

    assert_eq!(outcome.profiles.len(), 2);
    assert_eq!(outcome.stop, StopReason::Stalled);
    assert_eq!(outcome.pages_fetched, 2);
}

#[tokio::test]
async fn test_rejected_search_page_expires_session() {
    let source = paged_source(5, 20);
    let adapter = adapter(MockDriver::new(move |page| {
        if page == 1 {
            Err(FetchError::Unauthorized {
                url: "https://www.linkedin.com/login?session_redirect=search".to_string(),
            })
        } else {
            source(page)
        }
    }));

    let outcome = adapter
        .search(&filter(json!({"maxResults": 20, "getDetailedInfo": true})))
        .await
        .unwrap();

    assert_eq!(outcome.profiles.len(), 5);
    assert!(matches!(outcome.stop, StopReason::SessionExpired(_)));
    assert!(outcome.is_partial());
    assert!(outcome.enrichment.is_none());
    assert!(driver_of(&adapter).detail_calls().is_empty());
    assert_eq!(adapter.session().current_state(), SessionState::Expired);
    assert!(!adapter.auth_status().await.authenticated);

    // The next call logs in again.
    adapter.search(&filter(json!({"maxResults": 5}))).await.unwrap();
    assert_eq!(driver_of(&adapter).logins.load(Ordering::SeqCst), 2);
    assert_eq!(adapter.session().current_state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_rejected_detail_ends_enrichment_and_expires_session() {
    let rejected = profile_url("p1");
    let driver = MockDriver::new(paged_source(5, 5)).with_details(move |url| {
        if url == rejected {
            Err(FetchError::Unauthorized {
                url: url.to_string(),
            })
        } else {
            Ok(json!({ "title": "Headline" }))
        }
    });
    let adapter = adapter(driver);

    let outcome = adapter
        .search(&filter(json!({"getDetailedInfo": true, "maxDetailedProfiles": 5})))
        .await
        .unwrap();

    let report = outcome.enrichment.unwrap();
    assert!(report.session_expired);
    assert_eq!(report.enriched, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert_eq!(driver_of(&adapter).detail_calls().len(), 2);
    assert_eq!(outcome.stop, StopReason::Exhausted);
    assert_eq!(adapter.session().current_state(), SessionState::Expired);
}

#[tokio::test]
async fn test_incomplete_records_are_dropped_and_counted() {
    let adapter = adapter(MockDriver::new(|_| {
        Ok(json!({"elements": [
            {"lead": {"firstName": "Kept", "profileUrl": "https://www.linkedin.com/in/kept"}},
            {"lead": {"title": "No name or link"}},
            {"lead": {"firstName": "NoLink"}}
        ]}))
    }));

    let outcome = adapter.search(&filter(json!({}))).await.unwrap();

    assert_eq!(outcome.profiles.len(), 1);
    assert_eq!(outcome.profiles[0].title, "");
    assert_eq!(outcome.profiles[0].location, "");
    assert_eq!(outcome.dropped, 2);
}

#[tokio::test(start_paused = true)]
async fn test_action_ceiling_stops_pagination() {
    let adapter = adapter_with(
        MockDriver::new(paged_source(5, 100)),
        RateLimitPolicy {
            request_delay: Duration::from_millis(2000),
            max_actions_per_session: 2,
        },
        LoginPolicy::default(),
    );

    let outcome = adapter.search(&filter(json!({"maxResults": 50}))).await.unwrap();

    assert_eq!(outcome.profiles.len(), 10);
    assert_eq!(outcome.stop, StopReason::LimitExceeded);
    assert_eq!(outcome.actions, 2);

    // The ceiling applies per call.
    let again = adapter.search(&filter(json!({"maxResults": 5}))).await.unwrap();
    assert_eq!(again.profiles.len(), 5);
    assert_eq!(again.stop, StopReason::ReachedMax);
}

#[tokio::test(start_paused = true)]
async fn test_action_ceiling_cuts_enrichment_short() {
    let adapter = adapter_with(
        MockDriver::new(paged_source(5, 5)),
        RateLimitPolicy {
            request_delay: Duration::ZERO,
            max_actions_per_session: 3,
        },
        LoginPolicy::default(),
    );

    let outcome = adapter
        .search(&filter(json!({"getDetailedInfo": true, "maxDetailedProfiles": 5})))
        .await
        .unwrap();

    let report = outcome.enrichment.unwrap();
    assert!(report.limit_hit);
    assert_eq!(report.attempted, 2);
    assert_eq!(report.enriched, 2);
    assert_eq!(outcome.profiles.len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_pages_are_spaced_by_request_delay() {
    let adapter = adapter_with(
        MockDriver::new(paged_source(5, 15)),
        RateLimitPolicy {
            request_delay: Duration::from_millis(2000),
            max_actions_per_session: 100,
        },
        LoginPolicy::default(),
    );

    let start = tokio::time::Instant::now();
    let outcome = adapter.search(&filter(json!({"maxResults": 15}))).await.unwrap();

    assert_eq!(outcome.pages_fetched, 3);
    assert!(start.elapsed() >= Duration::from_millis(4000));
}

#[tokio::test(start_paused = true)]
async fn test_slow_page_times_out_as_partial_result() {
    let mut driver = MockDriver::new(paged_source(5, 5));
    driver.page_delay = Some(Duration::from_secs(60));
    let adapter = adapter(driver);

    let outcome = adapter.search(&filter(json!({}))).await.unwrap();

    assert!(outcome.profiles.is_empty());
    assert!(matches!(outcome.stop, StopReason::FetchFailed(ref reason) if reason.contains("timeout")));
}

#[tokio::test]
async fn test_rejected_login_aborts_search() {
    let mut driver = MockDriver::new(paged_source(5, 5));
    driver.reject_login = true;
    let adapter = adapter(driver);

    let err = adapter.search(&filter(json!({}))).await.unwrap_err();

    assert!(matches!(err, HarvestError::Auth(AuthError::InvalidCredentials(_))));
    assert_eq!(driver_of(&adapter).search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_manual_login_timeout_aborts_search() {
    let mut driver = MockDriver::new(paged_source(5, 5));
    driver.manual_login = true;
    let adapter = adapter_with(
        driver,
        RateLimitPolicy::default(),
        LoginPolicy {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(3),
        },
    );

    let err = adapter.search(&filter(json!({}))).await.unwrap_err();

    assert!(matches!(err, HarvestError::Auth(AuthError::Timeout { .. })));
    assert_eq!(adapter.session().current_state(), SessionState::PendingManualLogin);
    assert_eq!(driver_of(&adapter).search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_expired_session_triggers_relogin() {
    let adapter = adapter(MockDriver::new(paged_source(5, 5)));

    adapter.search(&filter(json!({}))).await.unwrap();
    assert_eq!(driver_of(&adapter).logins.load(Ordering::SeqCst), 1);

    // Still live: no new login.
    adapter.search(&filter(json!({}))).await.unwrap();
    assert_eq!(driver_of(&adapter).logins.load(Ordering::SeqCst), 1);

    driver_of(&adapter).live.store(false, Ordering::SeqCst);
    adapter.search(&filter(json!({}))).await.unwrap();
    assert_eq!(driver_of(&adapter).logins.load(Ordering::SeqCst), 2);
    assert_eq!(adapter.session().current_state(), SessionState::Authenticated);
    assert!(adapter.auth_status().await.authenticated);
}

#[tokio::test]
async fn test_detail_not_found() {
    let driver = MockDriver::new(paged_source(5, 5)).with_details(|_| Ok(json!({})));
    let adapter = adapter(driver);

    let err = adapter.detail("https://www.linkedin.com/in/ghost").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_detail_unauthorized_expires_session() {
    let driver = MockDriver::new(paged_source(5, 5)).with_details(|url| {
        Err(FetchError::Unauthorized {
            url: url.to_string(),
        })
    });
    let adapter = adapter(driver);

    let err = adapter.detail("https://www.linkedin.com/in/someone").await.unwrap_err();
    assert!(matches!(err, HarvestError::Fetch(FetchError::Unauthorized { .. })));
    assert_eq!(adapter.session().current_state(), SessionState::Expired);
}

#[tokio::test(start_paused = true)]
async fn test_serialized_adapter_runs_one_call_at_a_time() {
    let mut driver = MockDriver::new(|_| Ok(results_page(&slugs(0..2), 0, None)));
    driver.page_delay = Some(Duration::from_millis(100));
    let adapter = adapter(driver).serialized();

    let query = filter(json!({}));
    let (first, second) = tokio::join!(adapter.search(&query), adapter.search(&query));

    assert_eq!(first.unwrap().profiles.len(), 2);
    assert_eq!(second.unwrap().profiles.len(), 2);
    assert_eq!(driver_of(&adapter).max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unserialized_adapter_serves_concurrent_calls() {
    let mut driver = MockDriver::new(|_| Ok(results_page(&slugs(0..2), 0, None)));
    driver.page_delay = Some(Duration::from_millis(100));
    let adapter = adapter(driver);

    let query = filter(json!({}));
    let (first, second) = tokio::join!(adapter.search(&query), adapter.search(&query));

    assert!(first.is_ok() && second.is_ok());
    assert_eq!(driver_of(&adapter).max_in_flight.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_response_shape() {
    let adapter = adapter(MockDriver::new(paged_source(5, 3)));
    let query = filter(json!({"keywords": "rust", "maxResults": "2"}));

    let response = adapter.search(&query).await.unwrap().into_response(&query);
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["count"], 2);
    assert_eq!(value["filters"]["keywords"], "rust");
    assert_eq!(value["filters"]["maxResults"], 2);
    assert_eq!(value["profiles"][0]["profileUrl"], profile_url("p0"));
    assert!(value["profiles"][0].get("details").is_none());
}
