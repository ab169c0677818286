use serde_json::json;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tlplayer_http::HttpClient;
use tlplayer_social::twitter::{
    Credential, CredentialProvider, Cursor, GateStatus, MediaFeed, MediaKind, PageSource,
    RateKey, RateLimitGate, SearchError, SearchOutcome, SearchQuery, TwitterApi,
};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH: &str = "/1.1/search/tweets.json";

fn api(server: &MockServer, gate: Arc<RateLimitGate>) -> TwitterApi {
    let http = HttpClient::new(&server.uri()).expect("mock base url");
    let credentials = Arc::new(CredentialProvider::fixed(Credential::bearer("test-token")));
    TwitterApi::new(http, credentials, gate)
}

fn query(cursor: Option<Cursor>) -> SearchQuery {
    SearchQuery {
        text: "#dtm".into(),
        cursor,
        count: 100,
    }
}

fn video_tweet(id: u64) -> serde_json::Value {
    json!({
        "id_str": id.to_string(),
        "full_text": "new track",
        "user": { "name": "Bob", "screen_name": "bob", "profile_image_url_https": "https://pbs.twimg.com/bob.jpg" },
        "extended_entities": { "media": [{
            "type": "video",
            "video_info": { "variants": [
                { "content_type": "video/mp4", "bitrate": 832000, "url": "https://video.twimg.com/hi.mp4" },
                { "content_type": "video/mp4", "bitrate": 256000, "url": "https://video.twimg.com/lo.mp4" }
            ]}
        }]}
    })
}

#[tokio::test]
async fn sends_fixed_params_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .and(query_param("q", "#dtm"))
        .and(query_param("count", "100"))
        .and(query_param("result_type", "recent"))
        .and(query_param("tweet_mode", "extended"))
        .and(query_param("max_id", "99"))
        .and(query_param_is_missing("since_id"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statuses": [video_tweet(98)],
            "search_metadata": { "max_id": 98, "since_id": 0 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = api(&server, Arc::new(RateLimitGate::new()))
        .fetch_page(&query(Some(Cursor::MaxId(99))))
        .await
        .expect("page");

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.next_older, Some(98));
}

#[tokio::test]
async fn since_id_sent_only_for_forward_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .and(query_param("since_id", "101"))
        .and(query_param_is_missing("max_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "statuses": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let page = api(&server, Arc::new(RateLimitGate::new()))
        .fetch_page(&query(Some(Cursor::SinceId(101))))
        .await
        .expect("page");
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn rejection_records_cooldown_and_suppresses_next_call() {
    let server = MockServer::start().await;
    let reset = OffsetDateTime::now_utc().unix_timestamp() + 600;

    Mock::given(method("GET"))
        .and(path(SEARCH))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("x-rate-limit-reset", reset.to_string().as_str())
                .set_body_json(json!({ "errors": [{ "code": 88, "message": "Rate limit exceeded" }] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gate = Arc::new(RateLimitGate::new());
    let client = api(&server, gate.clone());
    let expected = OffsetDateTime::from_unix_timestamp(reset).unwrap();

    let err = client.fetch_page(&query(None)).await.unwrap_err();
    match err {
        SearchError::RateLimited { category, until } => {
            assert_eq!(category, "search");
            assert_eq!(until, expected);
        }
        other => panic!("expected rate limit, got {other:?}"),
    }
    assert_eq!(
        gate.check(&RateKey::search()),
        GateStatus::CoolingDown { until: expected }
    );

    // Second call must not reach the network (the mock expects exactly one hit).
    let err = client.fetch_page(&query(None)).await.unwrap_err();
    assert!(matches!(err, SearchError::RateLimited { until, .. } if until == expected));
}

#[tokio::test]
async fn rejection_without_reset_header_uses_fallback_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let before = OffsetDateTime::now_utc();
    let err = api(&server, Arc::new(RateLimitGate::new()))
        .fetch_page(&query(None))
        .await
        .unwrap_err();

    let until = match err {
        SearchError::RateLimited { until, .. } => until,
        other => panic!("expected rate limit, got {other:?}"),
    };
    assert!(until >= before + Duration::minutes(15));
    assert!(until <= OffsetDateTime::now_utc() + Duration::minutes(15));
}

#[tokio::test]
async fn expired_cooldown_lets_call_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "statuses": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let gate = Arc::new(RateLimitGate::new());
    gate.record_rejection(
        &RateKey::search(),
        OffsetDateTime::now_utc() - Duration::seconds(1),
    );

    api(&server, gate.clone())
        .fetch_page(&query(None))
        .await
        .expect("page");
    assert_eq!(gate.check(&RateKey::search()), GateStatus::Open);
}

#[tokio::test]
async fn other_statuses_are_upstream_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .respond_with(ResponseTemplate::new(503).set_body_string("over capacity"))
        .mount(&server)
        .await;

    let gate = Arc::new(RateLimitGate::new());
    let err = api(&server, gate.clone())
        .fetch_page(&query(None))
        .await
        .unwrap_err();

    match err {
        SearchError::Upstream { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "over capacity");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
    assert_eq!(gate.check(&RateKey::search()), GateStatus::Open);
}

#[tokio::test]
async fn malformed_success_body_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = api(&server, Arc::new(RateLimitGate::new()))
        .fetch_page(&query(None))
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::Transport(_)));
}

#[tokio::test]
async fn feed_walks_older_pages_until_media_appears() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .and(query_param("max_id", "99"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statuses": [
                { "id_str": "90", "full_text": "just text" },
                { "id_str": "80", "full_text": "more text" }
            ],
            "search_metadata": { "max_id": 90 }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH))
        .and(query_param("max_id", "79"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "statuses": [video_tweet(70)],
            "search_metadata": { "max_id": 70 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = Arc::new(api(&server, Arc::new(RateLimitGate::new())));
    let outcome = MediaFeed::new(source)
        .search("#dtm", Some(100))
        .await
        .expect("search");

    let results = match outcome {
        SearchOutcome::Found(results) => results,
        other => panic!("expected results, got {other:?}"),
    };
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "70");
    assert_eq!(results[0].author, "Bob");
    assert_eq!(results[0].media_url, "https://video.twimg.com/hi.mp4");
    assert_eq!(results[0].media_kind, MediaKind::NativeVideo);
}
