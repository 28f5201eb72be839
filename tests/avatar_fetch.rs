//! Integration tests for the paginated avatar listing

mod common;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use avatar_fetcher::app::{AvatarFetcher, FetchConfig, ReleaseFilter};
use avatar_fetcher::constants::USER_AGENT;
use avatar_fetcher::errors::ApiError;

use common::{api_client, api_path, avatar_page};

fn small_pages(max_pages: usize) -> FetchConfig {
    FetchConfig {
        page_size: 2,
        max_pages,
    }
}

#[tokio::test]
async fn test_fetch_stops_at_page_cap() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("avatars")))
        .respond_with(|req: &Request| {
            let offset: usize = req
                .url
                .query_pairs()
                .find(|(key, _)| key == "offset")
                .and_then(|(_, value)| value.parse().ok())
                .unwrap_or(0);
            ResponseTemplate::new(200).set_body_json(avatar_page(offset, 2))
        })
        .expect(10)
        .mount(&server)
        .await;

    let client = api_client(&server);
    let records = AvatarFetcher::new(&client, small_pages(10))
        .fetch_all(ReleaseFilter::All)
        .await
        .unwrap();

    assert_eq!(records.len(), 20);
    assert_eq!(records[0].id, "avtr_0");
    assert_eq!(records[19].id, "avtr_19");
}

#[tokio::test]
async fn test_fetch_stops_after_short_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("avatars")))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(avatar_page(0, 2)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(api_path("avatars")))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(avatar_page(2, 1)))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server);
    let records = AvatarFetcher::new(&client, small_pages(10))
        .fetch_all(ReleaseFilter::All)
        .await
        .unwrap();

    assert_eq!(records.len(), 3);
}

#[tokio::test]
async fn test_fetch_stops_on_empty_first_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("avatars")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server);
    let records = AvatarFetcher::new(&client, small_pages(10))
        .fetch_all(ReleaseFilter::Public)
        .await
        .unwrap();

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_all_filter_sends_no_sort() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("avatars")))
        .and(query_param("n", "100"))
        .and(query_param("offset", "0"))
        .and(query_param("releaseStatus", "all"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(|req: &Request| {
            let has_sort = req.url.query_pairs().any(|(key, _)| key == "sort" || key == "order");
            if has_sort {
                ResponseTemplate::new(400)
            } else {
                ResponseTemplate::new(200).set_body_json(avatar_page(0, 1))
            }
        })
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server);
    let records = AvatarFetcher::new(&client, FetchConfig::default())
        .fetch_all(ReleaseFilter::All)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_private_filter_sends_sort_and_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("avatars")))
        .and(query_param("releaseStatus", "private"))
        .and(query_param("sort", "updated"))
        .and(query_param("order", "descending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(avatar_page(0, 1)))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server);
    let records = AvatarFetcher::new(&client, FetchConfig::default())
        .fetch_all(ReleaseFilter::Private)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_unauthorized_listing_fails_whole_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("avatars")))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(avatar_page(0, 2)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(api_path("avatars")))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "\"Missing Credentials\"", "status_code": 401}
        })))
        .mount(&server)
        .await;

    let client = api_client(&server);
    let err = AvatarFetcher::new(&client, small_pages(10))
        .fetch_all(ReleaseFilter::All)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 401, .. }));
    assert_eq!(err.to_string(), "API error: 401");
}

#[tokio::test]
async fn test_progress_reports_running_total() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("avatars")))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(avatar_page(0, 2)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(api_path("avatars")))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(avatar_page(2, 1)))
        .mount(&server)
        .await;

    let client = api_client(&server);
    let mut totals = Vec::new();
    AvatarFetcher::new(&client, small_pages(10))
        .fetch_all_with_progress(ReleaseFilter::All, |progress| totals.push(progress.total))
        .await
        .unwrap();

    assert_eq!(totals, vec![2, 3]);
}

#[tokio::test]
async fn test_fetch_avatar_details() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("avatars/avtr_42")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "avtr_42",
            "name": "Detailed",
            "authorName": "Tester",
            "unityPackages": [
                {"platform": "android", "assetUrl": "https://files.example/android"},
                {"platform": "standalonewindows", "assetUrl": "https://files.example/win/variant/security"}
            ]
        })))
        .mount(&server)
        .await;

    let client = api_client(&server);
    let record = client.fetch_avatar("avtr_42").await.unwrap();

    assert_eq!(record.platforms(), vec!["android", "standalonewindows"]);
    assert_eq!(
        avatar_fetcher::app::resolve_download_url(&record).unwrap(),
        "https://files.example/win"
    );
}
