//! Integration tests for the GitHub REST client.
//!
//! A wiremock server stands in for api.github.com so pagination, merge
//! filtering and error mapping can be checked against real HTTP exchanges.

use serde_json::json;
use sip_sync::{GitHubClient, GitHubError, GitHubToken, ProposalSource, RepoRef};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PULLS_PATH: &str = "/repos/scala/improvement-proposals/pulls";

fn repo() -> RepoRef {
    RepoRef::new("scala", "improvement-proposals", "main")
}

fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::new(&GitHubToken::new("test-token"), server.uri()).unwrap()
}

fn pull(number: u64, title: &str, merged_at: Option<&str>) -> serde_json::Value {
    let state = if merged_at.is_some() { "closed" } else { "open" };
    json!({
        "number": number,
        "title": title,
        "state": state,
        "merged_at": merged_at,
        "labels": [],
    })
}

#[tokio::test]
async fn test_lists_all_pages_and_drops_merged() {
    let server = MockServer::start().await;
    let next = format!(
        "<{}{PULLS_PATH}?state=all&base=main&per_page=100&page=2>; rel=\"next\", <{}{PULLS_PATH}?state=all&base=main&per_page=100&page=2>; rel=\"last\"",
        server.uri(),
        server.uri()
    );

    Mock::given(method("GET"))
        .and(path(PULLS_PATH))
        .and(query_param("state", "all"))
        .and(query_param("base", "main"))
        .and(query_param("per_page", "100"))
        .and(query_param_is_missing("page"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", next.as_str())
                .set_body_json(json!([
                    pull(46, "SIP-46 - Proposal for reusing extends with keyword in enums", None),
                    pull(44, "SIP-44 - Fewer Braces", Some("2023-01-10T12:00:00Z")),
                ])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(PULLS_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            pull(12, "Rejected idea", None),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let prs = client(&server)
        .list_unmerged_pull_requests(&repo())
        .await
        .unwrap();

    let numbers: Vec<u64> = prs.iter().map(|pr| pr.number).collect();
    assert_eq!(numbers, vec![46, 12]);
    assert!(prs.iter().all(|pr| !pr.is_merged()));
}

#[tokio::test]
async fn test_issue_labels_follow_pagination() {
    let server = MockServer::start().await;
    let labels_path = "/repos/scala/improvement-proposals/issues/46/labels";
    let next = format!("<{}{labels_path}?per_page=100&page=2>; rel=\"next\"", server.uri());

    Mock::given(method("GET"))
        .and(path(labels_path))
        .and(query_param_is_missing("page"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", next.as_str())
                .set_body_json(json!([{ "id": 1, "name": "status:under-review" }])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(labels_path))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "id": 2, "name": "stage:design" }])),
        )
        .mount(&server)
        .await;

    let labels = client(&server).issue_labels(&repo(), 46).await.unwrap();
    assert_eq!(labels, vec!["status:under-review", "stage:design"]);
}

#[tokio::test]
async fn test_api_error_carries_github_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(PULLS_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest",
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .list_unmerged_pull_requests(&repo())
        .await
        .unwrap_err();

    match err {
        GitHubError::ApiError { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Not Found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_exhausted_rate_limit_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/scala/improvement-proposals/issues/7/labels"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", "0")
                .set_body_json(json!({ "message": "API rate limit exceeded" })),
        )
        .mount(&server)
        .await;

    let err = client(&server).issue_labels(&repo(), 7).await.unwrap_err();
    assert!(matches!(err, GitHubError::RateLimitExceeded { .. }), "{err:?}");
}

#[tokio::test]
async fn test_failure_on_later_page_aborts_listing() {
    let server = MockServer::start().await;
    let next = format!(
        "<{}{PULLS_PATH}?state=all&base=main&per_page=100&page=2>; rel=\"next\"",
        server.uri()
    );

    Mock::given(method("GET"))
        .and(path(PULLS_PATH))
        .and(query_param_is_missing("page"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", next.as_str())
                .set_body_json(json!([pull(1, "One", None)])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(PULLS_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client(&server)
        .list_unmerged_pull_requests(&repo())
        .await
        .unwrap_err();
    assert!(
        matches!(&err, GitHubError::ApiError { status: 502, message } if message == "Bad Gateway"),
        "{err:?}"
    );
}
