// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! HTTP-level behavior of `GitHubClient` against a canned local server

use std::sync::{Arc, Mutex};

use ba_domain_types::{Credential, RepoRef};
use ba_github_client::{GitHubClient, GitHubClientError, GitHubConfig};
use reqwest::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

struct Reply {
    status: u16,
    headers: Vec<String>,
    body: String,
}

impl Reply {
    fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn with_header(mut self, header: String) -> Self {
        self.headers.push(header);
        self
    }
}

/// One-response-per-connection HTTP/1.1 server; records each request head
struct CannedServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl CannedServer {
    async fn start<F>(route: F) -> Self
    where
        F: Fn(&str, &str) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind to ephemeral port");
        let base_url = format!("http://{}", listener.local_addr().expect("port"));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        let origin = base_url.clone();
        let handle = tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let head = read_head(&mut stream).await;
                let target = head.split_whitespace().nth(1).unwrap_or_default().to_string();
                recorded.lock().unwrap().push(head);

                let reply = route(&origin, &target);
                let mut response = format!(
                    "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
                    reply.status,
                    reply.body.len()
                );
                for header in &reply.headers {
                    response.push_str(header);
                    response.push_str("\r\n");
                }
                response.push_str("\r\n");
                response.push_str(&reply.body);
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self {
            base_url,
            requests,
            handle,
        }
    }

    fn client(&self, max_pages: u32) -> GitHubClient {
        GitHubClient::new(GitHubConfig {
            api_base_url: self.base_url.clone(),
            max_pages,
            max_retries: 0,
            ..GitHubConfig::default()
        })
        .unwrap()
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for CannedServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn read_head(stream: &mut tokio::net::TcpStream) -> String {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&head).into_owned()
}

fn credential() -> Credential {
    Credential::new("ghp_test")
}

fn repo() -> RepoRef {
    RepoRef::new("octo", "widgets")
}

async fn tag_exists_with_status(status: u16, body: &str) -> Result<bool, GitHubClientError> {
    let body = body.to_string();
    let server = CannedServer::start(move |_, _| Reply::json(status, &body)).await;
    let result = server
        .client(10)
        .tag_exists(&credential(), &repo(), "archive/feature-x")
        .await;

    let requests = server.requests();
    assert_eq!(requests.len(), 1, "{requests:?}");
    assert!(
        requests[0].starts_with("GET /repos/octo/widgets/git/ref/tags/archive/feature-x "),
        "{}",
        requests[0]
    );
    assert!(
        requests[0].to_lowercase().contains("authorization: bearer ghp_test"),
        "{}",
        requests[0]
    );
    result
}

#[tokio::test]
async fn test_tag_exists_is_false_on_404() {
    let exists = tag_exists_with_status(404, r#"{"message":"Not Found"}"#).await.unwrap();
    assert!(!exists);
}

#[tokio::test]
async fn test_tag_exists_is_true_on_200() {
    let body = r#"{"ref":"refs/tags/archive/feature-x","object":{"sha":"abc123"}}"#;
    let exists = tag_exists_with_status(200, body).await.unwrap();
    assert!(exists);
}

#[tokio::test]
async fn test_tag_exists_fails_on_server_error() {
    let err = tag_exists_with_status(500, r#"{"message":"boom"}"#).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert!(err.to_string().ends_with(": boom"), "{err}");
}

#[tokio::test]
async fn test_tag_exists_fails_on_bad_credentials() {
    let err = tag_exists_with_status(401, r#"{"message":"Bad credentials"}"#)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_listing_stops_at_page_ceiling_and_reports_truncation() {
    let server = CannedServer::start(|origin, target| {
        let page: u32 = target
            .split("page=")
            .last()
            .and_then(|n| n.parse().ok())
            .unwrap_or(1);
        let body = format!(
            r#"[{{"name":"branch-{page}","commit":{{"sha":"sha{page}"}},"protected":false}}]"#
        );
        // Every page claims a successor
        Reply::json(200, &body).with_header(format!(
            r#"Link: <{origin}/repos/octo/widgets/branches?per_page=100&page={}>; rel="next", <{origin}/repos/octo/widgets/branches?per_page=100&page=50>; rel="last""#,
            page + 1
        ))
    })
    .await;

    let listing = server.client(2).list_branches(&credential(), &repo()).await.unwrap();

    let names: Vec<_> = listing.items.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["branch-1", "branch-2"]);
    assert!(listing.truncated);

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].starts_with("GET /repos/octo/widgets/branches?per_page=100&page=1 "));
    assert!(requests[1].starts_with("GET /repos/octo/widgets/branches?per_page=100&page=2 "));
}

#[tokio::test]
async fn test_listing_without_next_link_is_complete() {
    let server = CannedServer::start(|_, _| {
        Reply::json(200, r#"[{"name":"main","commit":{"sha":"abc"},"protected":true}]"#)
    })
    .await;

    let listing = server.client(2).list_branches(&credential(), &repo()).await.unwrap();

    assert_eq!(listing.items.len(), 1);
    assert!(listing.items[0].protected);
    assert!(!listing.truncated);
    assert_eq!(server.requests().len(), 1);
}
