use std::time::Duration;

use calsync_core::failure::TransportFailure;
use calsync_core::remote::RemoteEventSource;
use calsync_core::remote::protocol::CreateEventRequest;
use calsync_core::window::SyncWindow;
use calsync_http::HttpEventSource;
use chrono::NaiveDate;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// A request as seen by the stub server.
struct Recorded {
    head: String,
    body: String,
}

/// Serve exactly one canned response and hand back the request that triggered it.
async fn serve_once(status: &str, body: &str) -> (String, oneshot::Receiver<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())?
            })
            .unwrap_or(0);
        while buf.len() < head_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = String::from_utf8_lossy(&buf[head_end..head_end + content_length]).to_string();

        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        let _ = tx.send(Recorded { head, body });
    });

    (url, rx)
}

fn january() -> SyncWindow {
    SyncWindow::from_dates(
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
    )
    .unwrap()
}

fn source(url: &str) -> HttpEventSource {
    HttpEventSource::new(url, Some("token-123".into()), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn fetch_sends_server_dates_and_bearer_token() {
    let body = r#"[{"id":1,"title":"Standup","startDate":"2024-01-02T09:00:00Z","endDate":"2024-01-02T09:15:00Z","color":4}]"#;
    let (url, recorded) = serve_once("200 OK", body).await;

    let events = source(&url).fetch(&january()).await.unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "1");
    assert_eq!(events[0].title, "Standup");

    let request = recorded.await.unwrap();
    assert!(
        request
            .head
            .starts_with("GET /calendar/events?startDate=2024-01-01&endDate=2024-02-01 ")
    );
    assert!(
        request
            .head
            .to_ascii_lowercase()
            .contains("authorization: bearer token-123")
    );
}

#[tokio::test]
async fn create_posts_camel_case_body() {
    let (url, recorded) = serve_once("204 No Content", "").await;
    let request = CreateEventRequest {
        title: "Retro".into(),
        start_date: "2024-01-05T15:00:00Z".into(),
        end_date: "2024-01-05T16:00:00Z".into(),
        is_joinable: true,
        is_visible: true,
        memo: None,
        color: 0,
        alarm_minutes: None,
        repeat_term: None,
        repeat_frequency: 1,
        repeat_end_date: "2024-01-05T16:00:00Z".into(),
    };

    source(&url).create(&request).await.unwrap();

    let recorded = recorded.await.unwrap();
    assert!(recorded.head.starts_with("POST /calendar/events "));
    let sent: serde_json::Value = serde_json::from_str(&recorded.body).unwrap();
    assert_eq!(sent["startDate"], "2024-01-05T15:00:00Z");
    assert_eq!(sent["repeatTerm"], serde_json::Value::Null);
}

#[tokio::test]
async fn null_body_is_missing_body() {
    let (url, _recorded) = serve_once("200 OK", "null").await;

    let result = source(&url).fetch(&january()).await;

    assert_eq!(result, Err(TransportFailure::MissingBody));
}

#[tokio::test]
async fn sentinel_status_is_reported_raw() {
    let (url, _recorded) = serve_once("418 I'm a teapot", r#"{"message":"no authorization"}"#).await;

    let result = source(&url).fetch(&january()).await;

    assert_eq!(
        result,
        Err(TransportFailure::Status {
            code: 418,
            message: Some("no authorization".into())
        })
    );
}

#[tokio::test]
async fn search_passes_keyword() {
    let body = r#"[{"id":"x","title":"Book club","startDate":"2024-01-09T18:00:00Z","endDate":"2024-01-09T19:00:00Z"}]"#;
    let (url, recorded) = serve_once("200 OK", body).await;

    let hits = source(&url).search(Some("book"), &january()).await.unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Book club");
    assert!(recorded.await.unwrap().head.contains("keyword=book"));
}

#[tokio::test]
async fn unreachable_server_is_a_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let result = source(&url).fetch(&january()).await;

    assert!(matches!(result, Err(TransportFailure::Network(_))));
}

#[tokio::test]
async fn create_accepts_an_empty_ok() {
    let (url, _recorded) = serve_once("200 OK", "").await;
    let request = CreateEventRequest {
        title: "Lunch".into(),
        start_date: "2024-01-05T12:00:00Z".into(),
        end_date: "2024-01-05T13:00:00Z".into(),
        is_joinable: false,
        is_visible: true,
        memo: Some("downstairs".into()),
        color: 3,
        alarm_minutes: Some(10),
        repeat_term: None,
        repeat_frequency: 1,
        repeat_end_date: "2024-01-05T13:00:00Z".into(),
    };

    assert_eq!(source(&url).create(&request).await, Ok(()));
}
